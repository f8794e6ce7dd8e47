use crate::error::ServerResult;
use crate::state::AppState;
use axum::{Json, extract::State};
use intake_storage::Record;
use serde::Serialize;

#[derive(Serialize)]
pub struct PredictAllResponse {
    pub msg: String,
    pub records: Vec<Record>,
}

/// POST /api/predict_all
pub async fn predict_all(State(state): State<AppState>) -> ServerResult<Json<PredictAllResponse>> {
    let (count, records) = state.registration.recompute_all().await?;

    Ok(Json(PredictAllResponse {
        msg: format!("Predicciones generadas para {count} registros"),
        records,
    }))
}
