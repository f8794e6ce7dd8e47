use crate::error::{MISSING_PARAMETERS, ServerError, ServerResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use intake_core::Envelope;
use serde::Serialize;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub msg: &'static str,
    pub id: u64,
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Envelope>, JsonRejection>,
) -> ServerResult<Json<RegisterResponse>> {
    // A body that is not an envelope object carries no usable parameters
    let Json(envelope) = body.map_err(|e| {
        tracing::debug!("Unreadable register body: {}", e.body_text());
        ServerError::Validation(MISSING_PARAMETERS.into())
    })?;

    let record = state.registration.register(&envelope).await?;

    Ok(Json(RegisterResponse {
        msg: "Registro exitoso",
        id: record.id,
    }))
}
