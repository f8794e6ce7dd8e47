use crate::state::AppState;
use axum::{Json, extract::State};
use intake_classifier::Readiness;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classifier: Readiness,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        classifier: state.registration.classifier().status(),
    })
}
