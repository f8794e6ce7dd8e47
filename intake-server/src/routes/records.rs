use crate::error::ServerResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use intake_storage::{Fields, Record};
use serde::Serialize;

#[derive(Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

/// GET /api/records
pub async fn list_records(State(state): State<AppState>) -> ServerResult<Json<Vec<Record>>> {
    let records = state.registration.records().list().await?;
    Ok(Json(records))
}

/// GET /api/records/{id}
pub async fn get_record(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ServerResult<Json<Record>> {
    let Path(id) = id?;
    let record = state.registration.records().get(id).await?;
    Ok(Json(record))
}

/// PUT /api/records/{id}
///
/// Merges the body into the stored record; `ID` in the body is ignored.
pub async fn update_record(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<Fields>, JsonRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let Json(fields) = body?;

    state.registration.records().update(id, fields).await?;
    tracing::debug!(id, "record updated");

    Ok(Json(MessageResponse {
        msg: "Registro actualizado",
    }))
}

/// DELETE /api/records/{id}
pub async fn delete_record(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Path(id) = id?;

    state.registration.records().delete(id).await?;
    tracing::debug!(id, "record deleted");

    Ok(Json(MessageResponse {
        msg: "Registro eliminado",
    }))
}
