use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use intake_classifier::ClassifierError;
use intake_core::CoreError;
use intake_storage::StorageError;
use serde_json::json;
use thiserror::Error;

pub const MISSING_PARAMETERS: &str = "Missing encryption parameters";
pub const NOT_FOUND: &str = "Registro no encontrado";
pub const MODEL_NOT_LOADED: &str = "Modelo no cargado";

/// Request failures, mapped to a status and a `{"msg"}` body once at the
/// request boundary
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Key decryption failed: {0}")]
    KeyDecryption(String),

    #[error("Data decryption failed: {0}")]
    DataDecryption(String),

    #[error("Record not found")]
    NotFound,

    #[error("Classifier not ready")]
    NotReady,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ServerError::KeyDecryption(detail) => {
                tracing::warn!("Key decryption error: {}", detail);
                (StatusCode::BAD_REQUEST, "Key decryption error".into())
            }
            ServerError::DataDecryption(detail) => {
                tracing::warn!("Data decryption error: {}", detail);
                (StatusCode::BAD_REQUEST, "Data decryption error".into())
            }
            ServerError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND.into()),
            ServerError::NotReady => {
                tracing::info!("Classifier requested before it was ready");
                (StatusCode::SERVICE_UNAVAILABLE, MODEL_NOT_LOADED.into())
            }
            ServerError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".into())
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".into())
            }
        };

        (status, Json(json!({ "msg": message }))).into_response()
    }
}

impl From<CoreError> for ServerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(_) => ServerError::Validation(MISSING_PARAMETERS.into()),
            CoreError::KeyDecryption(detail) => ServerError::KeyDecryption(detail),
            CoreError::DataDecryption(detail) => ServerError::DataDecryption(detail),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ServerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ServerError::NotFound,
            StorageError::InvalidField { .. } => ServerError::Validation(e.to_string()),
            other => ServerError::Storage(other.to_string()),
        }
    }
}

/// Only readiness failures reach a response; per-record prediction errors
/// become sentinel labels instead
impl From<ClassifierError> for ServerError {
    fn from(e: ClassifierError) -> Self {
        if e.is_unloaded() {
            ServerError::NotReady
        } else {
            ServerError::Internal(e.to_string())
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::Validation(format!("Invalid JSON body: {}", e.body_text()))
    }
}

/// Non-integer ids can never name a record
impl From<PathRejection> for ServerError {
    fn from(_: PathRejection) -> Self {
        ServerError::NotFound
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::KeyDecryption("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::DataDecryption("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::NotFound, StatusCode::NOT_FOUND),
            (ServerError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (ServerError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_core_validation_is_missing_parameters() {
        let err = ServerError::from(CoreError::Validation("iv".into()));
        assert!(matches!(err, ServerError::Validation(ref m) if m == MISSING_PARAMETERS));
    }

    #[test]
    fn test_storage_mapping() {
        assert!(matches!(
            ServerError::from(StorageError::NotFound(3)),
            ServerError::NotFound
        ));
        assert!(matches!(
            ServerError::from(StorageError::Corrupt("x".into())),
            ServerError::Storage(_)
        ));
    }

    #[test]
    fn test_unavailable_classifier_is_not_ready() {
        assert!(matches!(
            ServerError::from(ClassifierError::Unavailable("none".into())),
            ServerError::NotReady
        ));
    }

    #[test]
    fn test_other_classifier_errors_are_internal() {
        assert!(matches!(
            ServerError::from(ClassifierError::Model("nan".into())),
            ServerError::Internal(_)
        ));
    }
}
