use autohome_core::{DispatchError, Error};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown action: {0}")]
    NotFound(String),

    #[error("Action error: {0}")]
    ActionError(#[from] Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::UnknownAction(name) => ApiError::NotFound(name),
            DispatchError::Action(e) => ApiError::ActionError(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        match self {
            ApiError::NotFound(name) => {
                tracing::debug!("Unknown action requested: {}", name);
                return StatusCode::NOT_FOUND.into_response();
            }
            ApiError::ActionError(e) => {
                tracing::error!(error_id = ?error_id, "Action error: {}", e);
            }
            ApiError::InternalError(e) => {
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
            }
        }

        let body = Json(json!({
            "error": {
                "code": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "message": "Internal server error",
                "error_id": error_id.to_string(),
            }
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
