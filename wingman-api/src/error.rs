use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wingman_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        CoreError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => match err.downcast_ref::<CoreError>() {
                Some(core) => {
                    let status = core_status(core);
                    if status.is_server_error() {
                        tracing::error!("Request failed: {}", core);
                    }
                    let message = match core {
                        CoreError::InternalError(_) => "Internal Server Error".to_string(),
                        other => other.to_string(),
                    };
                    (status, message)
                }
                None => {
                    tracing::error!("Internal Server Error: {:#}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
                }
            },
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

/// Repository seams return boxed errors; they are never the client's fault.
pub fn repository_error(err: Box<dyn std::error::Error + Send + Sync>) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::ValidationError(rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::ValidationError(rejection.body_text())
}
