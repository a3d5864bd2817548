pub mod emissions;
pub mod flight;
pub mod masked;
pub mod offer;
pub mod repository;
pub mod schedule;
pub mod search;
pub mod supplier;
pub mod ticket;
pub mod time;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Upstream provider error: {0}")]
    UpstreamError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
