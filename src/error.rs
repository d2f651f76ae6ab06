use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy for the service layer. Validation failures are
/// raised before any storage access; storage failures roll back the
/// surrounding transaction and are surfaced as a generic 500 without
/// internal detail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage failure")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn into_http(self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Storage(e) => {
                error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".into(),
                )
            }
            Self::Internal(e) => {
                error!(error = %e, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".into(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request_with_message() {
        let (status, msg) = ServiceError::validation("All fields are required.").into_http();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "All fields are required.");
    }

    #[test]
    fn storage_never_leaks_detail() {
        let (status, msg) = ServiceError::Storage(sqlx::Error::RowNotFound).into_http();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error.");
    }
}
