use axum::response::{IntoResponse, Response};
use axum::Json;
use blobfs_protocol::{status_for, ErrorBody};
use blobfs_types::BlobError;
use thiserror::Error;
use tracing::{debug, error};

/// Errors from starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] BlobError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A storage error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub BlobError);

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::from(&self.0);
        let status = status_for(body.kind);
        if self.0.is_client_error() {
            debug!(kind = ?body.kind, error = %self.0, "request rejected");
        } else {
            error!(kind = ?body.kind, error = %self.0, "request failed");
        }
        (status, Json(body)).into_response()
    }
}
