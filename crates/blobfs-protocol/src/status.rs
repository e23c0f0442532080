//! Mapping between error kinds and HTTP status codes.

use blobfs_types::ErrorKind;
use hyper::StatusCode;

/// Status code the server answers with for an error of `kind`.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AlreadyExists | ErrorKind::IsDirectory => StatusCode::CONFLICT,
        ErrorKind::NotFound | ErrorKind::NoSuchBucket => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest
        | ErrorKind::NotEmpty
        | ErrorKind::BadPath
        | ErrorKind::IllegalPath
        | ErrorKind::InvalidFormat => StatusCode::BAD_REQUEST,
        ErrorKind::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorKind::Fatal | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Best-effort inverse of [`status_for`], for responses without an error
/// body. Several kinds share a status, so this is lossy.
pub fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::AlreadyExists,
        StatusCode::BAD_REQUEST => ErrorKind::BadRequest,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ErrorKind::UnsupportedContentType,
        _ => ErrorKind::Internal,
    }
}
