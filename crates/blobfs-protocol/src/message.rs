use blobfs_types::{BlobError, ErrorKind};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

/// JSON body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    /// Rebuild the error this body describes.
    pub fn into_error(self) -> BlobError {
        BlobError::from_kind(self.kind, self.message)
    }
}

impl From<&BlobError> for ErrorBody {
    fn from(err: &BlobError) -> Self {
        Self {
            kind: err.kind(),
            message: err.detail(),
        }
    }
}

/// Successful response to a Set (PUT) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResponse {
    pub written: u64,
}
