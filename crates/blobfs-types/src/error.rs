use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by any blob storage backend.
///
/// Local and remote backends report the same variants for the same
/// condition, so callers can match on them without caring where the store
/// lives.
#[derive(Debug, Error)]
pub enum BlobError {
    /// A blob or bucket already exists at this path.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// No blob or bucket exists at this path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The parent bucket of a blob does not exist.
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),

    /// A blob operation addressed a bucket.
    #[error("is a directory: {0}")]
    IsDirectory(String),

    /// The bucket still holds entries.
    #[error("bucket not empty: {0}")]
    NotEmpty(String),

    /// The path does not have the shape the operation requires.
    #[error("bad path: {0}")]
    BadPath(String),

    /// The path tries to escape the store root.
    #[error("illegal path: {0}")]
    IllegalPath(String),

    /// A path or stored file name could not be decoded.
    #[error("invalid format: {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    /// The MIME type is outside the supported set.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Malformed protocol-level input (missing header, empty body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The index and the filesystem disagree. Indicates a bug.
    #[error("fatal consistency violation: {0}")]
    Fatal(String),

    /// Unclassified server-side failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote store could not be reached or answered garbage.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result alias for blob storage operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Serializable classification of a [`BlobError`].
///
/// This is what crosses the wire: the server reports the kind of every
/// failure and the remote client rebuilds the matching error from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    NoSuchBucket,
    IsDirectory,
    NotEmpty,
    BadPath,
    IllegalPath,
    InvalidFormat,
    UnsupportedContentType,
    BadRequest,
    Fatal,
    Internal,
}

impl BlobError {
    /// Classify this error.
    ///
    /// I/O and transport failures have no dedicated kind and are reported
    /// as [`ErrorKind::Internal`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoSuchBucket(_) => ErrorKind::NoSuchBucket,
            Self::IsDirectory(_) => ErrorKind::IsDirectory,
            Self::NotEmpty(_) => ErrorKind::NotEmpty,
            Self::BadPath(_) => ErrorKind::BadPath,
            Self::IllegalPath(_) => ErrorKind::IllegalPath,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Fatal(_) => ErrorKind::Fatal,
            Self::Internal(_) | Self::Io(_) | Self::Transport(_) => ErrorKind::Internal,
        }
    }

    /// Rebuild an error from a kind and a detail message.
    pub fn from_kind(kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match kind {
            ErrorKind::AlreadyExists => Self::AlreadyExists(detail),
            ErrorKind::NotFound => Self::NotFound(detail),
            ErrorKind::NoSuchBucket => Self::NoSuchBucket(detail),
            ErrorKind::IsDirectory => Self::IsDirectory(detail),
            ErrorKind::NotEmpty => Self::NotEmpty(detail),
            ErrorKind::BadPath => Self::BadPath(detail),
            ErrorKind::IllegalPath => Self::IllegalPath(detail),
            ErrorKind::InvalidFormat => match detail.split_once(": ") {
                Some((path, reason)) => Self::InvalidFormat {
                    path: path.to_string(),
                    reason: reason.to_string(),
                },
                None => Self::InvalidFormat {
                    path: detail,
                    reason: "reported by remote".into(),
                },
            },
            ErrorKind::UnsupportedContentType => Self::UnsupportedContentType(detail),
            ErrorKind::BadRequest => Self::BadRequest(detail),
            ErrorKind::Fatal => Self::Fatal(detail),
            ErrorKind::Internal => Self::Internal(detail),
        }
    }

    /// The error's payload without the kind prefix of its `Display` form.
    ///
    /// `BlobError::from_kind(e.kind(), e.detail())` rebuilds an equivalent
    /// error.
    pub fn detail(&self) -> String {
        match self {
            Self::AlreadyExists(d)
            | Self::NotFound(d)
            | Self::NoSuchBucket(d)
            | Self::IsDirectory(d)
            | Self::NotEmpty(d)
            | Self::BadPath(d)
            | Self::IllegalPath(d)
            | Self::UnsupportedContentType(d)
            | Self::BadRequest(d)
            | Self::Fatal(d)
            | Self::Internal(d)
            | Self::Transport(d) => d.clone(),
            Self::InvalidFormat { path, reason } => format!("{path}: {reason}"),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Returns `true` for errors that indicate a bug rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Returns `true` if the caller caused the failure and can fix it.
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Fatal | ErrorKind::Internal)
    }
}
