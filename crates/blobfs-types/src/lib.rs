//! Foundation types for blobfs.
//!
//! This crate provides the vocabulary shared by every other blobfs crate:
//! what a blob is called, how its content type is written into a file name,
//! and which errors a storage backend may report.
//!
//! # Key Types
//!
//! - [`ContentType`] -- Closed set of supported MIME kinds with a two-character filename codec
//! - [`MimePolicy`] -- How unknown MIME strings are resolved (reject or fall back to stream)
//! - [`BlobPath`] -- Validated `{bucket}/{name}` identity of a blob
//! - [`BucketPath`] -- Validated bucket name
//! - [`BlobError`] / [`ErrorKind`] -- Typed error taxonomy shared by local and remote storage

pub mod content_type;
pub mod error;
pub mod path;

pub use content_type::{ContentType, MimePolicy, PREFIX_LEN};
pub use error::{BlobError, BlobResult, ErrorKind};
pub use path::{BlobPath, BucketPath};
