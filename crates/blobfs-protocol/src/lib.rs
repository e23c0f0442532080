//! HTTP wire protocol for blobfs.
//!
//! Shared by the server and the remote client so both sides agree on
//! routes, JSON bodies, and how [`BlobError`](blobfs_types::BlobError)s
//! travel as status codes.

pub mod endpoint;
pub mod message;
pub mod status;

pub use endpoint::{endpoints, HealthResponse};
pub use message::{ErrorBody, SetResponse, PROTOCOL_VERSION};
pub use status::{kind_for_status, status_for};
