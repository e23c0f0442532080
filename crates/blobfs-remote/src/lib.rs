//! Remote blob storage over HTTP.
//!
//! [`RemoteStore`] implements [`BlobStorage`](blobfs_store::BlobStorage)
//! by talking to a `blobfs-server`. Failures come back as the same
//! [`BlobError`](blobfs_types::BlobError) variants the local engine
//! reports, plus `Transport` when the server cannot be reached.

pub mod client;
pub mod config;

pub use client::RemoteStore;
pub use config::RemoteConfig;
