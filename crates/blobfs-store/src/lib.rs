//! Filesystem blob store for blobfs.
//!
//! Blobs live in buckets under a single root directory. Each blob is one
//! file whose name carries a two-character content-type prefix, so the
//! directory tree alone is enough to rebuild the in-memory [`Index`].
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStorage`] trait:
//!
//! - [`FsBlobStore`] -- local directory tree, the authoritative store
//! - `RemoteStore` in `blobfs-remote` -- HTTP proxy to a running server
//!
//! # Design Rules
//!
//! 1. The filesystem is authoritative; the index is a derived cache.
//! 2. Every path is validated before it is joined onto the root.
//! 3. Mutations hold the store's write lock for their whole check-then-act
//!    sequence; reads share the read lock.
//! 4. Index/filesystem divergence surfaces as `Fatal`, never silently.

pub mod config;
pub mod engine;
pub mod index;
pub mod traits;

pub use config::{SetTypePolicy, StoreConfig};
pub use engine::FsBlobStore;
pub use index::{HydrateReport, Index};
pub use traits::{BlobReader, BlobStorage, BlobStream, ListEntry};
