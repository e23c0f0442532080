use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use blobfs_types::{BlobResult, ContentType};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Readable body of a stored blob.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// One entry of a bucket listing: `(mime, name)`.
pub type ListEntry = (String, String);

/// A blob opened for reading.
///
/// The underlying file or response body is released when this value is
/// dropped, on success and error paths alike.
pub struct BlobStream {
    pub content_type: ContentType,
    pub reader: BlobReader,
}

impl BlobStream {
    pub fn new(content_type: ContentType, reader: BlobReader) -> Self {
        Self { content_type, reader }
    }

    /// Drain the reader into memory.
    pub async fn into_bytes(mut self) -> BlobResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// The blob storage capability.
///
/// Implemented by the local [`FsBlobStore`](crate::FsBlobStore) and by the
/// HTTP remote proxy. Code written against this trait must behave the same
/// with either backend, apart from latency and transport failures.
///
/// All implementations must satisfy these invariants:
/// - Paths containing `..` fail with `IllegalPath` before any I/O.
/// - Per blob, the only legal transitions are absent -add-> present,
///   present -set-> present, present -del-> absent.
/// - Errors are always typed; callers never inspect message strings.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Create a new blob. Fails `AlreadyExists` if present and
    /// `NoSuchBucket` if its bucket is missing.
    async fn add(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<()>;

    /// Overwrite an existing blob and return the number of bytes written.
    async fn set(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<u64>;

    /// Open a blob for reading.
    async fn get(&self, path: &str) -> BlobResult<BlobStream>;

    /// Delete a blob.
    async fn del(&self, path: &str) -> BlobResult<()>;

    /// Create a bucket.
    async fn mkdir(&self, path: &str) -> BlobResult<()>;

    /// Remove an empty bucket.
    async fn rmdir(&self, path: &str) -> BlobResult<()>;

    /// List the blobs of a bucket as `(mime, name)` pairs.
    async fn lsdir(&self, path: &str) -> BlobResult<Vec<ListEntry>>;

    /// Read a whole blob into memory.
    async fn read(&self, path: &str) -> BlobResult<(ContentType, Vec<u8>)> {
        let stream = self.get(path).await?;
        let content_type = stream.content_type;
        Ok((content_type, stream.into_bytes().await?))
    }
}
