//! Filesystem-backed implementation of [`BlobStorage`].

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use blobfs_types::path::{self as blob_path, from_file_name, is_staging_file_name};
use blobfs_types::{BlobError, BlobPath, BlobResult, BucketPath, ContentType};
use bytes::Bytes;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::{SetTypePolicy, StoreConfig};
use crate::index::{HydrateReport, Index};
use crate::traits::{BlobStorage, BlobStream, ListEntry};

/// Blob store rooted at a local directory.
///
/// Layout on disk is `{root}/{bucket}/{prefix}{name}`. The in-memory
/// [`Index`] and the directory tree are guarded together by one
/// `RwLock`: every check-then-act sequence (add, set, del, mkdir, rmdir)
/// runs under the write guard, reads (get, lsdir) under the read guard.
pub struct FsBlobStore {
    root: PathBuf,
    config: StoreConfig,
    index: RwLock<Index>,
}

impl FsBlobStore {
    /// Open a store, creating the root directory if needed and hydrating
    /// the index from it.
    pub fn open(config: StoreConfig) -> BlobResult<Self> {
        std::fs::create_dir_all(&config.root)?;
        let mut index = Index::new();
        let report = index.hydrate(&config.root)?;
        info!(
            root = %config.root.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            "blob store opened"
        );
        Ok(Self {
            root: config.root.clone(),
            config,
            index: RwLock::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of indexed blobs.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Rebuild the index from the filesystem.
    pub async fn reload(&self) -> BlobResult<HydrateReport> {
        let mut index = self.index.write().await;
        let report = index.hydrate(&self.root)?;
        info!(loaded = report.loaded, skipped = report.skipped, "index reloaded");
        Ok(report)
    }

    /// Shut the store down. The index is discarded; the files remain.
    pub fn close(self) {
        let count = self.index.into_inner().len();
        debug!(root = %self.root.display(), indexed = count, "blob store closed");
    }

    /// Find a file for `blob` under any type prefix.
    async fn find_on_disk(&self, blob: &BlobPath) -> BlobResult<Option<ContentType>> {
        for content_type in ContentType::ALL {
            if fs::try_exists(blob.file_path(&self.root, content_type)).await? {
                return Ok(Some(content_type));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .field("set_type_policy", &self.config.set_type_policy)
            .finish_non_exhaustive()
    }
}

fn fatal(detail: String) -> BlobError {
    error!(detail = %detail, "index and filesystem diverged");
    BlobError::Fatal(detail)
}

fn reject_empty(blob: &BlobPath, data: &Bytes) -> BlobResult<()> {
    if data.is_empty() {
        return Err(BlobError::BadRequest(format!("empty body for {blob}")));
    }
    Ok(())
}

async fn is_dir(path: &Path) -> BlobResult<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write all of `data` into `file` and flush it to disk.
async fn write_contents(file: &mut File, data: &[u8]) -> std::io::Result<u64> {
    let mut src = data;
    let written = tokio::io::copy(&mut src, file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Create `path` exclusively and fill it. A partial file is removed.
async fn create_file(path: &Path, data: &[u8]) -> std::io::Result<u64> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path).await?;
    match write_contents(&mut file, data).await {
        Ok(written) => Ok(written),
        Err(e) => {
            drop(file);
            if let Err(cleanup) = fs::remove_file(path).await {
                warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
            }
            Err(e)
        }
    }
}

/// Write `data` to `staging`, then rename it over `target`.
///
/// Readers that already hold `target` open keep the old contents; a failed
/// write leaves `target` untouched.
async fn replace_file(staging: &Path, target: &Path, data: &[u8]) -> std::io::Result<u64> {
    match fs::remove_file(staging).await {
        Ok(()) => warn!(path = %staging.display(), "removed stale staging file"),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let written = create_file(staging, data).await?;
    if let Err(e) = fs::rename(staging, target).await {
        if let Err(cleanup) = fs::remove_file(staging).await {
            warn!(path = %staging.display(), error = %cleanup, "failed to remove staging file");
        }
        return Err(e);
    }
    Ok(written)
}

#[async_trait]
impl BlobStorage for FsBlobStore {
    async fn add(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<()> {
        let blob = BlobPath::parse(path)?;
        reject_empty(&blob, &data)?;

        let mut index = self.index.write().await;
        if index.lookup(&blob).is_some() {
            return Err(BlobError::AlreadyExists(blob.to_string()));
        }
        if !is_dir(&blob.bucket_dir(&self.root)).await? {
            return Err(BlobError::NoSuchBucket(blob.bucket().to_string()));
        }
        if let Some(on_disk) = self.find_on_disk(&blob).await? {
            warn!(blob = %blob, stored = %on_disk, "blob on disk but missing from index");
            return Err(BlobError::AlreadyExists(blob.to_string()));
        }

        let file = blob.file_path(&self.root, content_type);
        match create_file(&file, &data).await {
            Ok(_) => {}
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists(blob.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(previous) = index.insert(blob.clone(), content_type) {
            return Err(fatal(format!("{blob} was indexed as {previous} during add")));
        }
        debug!(blob = %blob, content_type = %content_type, bytes = data.len(), "blob added");
        Ok(())
    }

    async fn set(&self, content_type: ContentType, path: &str, data: Bytes) -> BlobResult<u64> {
        let blob = BlobPath::parse(path)?;
        reject_empty(&blob, &data)?;

        let mut index = self.index.write().await;
        let stored = index
            .lookup(&blob)
            .ok_or_else(|| BlobError::NotFound(blob.to_string()))?;
        let current = blob.file_path(&self.root, stored);
        if !fs::try_exists(&current).await? {
            return Err(fatal(format!("{blob} is indexed but {} is missing", current.display())));
        }

        let target = match self.config.set_type_policy {
            SetTypePolicy::Keep => stored,
            SetTypePolicy::Replace => content_type,
        };

        let staging = blob.staging_path(&self.root, target);
        let written = if target == stored {
            replace_file(&staging, &current, &data).await?
        } else {
            let replacement = blob.file_path(&self.root, target);
            if fs::try_exists(&replacement).await? {
                return Err(fatal(format!(
                    "{blob} is indexed as {stored} but {} also exists",
                    replacement.display()
                )));
            }
            let written = replace_file(&staging, &replacement, &data).await?;
            if let Err(e) = fs::remove_file(&current).await {
                if let Err(cleanup) = fs::remove_file(&replacement).await {
                    warn!(
                        path = %replacement.display(),
                        error = %cleanup,
                        "failed to roll back retyped file"
                    );
                }
                return Err(e.into());
            }
            index.insert(blob.clone(), target);
            written
        };

        if written == 0 {
            return Err(fatal(format!("wrote zero bytes to {blob}")));
        }
        debug!(blob = %blob, content_type = %target, bytes = written, "blob set");
        Ok(written)
    }

    async fn get(&self, path: &str) -> BlobResult<BlobStream> {
        blob_path::validate(path)?;

        let index = self.index.read().await;
        if blob_path::denotes_bucket(path) {
            let bucket = BucketPath::parse(path)?;
            if is_dir(&bucket.dir(&self.root)).await? {
                return Err(BlobError::IsDirectory(bucket.to_string()));
            }
        }

        let blob = BlobPath::parse(path)?;
        let content_type = index
            .lookup(&blob)
            .ok_or_else(|| BlobError::NotFound(blob.to_string()))?;
        let file = blob.file_path(&self.root, content_type);
        let handle = match File::open(&file).await {
            Ok(handle) => handle,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(fatal(format!("{blob} is indexed but {} is missing", file.display())));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(BlobStream::new(content_type, Box::pin(handle)))
    }

    async fn del(&self, path: &str) -> BlobResult<()> {
        let blob = BlobPath::parse(path)?;

        let mut index = self.index.write().await;
        let content_type = index
            .lookup(&blob)
            .ok_or_else(|| BlobError::NotFound(blob.to_string()))?;
        let file = blob.file_path(&self.root, content_type);

        // File first: an interrupted delete leaves an orphan file that the
        // next hydration picks up, never an index entry without a file.
        match fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                index.remove(&blob);
                return Err(fatal(format!("{blob} is indexed but {} is missing", file.display())));
            }
            Err(e) => return Err(e.into()),
        }

        if index.remove(&blob).is_none() {
            return Err(fatal(format!("{blob} left the index before its file was removed")));
        }
        debug!(blob = %blob, "blob deleted");
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> BlobResult<()> {
        let bucket = BucketPath::parse(path)?;

        let _index = self.index.write().await;
        match fs::create_dir(bucket.dir(&self.root)).await {
            Ok(()) => {
                debug!(bucket = %bucket, "bucket created");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                Err(BlobError::AlreadyExists(bucket.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn rmdir(&self, path: &str) -> BlobResult<()> {
        let bucket = BucketPath::parse(path)?;

        let index = self.index.write().await;
        let dir = bucket.dir(&self.root);
        if !is_dir(&dir).await? {
            return Err(BlobError::NotFound(bucket.to_string()));
        }
        let mut entries = fs::read_dir(&dir).await?;
        if entries.next_entry().await?.is_some() {
            return Err(BlobError::NotEmpty(bucket.to_string()));
        }
        fs::remove_dir(&dir).await?;

        let stale = index.bucket_len(bucket.as_str());
        if stale > 0 {
            return Err(fatal(format!("removed {bucket} but {stale} blobs were still indexed")));
        }
        debug!(bucket = %bucket, "bucket removed");
        Ok(())
    }

    async fn lsdir(&self, path: &str) -> BlobResult<Vec<ListEntry>> {
        let bucket = BucketPath::parse(path)?;

        let _index = self.index.read().await;
        let dir = bucket.dir(&self.root);
        if !is_dir(&dir).await? {
            return Err(BlobError::NotFound(bucket.to_string()));
        }

        let mut listing = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let raw = entry.file_name();
            let file_name = raw.to_str().ok_or_else(|| BlobError::InvalidFormat {
                path: format!("{bucket}/{}", raw.to_string_lossy()),
                reason: "non UTF-8 file name".into(),
            })?;
            if is_staging_file_name(file_name) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                return Err(BlobError::InvalidFormat {
                    path: format!("{bucket}/{file_name}"),
                    reason: "nested directory inside a bucket".into(),
                });
            }
            let (content_type, name) = from_file_name(file_name)?;
            listing.push((content_type.mime().to_string(), name));
        }
        listing.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(listing)
    }
}
