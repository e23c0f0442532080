//! In-memory index of stored blobs.
//!
//! The [`Index`] maps every known [`BlobPath`] to its [`ContentType`]. It is a
//! derived cache: the filesystem is authoritative and [`Index::hydrate`] can
//! rebuild the whole map from it at any time.
//!
//! The index carries no lock of its own. [`FsBlobStore`](crate::FsBlobStore)
//! keeps it behind the same lock that serializes filesystem mutations, so it
//! can only be touched while that lock is held.

use std::collections::HashMap;
use std::path::Path;

use blobfs_types::path::{from_file_name, is_staging_file_name};
use blobfs_types::{BlobPath, BlobResult, ContentType};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Outcome of a hydration scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HydrateReport {
    /// Blobs inserted into the index.
    pub loaded: usize,
    /// Entries that were not valid blobs and were skipped.
    pub skipped: usize,
}

/// Blob identity to content type, for every blob under the store root.
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<BlobPath, ContentType>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a scan of `root/*/*`.
    ///
    /// Each directory directly under `root` is a bucket and each file inside
    /// a bucket is a blob. Anything else, and any file whose name does not
    /// decode, is logged and skipped; a bad entry never aborts the scan.
    pub fn hydrate(&mut self, root: &Path) -> BlobResult<HydrateReport> {
        // Surface an unreadable root as an error instead of an empty index.
        std::fs::read_dir(root)?;

        self.entries.clear();
        let mut report = HydrateReport::default();

        for entry in WalkDir::new(root).min_depth(1).max_depth(2).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    report.skipped += 1;
                    continue;
                }
            };

            if entry.depth() == 1 {
                if !entry.file_type().is_dir() {
                    warn!(path = %entry.path().display(), "bucket is not a directory");
                    report.skipped += 1;
                }
                continue;
            }

            if !entry.file_type().is_file() {
                warn!(path = %entry.path().display(), "blob is not a regular file");
                report.skipped += 1;
                continue;
            }

            let (Some(bucket), Some(file_name)) = (
                entry.path().parent().and_then(|p| p.file_name()).and_then(|s| s.to_str()),
                entry.file_name().to_str(),
            ) else {
                warn!(path = %entry.path().display(), "non UTF-8 file name");
                report.skipped += 1;
                continue;
            };

            if is_staging_file_name(file_name) {
                warn!(
                    path = %entry.path().display(),
                    "leftover staging file from an interrupted set"
                );
                report.skipped += 1;
                continue;
            }

            let parsed = from_file_name(file_name).and_then(|(content_type, name)| {
                BlobPath::new(bucket, &name).map(|path| (path, content_type))
            });
            match parsed {
                Ok((path, content_type)) => {
                    if let Some(previous) = self.entries.insert(path.clone(), content_type) {
                        warn!(
                            blob = %path,
                            kept = %content_type,
                            dropped = %previous,
                            "blob stored under more than one type prefix"
                        );
                    }
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "invalid blob file name");
                    report.skipped += 1;
                }
            }
        }

        debug!(loaded = report.loaded, skipped = report.skipped, "index hydrated");
        Ok(report)
    }

    pub fn lookup(&self, path: &BlobPath) -> Option<ContentType> {
        self.entries.get(path).copied()
    }

    /// Insert or replace an entry, returning the previous type if any.
    pub fn insert(&mut self, path: BlobPath, content_type: ContentType) -> Option<ContentType> {
        self.entries.insert(path, content_type)
    }

    /// Remove an entry, returning its type if it existed.
    pub fn remove(&mut self, path: &BlobPath) -> Option<ContentType> {
        self.entries.remove(path)
    }

    /// Number of indexed blobs in `bucket`.
    pub fn bucket_len(&self, bucket: &str) -> usize {
        self.entries.keys().filter(|p| p.bucket() == bucket).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
