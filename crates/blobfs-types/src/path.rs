//! Blob addressing: logical paths and their on-disk form.
//!
//! A blob is addressed as `{bucket}/{name}` and lives at
//! `{root}/{bucket}/{prefix}{name}`, where `prefix` is the two-character
//! [`ContentType`] code. Rules for logical paths:
//! - Must not contain `..` anywhere, a `.` segment, NUL, or `\`
//! - Blob paths have exactly two non-empty segments
//! - Bucket paths have exactly one non-empty segment, optionally followed by `/`

use std::fmt;
use std::path::{Path, PathBuf};

use crate::content_type::{ContentType, PREFIX_LEN};
use crate::error::{BlobError, BlobResult};

/// Separator between bucket and blob name.
pub const SEPARATOR: char = '/';

/// Leading character of in-flight staging files. It is outside the prefix
/// alphabet, so no stored blob's file name starts with it.
pub const STAGING_MARKER: char = '.';

/// Characters that are forbidden anywhere in a logical path.
const FORBIDDEN_CHARS: &[char] = &['\0', '\\'];

/// Reject paths that could escape the store root.
///
/// Runs before any path is joined onto the root, so a rejected path never
/// reaches the filesystem.
pub fn validate(path: &str) -> BlobResult<()> {
    if path.contains("..") {
        return Err(BlobError::IllegalPath(path.to_string()));
    }
    if path.split(SEPARATOR).any(|segment| segment == ".") {
        return Err(BlobError::IllegalPath(path.to_string()));
    }
    if path.contains(FORBIDDEN_CHARS) {
        return Err(BlobError::IllegalPath(path.to_string()));
    }
    Ok(())
}

/// Whether `path` has the shape of a bucket path (one segment, optional
/// trailing separator).
pub fn denotes_bucket(path: &str) -> bool {
    let trimmed = path.strip_suffix(SEPARATOR).unwrap_or(path);
    !trimmed.is_empty() && !trimmed.contains(SEPARATOR)
}

/// Validated `{bucket}/{name}` identity of a blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobPath {
    bucket: String,
    name: String,
}

impl BlobPath {
    /// Validate and split a logical blob path.
    ///
    /// # Examples
    ///
    /// ```
    /// use blobfs_types::BlobPath;
    ///
    /// let p = BlobPath::parse("users/alice").unwrap();
    /// assert_eq!(p.bucket(), "users");
    /// assert_eq!(p.name(), "alice");
    /// assert!(BlobPath::parse("users").is_err());
    /// assert!(BlobPath::parse("users/../etc").is_err());
    /// ```
    pub fn parse(path: &str) -> BlobResult<Self> {
        validate(path)?;
        let mut parts = path.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(bucket), Some(name), None) if !bucket.is_empty() && !name.is_empty() => {
                Ok(Self {
                    bucket: bucket.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(BlobError::InvalidFormat {
                path: path.to_string(),
                reason: "blob path must be {bucket}/{name}".into(),
            }),
        }
    }

    /// Build a blob path from already-separated parts.
    pub fn new(bucket: &str, name: &str) -> BlobResult<Self> {
        Self::parse(&format!("{bucket}{SEPARATOR}{name}"))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical location of this blob when stored as `content_type`.
    pub fn file_path(&self, root: &Path, content_type: ContentType) -> PathBuf {
        to_file_path(root, &self.bucket, content_type, &self.name)
    }

    /// Scratch file a new body for this blob is written to before it is
    /// renamed into place.
    pub fn staging_path(&self, root: &Path, content_type: ContentType) -> PathBuf {
        let staged = format!("{STAGING_MARKER}{}.tmp", file_name(content_type, &self.name));
        root.join(&self.bucket).join(staged)
    }

    /// Physical location of this blob's bucket.
    pub fn bucket_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.bucket)
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.bucket, self.name)
    }
}

/// Validated bucket name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketPath(String);

impl BucketPath {
    /// Validate a bucket path. A single trailing separator is accepted.
    pub fn parse(path: &str) -> BlobResult<Self> {
        validate(path)?;
        if !denotes_bucket(path) {
            return Err(BlobError::BadPath(path.to_string()));
        }
        let name = path.strip_suffix(SEPARATOR).unwrap_or(path);
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Physical location of this bucket.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compose `{root}/{bucket}/{prefix}{name}`. Pure; touches no files.
pub fn to_file_path(root: &Path, bucket: &str, content_type: ContentType, name: &str) -> PathBuf {
    root.join(bucket).join(file_name(content_type, name))
}

/// Encoded on-disk file name for a blob.
pub fn file_name(content_type: ContentType, name: &str) -> String {
    let mut s = content_type.prefix();
    s.push_str(name);
    s
}

/// Whether an on-disk file name belongs to a staging file rather than a blob.
pub fn is_staging_file_name(file_name: &str) -> bool {
    file_name.starts_with(STAGING_MARKER)
}

/// Split an on-disk file name into its content type and blob name.
pub fn from_file_name(file_name: &str) -> BlobResult<(ContentType, String)> {
    let content_type = ContentType::decode(file_name).ok_or_else(|| BlobError::InvalidFormat {
        path: file_name.to_string(),
        reason: "file name does not start with a known type prefix".into(),
    })?;
    let name = &file_name[PREFIX_LEN..];
    if name.is_empty() {
        return Err(BlobError::InvalidFormat {
            path: file_name.to_string(),
            reason: "file name has no blob name after the type prefix".into(),
        });
    }
    Ok((content_type, name.to_string()))
}
