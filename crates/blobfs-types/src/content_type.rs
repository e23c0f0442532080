//! Content-type tags and their compact filename encoding.
//!
//! Every stored file name starts with a fixed two-character prefix that
//! encodes the blob's [`ContentType`] ordinal in the web-safe base-64
//! alphabet: `ALPHABET[n / 64]` followed by `ALPHABET[n % 64]`. Stream is
//! therefore `AA`, plain `AB`, json `AD`.
//!
//! Decoding is total: anything that is not a known prefix yields `None`, so
//! callers scanning a directory can skip bad entries without unwinding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BlobError, BlobResult};

/// Web-safe base-64 alphabet used for filename prefixes.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Width of the encoded type prefix in every stored file name.
pub const PREFIX_LEN: usize = 2;

/// Supported blob content types.
///
/// The discriminant is the ordinal persisted on disk; reordering variants
/// would reinterpret every stored file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ContentType {
    Stream = 0,
    Plain = 1,
    Html = 2,
    Json = 3,
    Css = 4,
    Javascript = 5,
    Mp3 = 6,
    Ogg = 7,
    Jpeg = 8,
    Png = 9,
    Gif = 10,
    Mp4 = 11,
    Webm = 12,
    Mkv = 13,
}

impl ContentType {
    /// Every content type, in ordinal order.
    pub const ALL: [ContentType; 14] = [
        Self::Stream,
        Self::Plain,
        Self::Html,
        Self::Json,
        Self::Css,
        Self::Javascript,
        Self::Mp3,
        Self::Ogg,
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Mp4,
        Self::Webm,
        Self::Mkv,
    ];

    /// The persisted ordinal.
    pub fn ordinal(self) -> u16 {
        self as u16
    }

    /// Look up a content type by ordinal.
    pub fn from_ordinal(n: u16) -> Option<Self> {
        Self::ALL.get(usize::from(n)).copied()
    }

    /// Canonical MIME string.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Stream => "application/octet-stream",
            Self::Plain => "text/plain",
            Self::Html => "text/html",
            Self::Json => "application/json",
            Self::Css => "text/css",
            Self::Javascript => "text/javascript",
            Self::Mp3 => "audio/mp3",
            Self::Ogg => "audio/ogg",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Mkv => "video/mkv",
        }
    }

    /// Parse a MIME string.
    ///
    /// Parameters such as `; charset=utf-8` and surrounding whitespace are
    /// ignored and the comparison is ASCII case-insensitive. Returns `None`
    /// for anything outside the supported set.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .iter()
            .copied()
            .find(|ct| ct.mime().eq_ignore_ascii_case(essence))
    }

    /// Parse a MIME string, defaulting to [`ContentType::Stream`].
    pub fn from_mime_or_stream(mime: &str) -> Self {
        Self::from_mime(mime).unwrap_or(Self::Stream)
    }

    /// Encode this type as its two-character filename prefix.
    pub fn encode(self) -> [u8; PREFIX_LEN] {
        let n = usize::from(self.ordinal());
        [ALPHABET[n / 64], ALPHABET[n % 64]]
    }

    /// The filename prefix as a `String`.
    pub fn prefix(self) -> String {
        let [hi, lo] = self.encode();
        let mut s = String::with_capacity(PREFIX_LEN);
        s.push(char::from(hi));
        s.push(char::from(lo));
        s
    }

    /// Decode the leading [`PREFIX_LEN`] characters of `name`.
    ///
    /// Returns `None` if `name` is too short, contains characters outside
    /// the alphabet, or names an ordinal with no content type.
    pub fn decode(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() < PREFIX_LEN {
            return None;
        }
        let hi = alphabet_index(bytes[0])?;
        let lo = alphabet_index(bytes[1])?;
        Self::from_ordinal(hi * 64 + lo)
    }
}

fn alphabet_index(byte: u8) -> Option<u16> {
    ALPHABET.iter().position(|&c| c == byte).map(|i| i as u16)
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = BlobError;

    fn from_str(s: &str) -> BlobResult<Self> {
        Self::from_mime(s).ok_or_else(|| BlobError::UnsupportedContentType(s.to_string()))
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_mime(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported content type: {s}")))
    }
}

/// How an incoming MIME string outside the supported set is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimePolicy {
    /// Reject with [`BlobError::UnsupportedContentType`].
    #[default]
    Strict,
    /// Store as [`ContentType::Stream`].
    Permissive,
}

impl MimePolicy {
    /// Resolve a MIME string under this policy.
    pub fn resolve(self, mime: &str) -> BlobResult<ContentType> {
        match self {
            Self::Strict => mime.parse(),
            Self::Permissive => Ok(ContentType::from_mime_or_stream(mime)),
        }
    }
}
