use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RecoveryError;

/// Kind of hidden-gallery container, derived from the upload's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// `.lsa`: a fully encoded still image
    Image,
    /// `.lsav`: a video whose header region is encoded
    Video,
}

impl ContainerKind {
    /// Parse a container kind from a bare extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "lsa" => Some(ContainerKind::Image),
            "lsav" => Some(ContainerKind::Video),
            _ => None,
        }
    }

    /// Parse a container kind from an upload filename.
    pub fn from_filename(filename: &str) -> Result<Self, RecoveryError> {
        let name = base_name(filename);
        let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| RecoveryError::UnsupportedKind {
            extension: ext.to_string(),
        })
    }

    /// Transform strategy for this kind. Total over both variants.
    pub fn strategy(self) -> TransformStrategy {
        match self {
            ContainerKind::Image => TransformStrategy::Full,
            ContainerKind::Video => TransformStrategy::HeaderOnly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKind::Image => "image",
            ContainerKind::Video => "video",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of a container the transform provider reverses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformStrategy {
    /// Every byte is transformed
    Full,
    /// Only a bounded leading window is transformed; the rest passes through
    HeaderOnly,
}

impl fmt::Display for TransformStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStrategy::Full => f.write_str("full"),
            TransformStrategy::HeaderOnly => f.write_str("header-only"),
        }
    }
}

/// An uploaded container. Lives for one request only.
#[derive(Debug, Clone)]
pub struct Container {
    pub filename: String,
    pub kind: ContainerKind,
    pub bytes: Vec<u8>,
}

impl Container {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Result<Self, RecoveryError> {
        let kind = ContainerKind::from_filename(filename)?;
        Ok(Self {
            filename: filename.to_string(),
            kind,
            bytes,
        })
    }

    /// Filename without directory components or the container extension.
    ///
    /// Falls back to `"recovered"` when nothing is left (e.g. `".lsa"`).
    pub fn stem(&self) -> &str {
        let name = base_name(&self.filename);
        let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
        if stem.is_empty() {
            "recovered"
        } else {
            stem
        }
    }

    /// `<stem>.<extension>` for the recovered output.
    pub fn output_filename(&self, format: &MediaFormat) -> String {
        format!("{}.{}", self.stem(), format.extension)
    }
}

/// Strip any client-supplied directory components (both separators).
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Concrete media type inferred from recovered bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MediaFormat {
    pub extension: &'static str,
    pub mime: &'static str,
}

impl MediaFormat {
    pub const JPEG: MediaFormat = MediaFormat::new("jpg", "image/jpeg");
    pub const PNG: MediaFormat = MediaFormat::new("png", "image/png");
    pub const GIF: MediaFormat = MediaFormat::new("gif", "image/gif");
    pub const WEBP: MediaFormat = MediaFormat::new("webp", "image/webp");
    pub const HEIC: MediaFormat = MediaFormat::new("heic", "image/heic");
    pub const AVIF: MediaFormat = MediaFormat::new("avif", "image/avif");
    pub const MP4: MediaFormat = MediaFormat::new("mp4", "video/mp4");
    pub const QUICKTIME: MediaFormat = MediaFormat::new("mov", "video/quicktime");
    pub const MATROSKA: MediaFormat = MediaFormat::new("mkv", "video/x-matroska");
    /// Substituted when no signature matches
    pub const UNKNOWN: MediaFormat = MediaFormat::new("bin", "application/octet-stream");

    pub const fn new(extension: &'static str, mime: &'static str) -> Self {
        Self { extension, mime }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.extension, self.mime)
    }
}

/// Output of a successful recovery, handed straight to the transport layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredArtifact {
    pub bytes: Vec<u8>,
    pub format: MediaFormat,
    pub filename: String,
    /// BLAKE3 hex digest of `bytes`
    pub digest: String,
}

impl RecoveredArtifact {
    pub fn mime(&self) -> &'static str {
        self.format.mime
    }
}

/// Recovery pipeline states. `Rejected` may be entered from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Received,
    KindSelected,
    Transformed,
    Classified,
    Validated,
    Delivered,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::KindSelected => "kind-selected",
            Stage::Transformed => "transformed",
            Stage::Classified => "classified",
            Stage::Validated => "validated",
            Stage::Delivered => "delivered",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
