//! Structural checks on recovered bytes
//!
//! Image containers that sniff as JPEG must start with the SOI marker. Video
//! containers are trusted as sniffed unless `strict_video_header` is set, in
//! which case an ISO-BMFF `ftyp` box at offset 4 or an EBML header at offset
//! 0 is required.

use lsa_core::config::RecoveryConfig;
use lsa_core::{ContainerKind, MediaFormat, RecoveryError};

const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPolicy {
    strict_video_header: bool,
}

impl ValidationPolicy {
    pub fn new(strict_video_header: bool) -> Self {
        Self {
            strict_video_header,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(config.strict_video_header)
    }

    pub fn validate(
        &self,
        kind: ContainerKind,
        format: &MediaFormat,
        bytes: &[u8],
    ) -> Result<(), RecoveryError> {
        match kind {
            ContainerKind::Image if format.extension == MediaFormat::JPEG.extension => {
                if !bytes.starts_with(&JPEG_SOI) {
                    return Err(invalid(format, "missing JPEG start-of-image marker"));
                }
            }
            ContainerKind::Image => {}
            ContainerKind::Video if self.strict_video_header => {
                let iso_bmff = bytes.get(4..8) == Some(b"ftyp".as_slice());
                if !iso_bmff && !bytes.starts_with(&EBML_MAGIC) {
                    return Err(invalid(
                        format,
                        "no container header at the start of the stream",
                    ));
                }
            }
            ContainerKind::Video => {}
        }
        Ok(())
    }
}

fn invalid(format: &MediaFormat, reason: &str) -> RecoveryError {
    RecoveryError::InvalidFormat {
        format: format.extension.to_string(),
        reason: reason.to_string(),
    }
}
