use thiserror::Error;

use crate::types::Stage;

pub type LsaResult<T> = Result<T, LsaError>;

/// Process-level failures (startup, config, I/O)
#[derive(Debug, Error)]
pub enum LsaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a single recovery request was rejected.
///
/// Every variant is terminal: the transform is deterministic, so the same
/// input always yields the same rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("unsupported container kind: {extension:?} (expected .lsa or .lsav)")]
    UnsupportedKind { extension: String },

    #[error("transform failed: {0}")]
    TransformFailure(String),

    #[error("recovered data is not a valid {format}: {reason}")]
    InvalidFormat { format: String, reason: String },

    #[error("container is {size} bytes, limit is {limit}")]
    OversizeInput { size: usize, limit: usize },
}

impl RecoveryError {
    /// Stable, client-facing reason string
    pub fn reason(&self) -> &'static str {
        match self {
            RecoveryError::UnsupportedKind { .. } => "unsupported container kind",
            RecoveryError::TransformFailure(_) => "transform failed",
            RecoveryError::InvalidFormat { .. } => "recovered data failed structural validation",
            RecoveryError::OversizeInput { .. } => "container exceeds upload limit",
        }
    }

    /// The pipeline state from which the request was rejected
    pub fn stage(&self) -> Stage {
        match self {
            RecoveryError::UnsupportedKind { .. } | RecoveryError::OversizeInput { .. } => {
                Stage::Received
            }
            RecoveryError::TransformFailure(_) => Stage::KindSelected,
            RecoveryError::InvalidFormat { .. } => Stage::Classified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_are_stable() {
        let err = RecoveryError::UnsupportedKind {
            extension: "zip".into(),
        };
        assert_eq!(err.reason(), "unsupported container kind");
        assert_eq!(err.stage(), Stage::Received);

        let err = RecoveryError::TransformFailure("empty".into());
        assert_eq!(err.reason(), "transform failed");
        assert_eq!(err.stage(), Stage::KindSelected);

        let err = RecoveryError::InvalidFormat {
            format: "jpg".into(),
            reason: "missing SOI marker".into(),
        };
        assert_eq!(err.reason(), "recovered data failed structural validation");
        assert_eq!(err.stage(), Stage::Classified);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = RecoveryError::OversizeInput {
            size: 11,
            limit: 10,
        };
        assert_eq!(err.to_string(), "container is 11 bytes, limit is 10");
    }
}
