//! lsa-core: shared vocabulary for the hidden-gallery container recovery service
//!
//! - `types`: container kinds, transform strategies, media formats, recovered artifacts
//! - `error`: the rejection taxonomy surfaced to callers, plus process-level errors
//! - `config`: `lsa.toml` schema with defaults for every field

pub mod config;
pub mod error;
pub mod types;

pub use error::{LsaError, LsaResult, RecoveryError};
pub use types::{
    Container, ContainerKind, MediaFormat, RecoveredArtifact, Stage, TransformStrategy,
};
