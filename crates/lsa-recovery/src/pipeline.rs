//! Recovery orchestrator
//!
//! ```text
//! Received ─► KindSelected ─► Transformed ─► Classified ─► Validated ─► Delivered
//!    │             │               │              │             │
//!    └─────────────┴───────────────┴──────────────┴─────────────┴──► Rejected
//! ```
//!
//! The pipeline is synchronous, holds no state between requests, and is
//! all-or-nothing: either a complete [`RecoveredArtifact`] or a
//! [`RecoveryError`] comes back.

use std::sync::Arc;

use lsa_core::config::LsaConfig;
use lsa_core::{Container, ContainerKind, MediaFormat, RecoveredArtifact, RecoveryError, Stage};
use lsa_transform::{TransformError, TransformProvider};
use tracing::{debug, info, info_span, warn};

use crate::sniff::Sniffer;
use crate::validate::ValidationPolicy;

#[derive(Clone)]
pub struct Recoverer {
    provider: Arc<dyn TransformProvider>,
    sniffer: Sniffer,
    policy: ValidationPolicy,
}

impl std::fmt::Debug for Recoverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recoverer")
            .field("provider", &self.provider.name())
            .field("sniffer", &self.sniffer)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Recoverer {
    pub fn new(
        provider: Arc<dyn TransformProvider>,
        sniffer: Sniffer,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            provider,
            sniffer,
            policy,
        }
    }

    /// Build a recoverer from config, constructing the configured provider.
    pub fn from_config(config: &LsaConfig) -> Result<Self, TransformError> {
        let provider = lsa_transform::build_provider(&config.transform)?;
        Ok(Self::with_provider(provider, config))
    }

    /// Build a recoverer around an already-constructed provider.
    pub fn with_provider(provider: Arc<dyn TransformProvider>, config: &LsaConfig) -> Self {
        Self::new(
            provider,
            Sniffer::new(config.recovery.sniff_window),
            ValidationPolicy::from_config(&config.recovery),
        )
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Recover the media inside `bytes`, uploaded under `filename`.
    pub fn recover(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<RecoveredArtifact, RecoveryError> {
        let span = info_span!("recover", filename = %filename, len = bytes.len());
        let _enter = span.enter();

        let result = self.run(filename, bytes);
        match &result {
            Ok(artifact) => info!(
                output = %artifact.filename,
                mime = artifact.format.mime,
                digest = %artifact.digest,
                "recovered"
            ),
            Err(e) => warn!(stage = %e.stage(), reason = e.reason(), "rejected: {e}"),
        }
        result
    }

    fn run(&self, filename: &str, bytes: Vec<u8>) -> Result<RecoveredArtifact, RecoveryError> {
        // Received → KindSelected
        let container = Container::new(filename, bytes)?;
        let strategy = container.kind.strategy();
        debug!(
            stage = %Stage::KindSelected,
            kind = %container.kind,
            %strategy,
            "kind selected"
        );

        // KindSelected → Transformed
        let recovered = self
            .provider
            .reverse(&container.bytes, strategy)
            .map_err(|e| RecoveryError::TransformFailure(e.to_string()))?;
        debug!(
            stage = %Stage::Transformed,
            provider = self.provider.name(),
            len = recovered.len(),
            "transformed"
        );

        // Transformed → Classified
        let sniffed = self.sniffer.classify(&recovered);
        let format = match container.kind {
            ContainerKind::Video => MediaFormat::MP4,
            ContainerKind::Image => sniffed.unwrap_or(MediaFormat::UNKNOWN),
        };
        debug!(
            stage = %Stage::Classified,
            sniffed = sniffed.map(|f| f.extension).unwrap_or("unknown"),
            assigned = format.extension,
            "classified"
        );

        // Classified → Validated
        self.policy.validate(container.kind, &format, &recovered)?;
        debug!(stage = %Stage::Validated, "validated");

        // Validated → Delivered
        let filename = container.output_filename(&format);
        let digest = blake3::hash(&recovered).to_hex().to_string();
        debug!(stage = %Stage::Delivered, output = %filename, "delivered");

        Ok(RecoveredArtifact {
            bytes: recovered,
            format,
            filename,
            digest,
        })
    }
}
