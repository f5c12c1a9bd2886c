use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LsaError, LsaResult};

/// Top-level service configuration (loaded from lsa.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LsaConfig {
    pub server: ServerConfig,
    pub transform: TransformConfig,
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address (default: 0.0.0.0:8000)
    pub listen: String,
    /// Largest accepted container in bytes (default: 10 MiB)
    pub max_upload_bytes: usize,
    /// CORS origins; `"*"` allows any origin
    pub allowed_origins: Vec<String>,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Pass bytes through unchanged
    Identity,
    /// AES-128 keystream (CTR mode) with configured key material
    AesCtr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub provider: ProviderKind,
    /// 16-byte key as hex (overridden by LSA_TRANSFORM_KEY)
    pub key: Option<String>,
    /// 16-byte initial counter block as hex (overridden by LSA_TRANSFORM_IV)
    pub iv: Option<String>,
    /// Bytes reversed by the header-only strategy (default: 1024)
    pub header_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Prefix inspected by the format sniffer (default: 4096)
    pub sniff_window: usize,
    /// Require a container header at a fixed offset for video output
    pub strict_video_header: bool,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_HEADER_WINDOW: usize = 1024;
pub const DEFAULT_SNIFF_WINDOW: usize = 4096;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: vec!["*".into()],
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::AesCtr,
            key: None,
            iv: None,
            header_window: DEFAULT_HEADER_WINDOW,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            sniff_window: DEFAULT_SNIFF_WINDOW,
            strict_video_header: false,
        }
    }
}

impl LsaConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> LsaResult<Self> {
        toml::from_str(content).map_err(|e| LsaError::Config(e.to_string()))
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> LsaResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| LsaError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Copy safe to print: key material replaced with a marker
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let redact = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some("[REDACTED]".into());
            }
        };
        redact(&mut copy.transform.key);
        redact(&mut copy.transform.iv);
        copy
    }
}
