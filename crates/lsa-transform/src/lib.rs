//! lsa-transform: reversal of hidden-gallery container bytes
//!
//! A [`TransformProvider`] turns container bytes back into media bytes under
//! one of two strategies:
//!
//! ```text
//! Full        [################################]  every byte reversed
//! HeaderOnly  [########|........................]  leading window reversed,
//!              window    passed through verbatim   remainder copied
//! ```
//!
//! The format's key material is not part of this crate. [`KeystreamProvider`]
//! applies an AES-128 counter-mode keystream with key and counter block taken
//! from configuration; [`IdentityProvider`] passes bytes through unchanged.

pub mod identity;
pub mod key;
pub mod keystream;

pub use identity::IdentityProvider;
pub use key::{ContainerKey, CounterBlock};
pub use keystream::KeystreamProvider;

use std::sync::Arc;

use lsa_core::config::{ProviderKind, TransformConfig};
use lsa_core::TransformStrategy;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Size of an AES-128 key in bytes
pub const KEY_SIZE: usize = 16;

/// Size of an AES block (and of the initial counter block)
pub const BLOCK_SIZE: usize = 16;

/// Environment override for `transform.key`
pub const KEY_ENV: &str = "LSA_TRANSFORM_KEY";

/// Environment override for `transform.iv`
pub const IV_ENV: &str = "LSA_TRANSFORM_IV";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("input is empty")]
    EmptyInput,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Reverses container bytes.
///
/// Implementations must be deterministic and must not inspect the structure
/// of what they produce. The only input they reject is an empty one.
pub trait TransformProvider: Send + Sync {
    /// Short name for logs and metrics
    fn name(&self) -> &'static str;

    fn reverse(
        &self,
        data: &[u8],
        strategy: TransformStrategy,
    ) -> Result<Vec<u8>, TransformError>;
}

/// Build the provider named by `config`.
///
/// Key material comes from `LSA_TRANSFORM_KEY` / `LSA_TRANSFORM_IV` when set,
/// otherwise from the config file. Missing material is an error here, at
/// startup, rather than on the first request.
pub fn build_provider(
    config: &TransformConfig,
) -> Result<Arc<dyn TransformProvider>, TransformError> {
    match config.provider {
        ProviderKind::Identity => {
            tracing::warn!("transform provider is identity: containers are returned as uploaded");
            Ok(Arc::new(IdentityProvider))
        }
        ProviderKind::AesCtr => {
            let key_hex = secret_from_env_or(KEY_ENV, config.key.as_deref()).ok_or_else(|| {
                TransformError::InvalidKey(format!("no key: set transform.key or {KEY_ENV}"))
            })?;
            let iv_hex = secret_from_env_or(IV_ENV, config.iv.as_deref()).ok_or_else(|| {
                TransformError::InvalidKey(format!("no iv: set transform.iv or {IV_ENV}"))
            })?;

            let key = ContainerKey::from_hex(key_hex.expose_secret())?;
            let iv = CounterBlock::from_hex(iv_hex.expose_secret())?;

            tracing::info!(
                provider = "aes-ctr",
                header_window = config.header_window,
                "transform provider ready"
            );
            Ok(Arc::new(KeystreamProvider::new(key, iv, config.header_window)))
        }
    }
}

fn secret_from_env_or(var: &str, fallback: Option<&str>) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.map(str::to_owned))
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_identity() {
        let config = TransformConfig {
            provider: ProviderKind::Identity,
            ..TransformConfig::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "identity");
    }

    #[test]
    fn test_build_keystream_from_config() {
        let config = TransformConfig {
            provider: ProviderKind::AesCtr,
            key: Some("2b7e151628aed2a6abf7158809cf4f3c".into()),
            iv: Some("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff".into()),
            header_window: 64,
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "aes-ctr");
    }

    #[test]
    fn test_build_keystream_without_key_fails_at_startup() {
        if std::env::var_os(KEY_ENV).is_some() {
            return;
        }
        let config = TransformConfig {
            provider: ProviderKind::AesCtr,
            key: None,
            iv: Some("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff".into()),
            header_window: 64,
        };
        match build_provider(&config) {
            Err(TransformError::InvalidKey(msg)) => assert!(msg.contains(KEY_ENV), "{msg}"),
            Err(e) => panic!("expected InvalidKey, got {e}"),
            Ok(p) => panic!("expected InvalidKey, got provider {}", p.name()),
        }
    }

    #[test]
    fn test_build_keystream_without_iv_fails_at_startup() {
        if std::env::var_os(IV_ENV).is_some() {
            return;
        }
        let config = TransformConfig {
            provider: ProviderKind::AesCtr,
            key: Some("2b7e151628aed2a6abf7158809cf4f3c".into()),
            iv: None,
            header_window: 64,
        };
        match build_provider(&config) {
            Err(TransformError::InvalidKey(msg)) => assert!(msg.contains(IV_ENV), "{msg}"),
            Err(e) => panic!("expected InvalidKey, got {e}"),
            Ok(p) => panic!("expected InvalidKey, got provider {}", p.name()),
        }
    }

    #[test]
    fn test_env_overrides_config_value() {
        let var = "LSA_TEST_SECRET_ENV_OVERRIDES_CONFIG";
        std::env::set_var(var, "from-env");
        let secret = secret_from_env_or(var, Some("from-config")).unwrap();
        std::env::remove_var(var);

        assert_eq!(secret.expose_secret(), "from-env");
    }

    #[test]
    fn test_config_value_used_when_env_unset_or_blank() {
        let var = "LSA_TEST_SECRET_ENV_BLANK";
        std::env::remove_var(var);
        let secret = secret_from_env_or(var, Some("from-config")).unwrap();
        assert_eq!(secret.expose_secret(), "from-config");

        std::env::set_var(var, "   ");
        let secret = secret_from_env_or(var, Some("from-config")).unwrap();
        std::env::remove_var(var);
        assert_eq!(secret.expose_secret(), "from-config");
    }

    #[test]
    fn test_no_env_and_no_config_is_none() {
        let var = "LSA_TEST_SECRET_ENV_ABSENT";
        std::env::remove_var(var);
        assert!(secret_from_env_or(var, None).is_none());
    }

    #[test]
    fn test_build_keystream_rejects_bad_hex() {
        let config = TransformConfig {
            provider: ProviderKind::AesCtr,
            key: Some("not-hex".into()),
            iv: Some("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff".into()),
            header_window: 64,
        };
        assert!(matches!(
            build_provider(&config),
            Err(TransformError::InvalidKey(_))
        ));
    }
}
