//! Pass-through provider

use lsa_core::TransformStrategy;

use crate::{TransformError, TransformProvider};

/// Returns its input unchanged under either strategy.
///
/// Useful for containers that were already decoded elsewhere and for
/// exercising the rest of the pipeline without key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProvider;

impl TransformProvider for IdentityProvider {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn reverse(
        &self,
        data: &[u8],
        _strategy: TransformStrategy,
    ) -> Result<Vec<u8>, TransformError> {
        if data.is_empty() {
            return Err(TransformError::EmptyInput);
        }
        Ok(data.to_vec())
    }
}
