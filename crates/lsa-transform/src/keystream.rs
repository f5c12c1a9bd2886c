//! AES-128 counter-mode keystream provider
//!
//! Counter mode is its own inverse, so reversal is a keystream XOR starting
//! at counter block `iv`:
//! ```text
//! plain[i] = container[i] ^ AES_k(iv + i / 16)[i % 16]
//! ```
//! The header-only strategy stops after `header_window` bytes; the reversed
//! window is therefore byte-identical to the same prefix of a full reversal.

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use lsa_core::TransformStrategy;

use crate::key::{ContainerKey, CounterBlock};
use crate::{TransformError, TransformProvider};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

#[derive(Debug, Clone)]
pub struct KeystreamProvider {
    key: ContainerKey,
    iv: CounterBlock,
    header_window: usize,
}

impl KeystreamProvider {
    pub fn new(key: ContainerKey, iv: CounterBlock, header_window: usize) -> Self {
        Self {
            key,
            iv,
            header_window,
        }
    }

    fn apply(&self, buf: &mut [u8]) {
        let mut cipher = Aes128Ctr::new(self.key.as_bytes().into(), self.iv.as_bytes().into());
        cipher.apply_keystream(buf);
    }
}

impl TransformProvider for KeystreamProvider {
    fn name(&self) -> &'static str {
        "aes-ctr"
    }

    fn reverse(
        &self,
        data: &[u8],
        strategy: TransformStrategy,
    ) -> Result<Vec<u8>, TransformError> {
        if data.is_empty() {
            return Err(TransformError::EmptyInput);
        }

        let mut out = data.to_vec();
        let span = match strategy {
            TransformStrategy::Full => out.len(),
            TransformStrategy::HeaderOnly => self.header_window.min(out.len()),
        };
        self.apply(&mut out[..span]);

        tracing::trace!(
            %strategy,
            len = data.len(),
            reversed = span,
            "keystream applied"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // NIST SP 800-38A, F.5.1 CTR-AES128
    const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const NIST_IV: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";
    const NIST_PLAIN: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51";
    const NIST_CIPHER: &str = "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff";

    fn nist_provider(header_window: usize) -> KeystreamProvider {
        KeystreamProvider::new(
            ContainerKey::from_hex(NIST_KEY).unwrap(),
            CounterBlock::from_hex(NIST_IV).unwrap(),
            header_window,
        )
    }

    #[test]
    fn test_full_matches_known_answer() {
        let provider = nist_provider(1024);
        let cipher = hex::decode(NIST_CIPHER).unwrap();

        let plain = provider.reverse(&cipher, TransformStrategy::Full).unwrap();

        assert_eq!(hex::encode(plain), NIST_PLAIN);
    }

    #[test]
    fn test_header_only_leaves_tail_untouched() {
        let provider = nist_provider(16);
        let cipher = hex::decode(NIST_CIPHER).unwrap();

        let out = provider.reverse(&cipher, TransformStrategy::HeaderOnly).unwrap();

        let plain = hex::decode(NIST_PLAIN).unwrap();
        assert_eq!(&out[..16], &plain[..16], "first block reversed");
        assert_eq!(&out[16..], &cipher[16..], "second block passed through");
    }

    #[test]
    fn test_header_only_shorter_than_window() {
        let provider = nist_provider(4096);
        let cipher = hex::decode(NIST_CIPHER).unwrap();

        let header = provider.reverse(&cipher, TransformStrategy::HeaderOnly).unwrap();
        let full = provider.reverse(&cipher, TransformStrategy::Full).unwrap();

        assert_eq!(header, full);
    }

    #[test]
    fn test_empty_input_rejected() {
        let provider = nist_provider(16);
        for strategy in [TransformStrategy::Full, TransformStrategy::HeaderOnly] {
            assert_eq!(
                provider.reverse(b"", strategy),
                Err(TransformError::EmptyInput)
            );
        }
    }

    proptest! {
        #[test]
        fn reverse_is_deterministic(data in proptest::collection::vec(any::<u8>(), 1..=4096)) {
            let provider = nist_provider(1024);
            let a = provider.reverse(&data, TransformStrategy::Full).unwrap();
            let b = provider.reverse(&data, TransformStrategy::Full).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn header_only_is_prefix_of_full(
            data in proptest::collection::vec(any::<u8>(), 1..=4096),
            window in 0usize..=2048,
        ) {
            let provider = nist_provider(window);
            let full = provider.reverse(&data, TransformStrategy::Full).unwrap();
            let header = provider.reverse(&data, TransformStrategy::HeaderOnly).unwrap();

            let split = window.min(data.len());
            prop_assert_eq!(header.len(), data.len());
            prop_assert_eq!(&header[..split], &full[..split]);
            prop_assert_eq!(&header[split..], &data[split..]);
        }

        #[test]
        fn reverse_is_involution(data in proptest::collection::vec(any::<u8>(), 1..=2048)) {
            let provider = nist_provider(1024);
            let once = provider.reverse(&data, TransformStrategy::Full).unwrap();
            let twice = provider.reverse(&once, TransformStrategy::Full).unwrap();
            prop_assert_eq!(twice, data);
        }
    }
}
