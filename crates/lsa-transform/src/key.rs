//! Key material for the keystream provider

use zeroize::Zeroize;

use crate::{TransformError, BLOCK_SIZE, KEY_SIZE};

/// A 128-bit container key. Zeroized on drop.
#[derive(Clone)]
pub struct ContainerKey {
    bytes: [u8; KEY_SIZE],
}

impl ContainerKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransformError> {
        Ok(Self::from_bytes(decode_fixed("key", hex_str)?))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContainerKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContainerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Initial counter block for AES-CTR. Zeroized on drop.
#[derive(Clone)]
pub struct CounterBlock {
    bytes: [u8; BLOCK_SIZE],
}

impl CounterBlock {
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransformError> {
        Ok(Self::from_bytes(decode_fixed("iv", hex_str)?))
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }
}

impl Drop for CounterBlock {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for CounterBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterBlock")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Decode exactly 16 bytes of hex, tolerating surrounding whitespace.
fn decode_fixed(what: &str, hex_str: &str) -> Result<[u8; 16], TransformError> {
    let mut raw = hex::decode(hex_str.trim())
        .map_err(|e| TransformError::InvalidKey(format!("{what} is not valid hex: {e}")))?;
    if raw.len() != 16 {
        let len = raw.len();
        raw.zeroize();
        return Err(TransformError::InvalidKey(format!(
            "{what} must be 16 bytes, got {len}"
        )));
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&raw);
    raw.zeroize();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_hex() {
        let key = ContainerKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(key.as_bytes()[15], 0x0f);
    }

    #[test]
    fn test_key_from_hex_trims_whitespace() {
        let key = ContainerKey::from_hex("  000102030405060708090A0B0C0D0E0F\n").unwrap();
        assert_eq!(key.as_bytes()[10], 0x0a);
    }

    #[test]
    fn test_key_wrong_length() {
        let err = ContainerKey::from_hex("0001").unwrap_err();
        assert_eq!(
            err,
            TransformError::InvalidKey("key must be 16 bytes, got 2".into())
        );
    }

    #[test]
    fn test_iv_not_hex() {
        assert!(CounterBlock::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let key = ContainerKey::from_bytes([0x42; KEY_SIZE]);
        let shown = format!("{key:?}");
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("66"));
    }
}
