//! Ephemeral content-encryption key handling.

use cmskit_types::CryptoError;
use rand_core::CryptoRngCore;
use zeroize::Zeroize;

/// A content-encryption key (CEK).
///
/// Generated fresh for every message, never reused, never persisted.
/// Write-once: the bytes are fixed at generation time and zeroed when the
/// key is dropped, on success and failure paths alike.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct ContentEncryptionKey {
    bytes: Vec<u8>,
}

impl ContentEncryptionKey {
    /// Generate a fresh random key of `len` bytes from the supplied
    /// randomness source.
    pub fn generate<R: CryptoRngCore>(rng: &mut R, len: usize) -> Result<Self, CryptoError> {
        let mut bytes = vec![0u8; len];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|_| CryptoError::RngFailure)?;
        Ok(Self { bytes })
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ContentEncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentEncryptionKey")
            .field("len", &self.bytes.len())
            .finish()
    }
}
