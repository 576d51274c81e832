//! RSA key transport (RSAES-PKCS1-v1_5) for the content-encryption key.

use cmskit_types::CryptoError;
use rand_core::CryptoRngCore;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

/// RSAES-PKCS1-v1_5 padding overhead in bytes (RFC 8017 section 7.2.1).
const PKCS1V15_OVERHEAD: usize = 11;

/// Build an RSA public key from big-endian modulus and exponent bytes.
pub fn public_key_from_parts(n: &[u8], e: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
        .map_err(|_| CryptoError::InvalidKey)
}

/// Wrap (encrypt) the content-encryption key under a recipient's public key.
///
/// Fails with `KeyTooSmall` when the modulus cannot hold the padded key
/// material, and `WrapFailure` on an underlying cipher error.
pub fn wrap_cek<R: CryptoRngCore>(
    rng: &mut R,
    recipient: &RsaPublicKey,
    cek: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let modulus = recipient.size();
    let need = cek.len() + PKCS1V15_OVERHEAD;
    if need > modulus {
        return Err(CryptoError::KeyTooSmall { modulus, need });
    }
    recipient
        .encrypt(rng, Pkcs1v15Encrypt, cek)
        .map_err(|_| CryptoError::WrapFailure)
}

/// Unwrap (decrypt) a wrapped content-encryption key.
///
/// The recovered key is held in a [`Zeroizing`] buffer so it is wiped
/// when dropped.
pub fn unwrap_cek(
    key: &RsaPrivateKey,
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    key.decrypt(Pkcs1v15Encrypt, wrapped)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::WrapFailure)
}
