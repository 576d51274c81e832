//! CBC (Cipher Block Chaining) mode with PKCS#7 padding.
//!
//! Content encryption for EnvelopedData: the plaintext is padded to the
//! AES block size and chained through the block cipher. Padding is always
//! applied, so the ciphertext is the plaintext length rounded up to the
//! next block boundary (a full extra block when already aligned).

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use cmskit_types::CryptoError;
use subtle::ConstantTimeEq;

/// AES block size in bytes (128 bits).
pub const BLOCK_SIZE: usize = 16;

enum BlockCipher {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl BlockCipher {
    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 => Aes128::new_from_slice(key)
                .map(BlockCipher::Aes128)
                .map_err(|_| CryptoError::EncryptionFailure),
            32 => Aes256::new_from_slice(key)
                .map(BlockCipher::Aes256)
                .map_err(|_| CryptoError::EncryptionFailure),
            got => Err(CryptoError::InvalidKeyLength { got }),
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            BlockCipher::Aes128(c) => c.encrypt_block(block),
            BlockCipher::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            BlockCipher::Aes128(c) => c.decrypt_block(block),
            BlockCipher::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// Encrypt data using CBC mode with AES and PKCS#7 padding.
pub fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != BLOCK_SIZE {
        return Err(CryptoError::InvalidIvLength);
    }
    let cipher = BlockCipher::new(key)?;

    // PKCS#7 padding
    let pad_len = BLOCK_SIZE - (plaintext.len() % BLOCK_SIZE);
    let mut data = plaintext.to_vec();
    data.extend(std::iter::repeat(pad_len as u8).take(pad_len));

    let mut prev = [0u8; BLOCK_SIZE];
    prev.copy_from_slice(iv);

    for chunk in data.chunks_mut(BLOCK_SIZE) {
        for i in 0..BLOCK_SIZE {
            chunk[i] ^= prev[i];
        }
        cipher.encrypt_block(chunk);
        prev.copy_from_slice(chunk);
    }
    Ok(data)
}

/// Decrypt data using CBC mode with AES and remove PKCS#7 padding.
pub fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != BLOCK_SIZE {
        return Err(CryptoError::InvalidIvLength);
    }
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidPadding);
    }
    let cipher = BlockCipher::new(key)?;

    let mut output = ciphertext.to_vec();
    let mut prev = [0u8; BLOCK_SIZE];
    prev.copy_from_slice(iv);

    for chunk in output.chunks_mut(BLOCK_SIZE) {
        let mut ct_copy = [0u8; BLOCK_SIZE];
        ct_copy.copy_from_slice(chunk);
        cipher.decrypt_block(chunk);
        for i in 0..BLOCK_SIZE {
            chunk[i] ^= prev[i];
        }
        prev = ct_copy;
    }

    // PKCS#7 unpad (constant-time check)
    let pad_val = *output.last().ok_or(CryptoError::InvalidPadding)? as usize;
    if pad_val == 0 || pad_val > BLOCK_SIZE {
        return Err(CryptoError::InvalidPadding);
    }
    let pad_byte = pad_val as u8;
    let mut valid = 1u8;
    for &b in &output[output.len() - pad_val..] {
        valid &= b.ct_eq(&pad_byte).unwrap_u8();
    }
    if valid != 1 {
        return Err(CryptoError::InvalidPadding);
    }
    output.truncate(output.len() - pad_val);
    Ok(output)
}
