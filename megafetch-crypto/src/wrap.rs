//! AES-128 key wrapping.
//!
//! Each 4-word block is encrypted independently under the wrapping key
//! (no chaining, no IV). Wrapped RSA keys span many blocks; session keys
//! are a single block.

use crate::a32::{a32_to_bytes, bytes_to_a32, Key128};
use crate::error::{CryptoError, CryptoResult};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

pub(crate) fn cipher_for(key: &Key128) -> Aes128 {
    Aes128::new(GenericArray::from_slice(&a32_to_bytes(key)))
}

fn check_blocks(words: &[u32]) -> CryptoResult<()> {
    if words.is_empty() || words.len() % 4 != 0 {
        return Err(CryptoError::InvalidKeyLength {
            expected: words.len().div_ceil(4).max(1) * 4,
            actual: words.len(),
        });
    }
    Ok(())
}

/// Encrypts `key` under `wrapping_key`.
pub fn wrap_key(key: &[u32], wrapping_key: &Key128) -> CryptoResult<Vec<u32>> {
    check_blocks(key)?;
    let cipher = cipher_for(wrapping_key);
    let mut bytes = a32_to_bytes(key);
    for block in bytes.chunks_exact_mut(16) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(bytes_to_a32(&bytes))
}

/// Decrypts a key previously produced by [`wrap_key`].
pub fn unwrap_key(wrapped: &[u32], wrapping_key: &Key128) -> CryptoResult<Vec<u32>> {
    check_blocks(wrapped)?;
    let cipher = cipher_for(wrapping_key);
    let mut bytes = a32_to_bytes(wrapped);
    for block in bytes.chunks_exact_mut(16) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(bytes_to_a32(&bytes))
}
