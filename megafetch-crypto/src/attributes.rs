//! Encrypted node attributes.
//!
//! The `at` field is `"MEGA" + JSON`, NUL-padded to a 16-byte boundary and
//! encrypted with AES-128-CBC under the content key and a zero IV.

use crate::a32::{a32_to_bytes, Key128};
use crate::error::{CryptoError, CryptoResult};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use serde::{Deserialize, Serialize};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const MAGIC: &[u8] = b"MEGA";
const ZERO_IV: [u8; 16] = [0u8; 16];

/// Decrypted node attributes. Only the name is interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    #[serde(rename = "n")]
    pub name: String,
}

impl FileAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Decrypts an attribute blob (already base64-decoded).
pub fn decrypt_attributes(blob: &[u8], content_key: &Key128) -> CryptoResult<FileAttributes> {
    if blob.is_empty() || blob.len() % 16 != 0 {
        return Err(CryptoError::Attributes(format!(
            "blob length {} is not a positive multiple of 16",
            blob.len()
        )));
    }

    let key = a32_to_bytes(content_key);
    let mut cipher = Aes128CbcDec::new(GenericArray::from_slice(&key), GenericArray::from_slice(&ZERO_IV));
    let mut plain = blob.to_vec();
    for block in plain.chunks_exact_mut(16) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }

    let end = plain.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let body = plain[..end]
        .strip_prefix(MAGIC)
        .ok_or_else(|| CryptoError::Attributes("missing MEGA prefix (wrong key?)".to_string()))?;
    Ok(serde_json::from_slice(body)?)
}

/// Encrypts attributes into a blob ready for base64 encoding.
pub fn encrypt_attributes(attributes: &FileAttributes, content_key: &Key128) -> CryptoResult<Vec<u8>> {
    let mut plain = MAGIC.to_vec();
    plain.extend(serde_json::to_vec(attributes)?);
    plain.resize(plain.len().div_ceil(16) * 16, 0);

    let key = a32_to_bytes(content_key);
    let mut cipher = Aes128CbcEnc::new(GenericArray::from_slice(&key), GenericArray::from_slice(&ZERO_IV));
    for block in plain.chunks_exact_mut(16) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    Ok(plain)
}
