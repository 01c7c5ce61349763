//! Per-file key material and the CTR content cipher.

use crate::a32::{a32_to_base64, a32_to_bytes, base64_to_a32, Key128};
use crate::error::{CryptoError, CryptoResult};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of words in a file key.
pub const FILE_KEY_WORDS: usize = 8;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// The 8-word key carried in a public link.
///
/// Content key, nonce and expected MAC are all pure functions of these
/// words; the words themselves never change after parsing.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct FileKey([u32; FILE_KEY_WORDS]);

impl FileKey {
    pub fn from_words(words: [u32; FILE_KEY_WORDS]) -> Self {
        Self(words)
    }

    /// Decodes the base64 key text of a link.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        let words = base64_to_a32(text)?;
        let words: [u32; FILE_KEY_WORDS] =
            words
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: FILE_KEY_WORDS,
                    actual: words.len(),
                })?;
        Ok(Self(words))
    }

    /// Builds the key that derives back to the given parts.
    pub fn compose(content_key: Key128, nonce: [u32; 2], meta_mac: [u32; 2]) -> Self {
        let tail = [nonce[0], nonce[1], meta_mac[0], meta_mac[1]];
        let mut words = [0u32; FILE_KEY_WORDS];
        for i in 0..4 {
            words[i] = content_key[i] ^ tail[i];
            words[i + 4] = tail[i];
        }
        Self(words)
    }

    pub fn words(&self) -> &[u32; FILE_KEY_WORDS] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        a32_to_base64(&self.0)
    }

    /// `k`: the first half XOR the second half.
    pub fn content_key(&self) -> Key128 {
        let w = &self.0;
        [w[0] ^ w[4], w[1] ^ w[5], w[2] ^ w[6], w[3] ^ w[7]]
    }

    /// `(w4, w5, 0, 0)`.
    pub fn iv(&self) -> Key128 {
        [self.0[4], self.0[5], 0, 0]
    }

    pub fn meta_mac(&self) -> [u32; 2] {
        [self.0[6], self.0[7]]
    }
}

impl fmt::Debug for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileKey(<redacted>)")
    }
}

/// AES-128-CTR keystream over a whole file.
///
/// The counter starts at `iv[0] || iv[1] || 0u64` and runs continuously
/// across chunks, so one instance must see every chunk in file order.
pub struct ContentCipher {
    inner: Aes128Ctr,
}

impl ContentCipher {
    pub fn new(content_key: &Key128, iv: &Key128) -> Self {
        let key = a32_to_bytes(content_key);
        let counter = a32_to_bytes(&[iv[0], iv[1], 0, 0]);
        Self {
            inner: Aes128Ctr::new(
                GenericArray::from_slice(&key),
                GenericArray::from_slice(&counter),
            ),
        }
    }

    pub fn for_file(key: &FileKey) -> Self {
        Self::new(&key.content_key(), &key.iv())
    }

    /// Decrypts (or encrypts) `buf` in place, advancing the keystream.
    pub fn apply(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
    }
}
