//! Chained CBC-MAC over decrypted file content.
//!
//! Two stages:
//! - **inner**: a fresh AES-CBC pass per chunk, IV `(iv0, iv1, iv0, iv1)`,
//!   over the chunk's plaintext with the final partial block zero-padded.
//! - **outer**: a single AES-CBC pass with a zero IV spanning the whole
//!   file, fed the last inner block of every chunk. It is never reset.
//!
//! The outer stage's latest output block condenses to the 2-word file MAC
//! `(m0 ^ m1, m2 ^ m3)`.

use crate::a32::{a32_to_bytes, bytes_to_a32, Key128};
use crate::file_key::FileKey;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Block};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

const BLOCK: usize = 16;

/// Running integrity state for one download.
pub struct ChunkMac {
    key: [u8; BLOCK],
    chunk_iv: [u8; BLOCK],
    outer: Aes128CbcEnc,
    accumulator: [u8; BLOCK],
}

impl ChunkMac {
    pub fn new(content_key: &Key128, iv: &Key128) -> Self {
        let mut key = [0u8; BLOCK];
        key.copy_from_slice(&a32_to_bytes(content_key));
        let mut chunk_iv = [0u8; BLOCK];
        chunk_iv.copy_from_slice(&a32_to_bytes(&[iv[0], iv[1], iv[0], iv[1]]));

        let outer = Aes128CbcEnc::new(
            GenericArray::from_slice(&key),
            GenericArray::from_slice(&[0u8; BLOCK]),
        );
        Self {
            key,
            chunk_iv,
            outer,
            accumulator: [0u8; BLOCK],
        }
    }

    pub fn for_file(key: &FileKey) -> Self {
        Self::new(&key.content_key(), &key.iv())
    }

    /// Folds one scheduled chunk of plaintext into the MAC.
    ///
    /// Chunk boundaries matter: the inner stage restarts on every call.
    /// An empty slice leaves the state untouched.
    pub fn update(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        let mut inner = Aes128CbcEnc::new(
            GenericArray::from_slice(&self.key),
            GenericArray::from_slice(&self.chunk_iv),
        );
        let mut last = Block::default();
        for piece in chunk.chunks(BLOCK) {
            let mut block = Block::default();
            block[..piece.len()].copy_from_slice(piece);
            inner.encrypt_block_mut(&mut block);
            last = block;
        }

        self.outer.encrypt_block_mut(&mut last);
        self.accumulator.copy_from_slice(&last);
    }

    /// The outer stage's most recent output block.
    pub fn accumulator(&self) -> [u8; BLOCK] {
        self.accumulator
    }

    /// Condenses the accumulator to `(m0 ^ m1, m2 ^ m3)`.
    pub fn condensed(&self) -> [u32; 2] {
        let m = bytes_to_a32(&self.accumulator);
        [m[0] ^ m[1], m[2] ^ m[3]]
    }

    /// Compares the condensed MAC with the value carried in the file key.
    pub fn verify(&self, meta_mac: &[u32; 2]) -> bool {
        &self.condensed() == meta_mac
    }
}
