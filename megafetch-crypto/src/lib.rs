//! Cryptographic primitives for megafetch.
//!
//! Reproduces the storage service's key handling and content protection:
//! - 32-bit word arrays ("a32") and URL-safe unpadded base64
//! - AES-128 key wrap/unwrap (ECB over 16-byte blocks, no IV)
//! - MPI integers and the raw RSA decryption used by session login
//! - File keys, encrypted node attributes, and the chunk schedule
//! - AES-CTR content decryption and the chained CBC-MAC integrity check
//!
//! # Architecture
//!
//! Every key on the wire is an array of big-endian `u32` words:
//!
//! 1. **Master Key**: 4 words held by the session. It wraps the RSA
//!    private key and authenticates temporary session ids.
//!
//! 2. **File Key**: 8 words taken from a public link. It folds into the
//!    content key, the CTR nonce and the expected MAC.
//!
//! Nothing in this crate performs I/O; the client crate drives the
//! primitives over network streams.

mod a32;
mod attributes;
pub mod chunk;
mod error;
mod file_key;
pub mod mac;
pub mod mpi;
pub mod rsa;
mod wrap;

pub use a32::{
    a32_to_base64, a32_to_bytes, base64_to_a32, base64_url_decode, base64_url_encode,
    bytes_to_a32, random_key, Key128,
};
pub use attributes::{decrypt_attributes, encrypt_attributes, FileAttributes};
pub use chunk::{Chunk, ChunkPlan, CHUNK_MAX, CHUNK_STEP};
pub use error::{CryptoError, CryptoResult};
pub use file_key::{ContentCipher, FileKey, FILE_KEY_WORDS};
pub use mac::ChunkMac;
pub use mpi::{decode_mpi, encode_mpi};
pub use rsa::RsaPrivateKey;
pub use wrap::{unwrap_key, wrap_key};
