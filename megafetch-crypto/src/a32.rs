//! Word-array and base64 conversions.
//!
//! The service encodes keys as arrays of big-endian 32-bit words and
//! transports binary fields as URL-safe base64 without padding.

use crate::error::CryptoResult;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// A 128-bit key as four big-endian words.
pub type Key128 = [u32; 4];

/// URL-safe engine that emits no padding and accepts padded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Serializes words to bytes, big-endian.
pub fn a32_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Parses bytes into big-endian words, zero-padding a trailing partial word.
pub fn bytes_to_a32(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .collect()
}

/// Encodes bytes as URL-safe base64 without `=` padding.
pub fn base64_url_encode(bytes: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decodes URL-safe base64.
///
/// Standard-alphabet characters, `=` padding and stray commas are tolerated
/// since links copied out of web pages sometimes carry them.
pub fn base64_url_decode(text: &str) -> CryptoResult<Vec<u8>> {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    Ok(URL_SAFE_LENIENT.decode(normalized)?)
}

pub fn a32_to_base64(words: &[u32]) -> String {
    base64_url_encode(&a32_to_bytes(words))
}

pub fn base64_to_a32(text: &str) -> CryptoResult<Vec<u32>> {
    Ok(bytes_to_a32(&base64_url_decode(text)?))
}

/// Generates a fresh random 128-bit key.
pub fn random_key() -> Key128 {
    rand::random()
}
