//! Multi-precision integers as used in wrapped RSA keys.
//!
//! Layout: a 2-byte big-endian bit length followed by
//! `ceil(bits / 8)` bytes of big-endian magnitude.

use crate::error::{CryptoError, CryptoResult};
use num_bigint::BigUint;

const HEADER_LEN: usize = 2;

/// Decodes one MPI from the front of `bytes`.
///
/// Returns the integer and the number of bytes consumed, header included.
/// A declared length that runs past the end of the buffer is rejected.
pub fn decode_mpi(bytes: &[u8]) -> CryptoResult<(BigUint, usize)> {
    if bytes.len() < HEADER_LEN {
        return Err(CryptoError::Mpi(format!(
            "need {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }
    let bits = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let consumed = bits.div_ceil(8) + HEADER_LEN;
    if consumed > bytes.len() {
        return Err(CryptoError::Mpi(format!(
            "declared {bits} bits needs {consumed} bytes, only {} available",
            bytes.len()
        )));
    }
    Ok((BigUint::from_bytes_be(&bytes[HEADER_LEN..consumed]), consumed))
}

/// Encodes an integer as an MPI.
pub fn encode_mpi(value: &BigUint) -> CryptoResult<Vec<u8>> {
    let bits = value.bits();
    let header = u16::try_from(bits)
        .map_err(|_| CryptoError::Mpi(format!("{bits} bits exceeds the 16-bit length header")))?;

    let mut out = header.to_be_bytes().to_vec();
    if bits > 0 {
        out.extend_from_slice(&value.to_bytes_be());
    }
    Ok(out)
}
