//! Raw RSA private key recovered from the login response.
//!
//! The wrapped key is four consecutive MPIs: `p`, `q`, `d` and a CRT
//! coefficient that this client never needs. Decryption is textbook
//! modular exponentiation with no padding scheme.

use crate::error::{CryptoError, CryptoResult};
use crate::mpi::decode_mpi;
use num_bigint::BigUint;

const KEY_COMPONENTS: usize = 4;

/// RSA private key reconstructed from its MPI encoding.
#[derive(Clone, Debug)]
pub struct RsaPrivateKey {
    p: BigUint,
    q: BigUint,
    d: BigUint,
    n: BigUint,
    e: BigUint,
}

impl RsaPrivateKey {
    /// Parses four back-to-back MPIs, ignoring any trailing block padding.
    pub fn from_mpi_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let mut components = Vec::with_capacity(KEY_COMPONENTS);
        let mut rest = bytes;
        for _ in 0..KEY_COMPONENTS {
            let (value, consumed) = decode_mpi(rest)?;
            components.push(value);
            rest = &rest[consumed..];
        }
        let mut components = components.into_iter();
        let (Some(p), Some(q), Some(d)) = (components.next(), components.next(), components.next())
        else {
            return Err(CryptoError::Rsa("missing key component".to_string()));
        };
        Self::from_components(p, q, d)
    }

    /// Builds the key from its prime factors and private exponent.
    pub fn from_components(p: BigUint, q: BigUint, d: BigUint) -> CryptoResult<Self> {
        let one = BigUint::from(1u32);
        if p <= one || q <= one {
            return Err(CryptoError::Rsa("prime factors must exceed 1".to_string()));
        }
        let n = &p * &q;
        let phi = (&p - &one) * (&q - &one);
        let e = d
            .modinv(&phi)
            .ok_or_else(|| CryptoError::Rsa("private exponent has no inverse mod phi".to_string()))?;
        Ok(Self { p, q, d, n, e })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn public_exponent(&self) -> &BigUint {
        &self.e
    }

    pub fn factors(&self) -> (&BigUint, &BigUint) {
        (&self.p, &self.q)
    }

    /// Computes `ciphertext^d mod n`.
    pub fn decrypt_raw(&self, ciphertext: &BigUint) -> CryptoResult<BigUint> {
        if ciphertext >= &self.n {
            return Err(CryptoError::Rsa("ciphertext is not smaller than the modulus".to_string()));
        }
        Ok(ciphertext.modpow(&self.d, &self.n))
    }
}
