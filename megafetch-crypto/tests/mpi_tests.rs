use megafetch_crypto::{decode_mpi, encode_mpi, CryptoError};
use num_bigint::BigUint;
use pretty_assertions::assert_eq;

#[test]
fn consecutive_mpis_decode_in_sequence() {
    let values = [BigUint::from(3u32), BigUint::from(0xFFFF_FFFFu32), BigUint::from(1u32) << 100];
    let mut bytes = Vec::new();
    for v in &values {
        bytes.extend(encode_mpi(v).unwrap());
    }

    let mut rest = bytes.as_slice();
    for v in &values {
        let (decoded, consumed) = decode_mpi(rest).unwrap();
        assert_eq!(&decoded, v);
        rest = &rest[consumed..];
    }
    assert!(rest.is_empty());
}

#[test]
fn header_counts_bits_not_bytes() {
    // 2^100 needs 101 bits -> 13 payload bytes
    let encoded = encode_mpi(&(BigUint::from(1u32) << 100)).unwrap();
    assert_eq!(&encoded[..2], &[0x00, 101]);
    assert_eq!(encoded.len(), 15);
}

#[test]
fn truncated_payload_is_an_error() {
    let mut encoded = encode_mpi(&BigUint::from(0x0102_0304u32)).unwrap();
    encoded.pop();
    assert!(matches!(decode_mpi(&encoded), Err(CryptoError::Mpi(_))));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            let value = BigUint::from_bytes_be(&bytes);
            let encoded = encode_mpi(&value).unwrap();
            let (decoded, consumed) = decode_mpi(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
        }
    }
}
