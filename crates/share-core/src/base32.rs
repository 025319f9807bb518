//! RFC 4648 base32 without padding, used for TTH values and SUDP keys.

use data_encoding::{Encoding, Specification};

fn spec() -> Encoding {
    let mut spec = Specification::new();
    spec.symbols.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");
    spec.encoding().expect("static base32 spec is valid")
}

/// Encode bytes into an unpadded base32 string (uppercase).
pub fn encode(bytes: &[u8]) -> String {
    spec().encode(bytes)
}

/// Decode an unpadded base32 string back into bytes.
///
/// Accepts both upper and lower case input, matching how hub software
/// tends to pass TTHs and keys around.
pub fn decode(text: &str) -> Result<Vec<u8>, crate::error::ShareError> {
    spec()
        .decode(text.to_ascii_uppercase().as_bytes())
        .map_err(|e| crate::error::ShareError::malformed(format!("invalid base32: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_24_bytes() {
        let bytes: [u8; 24] = [
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        ];
        let encoded = encode(&bytes);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decodes_known_sudp_key_vector() {
        let decoded = decode("DR6AOECCMYK5DQ2VDATONKFSWU").unwrap();
        assert_eq!(decoded.len(), 16);
        assert_eq!(
            decoded,
            vec![
                0x1c, 0x7c, 0x07, 0x10, 0x42, 0x66, 0x15, 0xd1, 0xc3, 0x55, 0x18, 0x26, 0xe6,
                0xa8, 0xb2, 0xb5,
            ]
        );
    }

    #[test]
    fn is_case_insensitive() {
        let bytes = b"hello world test!";
        let encoded = encode(bytes);
        assert_eq!(decode(&encoded.to_ascii_lowercase()).unwrap(), bytes);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode("not valid base32!!!").is_err());
    }
}
