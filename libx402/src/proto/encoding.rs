//! Base64 helpers for the x402 wire format.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as b64, URL_SAFE_NO_PAD as b64url};
use rand::Rng;

/// Encodes raw bytes as a standard-alphabet base64 string.
///
/// Used for header payloads, which must be single-line ASCII-safe tokens.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    b64.encode(input.as_ref())
}

/// Decodes a standard-alphabet base64 string to raw bytes.
///
/// # Errors
///
/// Returns an error if the input is not valid base64.
pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    b64.decode(input.trim())
}

/// Generates a URL-safe random token from `len` bytes of entropy.
///
/// Offers use this for `nonce` (32 bytes) and `payment_id` (16 bytes).
pub fn random_token(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::rng().fill_bytes(&mut buf);
    b64url.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes() {
        let data = b"x402 payload";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode("not base64!!").is_err());
    }

    #[test]
    fn tokens_are_unique_and_header_safe() {
        let a = random_token(32);
        let b = random_token(32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
