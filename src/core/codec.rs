//! # Codec
//!
//! Byte-level conversions shared by the engines: base64 and base64url
//! (unpadded on encode, tolerant of padding on decode), hex with an
//! optional `0x` prefix, UTF-8, SHA-256 digests, and gzip compression.
//!
//! All failures surface as [`Error::Encoding`].

use std::io::{Read, Write};

use base64ct::{Base64Unpadded, Base64UrlUnpadded, Encoding};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Encode bytes as standard base64 without padding.
#[must_use]
pub fn b64_encode(data: &[u8]) -> String {
    Base64Unpadded::encode_string(data)
}

/// Decode standard base64, with or without padding.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the input is not valid base64.
pub fn b64_decode(data: &str) -> Result<Vec<u8>> {
    Base64Unpadded::decode_vec(data.trim_end_matches('='))
        .map_err(|e| Error::Encoding(format!("issue decoding base64: {e}")))
}

/// Encode bytes as base64url without padding.
#[must_use]
pub fn b64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Decode base64url, with or without padding.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the input is not valid base64url.
pub fn b64url_decode(data: &str) -> Result<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(data.trim_end_matches('='))
        .map_err(|e| Error::Encoding(format!("issue decoding base64url: {e}")))
}

/// Encode bytes as lowercase hex (no prefix).
#[must_use]
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string, tolerating an optional `0x`/`0X` prefix.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the input is not valid hex.
pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    let data = data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")).unwrap_or(data);
    hex::decode(data).map_err(|e| Error::Encoding(format!("issue decoding hex: {e}")))
}

/// Decode bytes as UTF-8.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the bytes are not valid UTF-8.
pub fn utf8_decode(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|e| Error::Encoding(format!("issue decoding UTF-8: {e}")))
}

/// SHA-256 digest of the input.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Gzip-compress the input.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when compression fails.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| Error::Encoding(format!("issue compressing: {e}")))
}

/// Gzip-decompress the input.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the input is not a valid gzip stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Encoding(format!("issue decompressing: {e}")))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_tolerates_padding() {
        let encoded = b64_encode(b"any carnal pleasure");
        assert!(!encoded.ends_with('='));
        assert_eq!(b64_decode(&encoded).expect("should decode"), b"any carnal pleasure");
        assert_eq!(b64_decode("YW55").expect("should decode"), b"any");
        assert_eq!(b64_decode("YQ==").expect("should decode"), b"a");
    }

    #[test]
    fn base64url_roundtrip() {
        let data = [0xff, 0xef, 0x01, 0x02];
        let encoded = b64url_encode(&data);
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(b64url_decode(&encoded).expect("should decode"), data);
    }

    #[test]
    fn hex_prefix_is_optional() {
        assert_eq!(hex_encode(&[0xab, 0x01]), "ab01");
        assert_eq!(hex_decode("ab01").expect("should decode"), [0xab, 0x01]);
        assert_eq!(hex_decode("0xab01").expect("should decode"), [0xab, 0x01]);
        assert!(hex_decode("0xzz").is_err());
    }

    #[test]
    fn gzip_roundtrip() {
        let data = vec![0u8; 16_384];
        let compressed = compress(&data).expect("should compress");
        assert!(compressed.len() < data.len());
        assert_eq!(decompress(&compressed).expect("should decompress"), data);
    }

    #[test]
    fn sha256_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            hex_encode(&sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
