//! # Bitstring Status List
//!
//! Credential revocation state as a fixed-size bitstring, one bit per
//! issuable credential, published as a DID document service endpoint.
//! Follows the encoding of [Bitstring Status List v1.0](https://www.w3.org/TR/vc-bitstring-status-list/):
//! the packed bits are gzip-compressed, base64url-encoded, and carried in
//! a `data:` URL. The first index is the left-most (most significant) bit.

use bitvec::order::Msb0;
use bitvec::vec::BitVec;

use crate::core::codec;
use crate::error::{Error, Result};

/// Number of bits in a revocation bitstring (16 KiB uncompressed).
pub const BITSTRING_BITS: usize = 131_072;

const BITSTRING_BYTES: usize = BITSTRING_BITS / 8;

/// Service type of a published status list.
pub const STATUS_LIST_TYPE: &str = "BitstringStatusList";

/// Service id fragment under which the status list is published.
pub const REVOCATION_FRAGMENT: &str = "revocation";

/// Media prefix of a status list service endpoint.
pub const ENDPOINT_PREFIX: &str = "data:application/octet-stream;base64,";

/// A fixed-size bit set tracking revocation status: bit = 1 means the
/// credential issued against that index is revoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitstring {
    bits: BitVec<u8, Msb0>,
}

impl Default for Bitstring {
    fn default() -> Self {
        Self::new()
    }
}

impl Bitstring {
    /// An all-zero bitstring of [`BITSTRING_BITS`] bits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: BitVec::repeat(false, BITSTRING_BITS),
        }
    }

    /// Read the bit at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `index` is out of range.
    pub fn get(&self, index: usize) -> Result<bool> {
        self.bits
            .get(index)
            .map(|bit| *bit)
            .ok_or_else(|| Error::InvalidArgument(format!("index out of range: {index}")))
    }

    /// Set the bit at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `index` is out of range.
    pub fn set(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= self.bits.len() {
            return Err(Error::InvalidArgument(format!("index out of range: {index}")));
        }
        self.bits.set(index, value);
        Ok(())
    }

    /// Rebuild a bitstring from its canonical packed form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the input is not exactly
    /// [`BITSTRING_BITS`] / 8 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BITSTRING_BYTES {
            return Err(Error::InvalidArgument(format!(
                "bitstring is {} bytes, expected {BITSTRING_BYTES}",
                bytes.len()
            )));
        }
        Ok(Self {
            bits: BitVec::from_slice(bytes),
        })
    }

    /// The canonical packed form: big-endian bytes, bit 0 at the most
    /// significant position of the first byte.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.as_raw_slice().to_vec()
    }

    /// Encode as a service endpoint: gzip-compress the packed bytes,
    /// base64url-encode, and prefix with the `data:` URL header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] when compression fails.
    pub fn to_endpoint(&self) -> Result<String> {
        let compressed = codec::compress(&self.to_bytes())?;
        Ok(format!("{ENDPOINT_PREFIX}{}", codec::b64url_encode(&compressed)))
    }

    /// Decode a service endpoint produced by [`Self::to_endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] when the endpoint is not a `data:` URL
    /// carrying base64url gzip data, or [`Error::InvalidArgument`] when
    /// the decompressed bitstring has the wrong length.
    pub fn from_endpoint(endpoint: &str) -> Result<Self> {
        let Some((_, encoded)) = endpoint.split_once(',') else {
            return Err(Error::Encoding("service endpoint is not a data URL".to_string()));
        };
        let compressed = codec::b64url_decode(encoded)?;
        Self::from_bytes(&codec::decompress(&compressed)?)
    }
}
