//! # JSON Web Signature (JWS)
//!
//! Compact-serialized JWTs signed with EdDSA. Signing is delegated to the
//! caller through an async closure so key material never leaves the vault
//! holding it; verification takes raw public key bytes.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::codec;
use crate::error::{Error, Result};
use crate::jose::jwa::Algorithm;
use crate::jose::jwk;

/// Length of an Ed25519 signature.
const SIGNATURE_LEN: usize = 64;

/// JWS protected header.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Protected {
    /// Verification method id of the signing key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Media type of the secured payload.
    pub typ: String,

    /// Digital signature algorithm identifier as per IANA "JSON Web
    /// Signature and Encryption Algorithms" registry.
    pub alg: Algorithm,
}

impl Protected {
    /// Header for a JWT signed by the given verification method.
    #[must_use]
    pub fn new(kid: impl Into<String>) -> Self {
        Self {
            kid: Some(kid.into()),
            typ: "JWT".to_string(),
            alg: Algorithm::EdDSA,
        }
    }
}

/// A decoded compact JWT, prior to signature verification.
#[derive(Clone, Debug)]
pub struct DecodedJwt {
    /// The protected header.
    pub header: Protected,

    /// The claims payload as raw JSON.
    pub claims: Value,

    /// The signature bytes (always 64 bytes).
    pub signature: Vec<u8>,

    /// The ASCII signing input (`b64url(header) + "." + b64url(claims)`).
    pub signing_input: Vec<u8>,
}

impl DecodedJwt {
    /// Deserialize the claims into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] when the claims do not match the type.
    pub fn claims_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.claims.clone()).map_err(Error::from)
    }
}

/// Encode the header and claims and sign, returning a JWT in compact form.
///
/// The signer is called once with the ASCII signing input and must return
/// a 64-byte EdDSA signature.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the header or claims cannot be
/// serialized, or [`Error::Vault`] when the signer fails.
pub async fn encode<T, F, Fut>(header: &Protected, claims: &T, signer: F) -> Result<String>
where
    T: Serialize + Send + Sync,
    F: FnOnce(Vec<u8>) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send,
{
    tracing::debug!("jws::encode");

    let header_b64 = codec::b64url_encode(&serde_json::to_vec(header)?);
    let claims_b64 = codec::b64url_encode(&serde_json::to_vec(claims)?);
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature =
        signer(signing_input.clone().into_bytes()).await.map_err(|e| Error::vault("sign", e))?;

    Ok(format!("{signing_input}.{}", codec::b64url_encode(&signature)))
}

/// Decode a compact JWT without verifying its signature.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the token does not have three
/// base64url segments, the header or claims are not JSON, or the signature
/// is not 64 bytes.
pub fn decode(token: &str) -> Result<DecodedJwt> {
    tracing::debug!("jws::decode");

    let parts = token.split('.').collect::<Vec<&str>>();
    if parts.len() != 3 {
        return Err(Error::Encoding("token is not compact JWS".to_string()));
    }

    let header_bytes = codec::b64url_decode(parts[0])?;
    let header = serde_json::from_slice::<Protected>(&header_bytes)
        .map_err(|e| Error::Encoding(format!("issue deserializing header: {e}")))?;

    let claim_bytes = codec::b64url_decode(parts[1])?;
    let claims = serde_json::from_slice::<Value>(&claim_bytes)
        .map_err(|e| Error::Encoding(format!("issue deserializing claims: {e}")))?;

    let signature = codec::b64url_decode(parts[2])?;
    if signature.len() != SIGNATURE_LEN {
        return Err(Error::Encoding(format!(
            "signature is {} bytes, expected {SIGNATURE_LEN}",
            signature.len()
        )));
    }

    Ok(DecodedJwt {
        header,
        claims,
        signature,
        signing_input: format!("{}.{}", parts[0], parts[1]).into_bytes(),
    })
}

/// Verify a decoded JWT's signature against raw Ed25519 public key bytes.
///
/// # Errors
///
/// Returns [`Error::Signature`] when the signature does not verify.
pub fn verify(signing_input: &[u8], signature: &[u8], public_key: &[u8; 32]) -> Result<()> {
    jwk::verify(signing_input, signature, public_key)
}
