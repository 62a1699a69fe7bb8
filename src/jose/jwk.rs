//! # JSON Web Key (JWK)
//!
//! Ed25519 public keys in JWK form, and the deterministic key id derived
//! from them. The key id is the base64url-encoded SHA-256 digest of the
//! canonical JWK parameters `{alg, kty, crv, x}` serialized in that order
//! with no whitespace, so it is a pure function of the public key and
//! stable across implementations.

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::core::codec;
use crate::error::{Error, Result};
use crate::jose::jwa::{Algorithm, Curve, KeyType};

/// An Ed25519 public key in JWK form.
///
/// Field order matters: the key id digest is computed over the serialized
/// `{alg, kty, crv, x}` parameters, which serde emits in declaration order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Signature algorithm the key is used with.
    pub alg: Algorithm,

    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve.
    pub crv: Curve,

    /// Base64url-encoded public key bytes.
    pub x: String,

    /// Key id: base64url SHA-256 of the canonical parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl PublicKeyJwk {
    /// Build a JWK from raw Ed25519 public key bytes, deriving the key id.
    #[must_use]
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let mut jwk = Self {
            alg: Algorithm::EdDSA,
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: codec::b64url_encode(public_key),
            kid: None,
        };
        jwk.kid = Some(jwk.key_id());
        jwk
    }

    /// Derive the deterministic key id from the canonical JWK parameters.
    ///
    /// # Panics
    ///
    /// Serialization of the parameter struct cannot fail.
    #[must_use]
    pub fn key_id(&self) -> String {
        let params = Self {
            kid: None,
            ..self.clone()
        };
        let canonical = serde_json::to_vec(&params).expect("JWK params are valid JSON");
        codec::b64url_encode(&codec::sha256(&canonical))
    }

    /// Decode the raw public key bytes from the `x` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] when `x` is not base64url, or
    /// [`Error::InvalidState`] when it does not hold a 32-byte key.
    pub fn public_key(&self) -> Result<[u8; 32]> {
        let bytes = codec::b64url_decode(&self.x)?;
        bytes
            .try_into()
            .map_err(|_| Error::InvalidState("JWK 'x' is not a 32-byte public key".to_string()))
    }

    /// Verify an EdDSA signature over the message using this key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signature`] when the key material or signature is
    /// malformed, or the signature does not verify.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<()> {
        let key_bytes = self
            .public_key()
            .map_err(|e| Error::Signature(format!("issue building verifying key: {e}")))?;
        verify(msg, signature, &key_bytes)
    }
}

/// Verify an EdDSA signature over the message using raw public key bytes.
///
/// # Errors
///
/// Returns [`Error::Signature`] when the key material or signature is
/// malformed, or the signature does not verify.
pub fn verify(msg: &[u8], signature: &[u8], public_key: &[u8; 32]) -> Result<()> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| Error::Signature(format!("issue building verifying key: {e}")))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| Error::Signature(format!("issue building signature: {e}")))?;

    use ed25519_dalek::Verifier;
    verifying_key
        .verify(msg, &signature)
        .map_err(|e| Error::Signature(format!("signature does not verify: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Public key of the Ed25519 keypair whose seed is 32 bytes of 0x01.
    const PUBLIC_X: &str = "iojj3XQJ8ZX9UtstPLpdcspnCb8dlBIb83SIAbQPb1w";

    #[test]
    fn key_id_is_deterministic() {
        let jwk = PublicKeyJwk {
            x: PUBLIC_X.to_string(),
            ..PublicKeyJwk::default()
        };
        assert_eq!(jwk.key_id(), "dO4T7WCiDwTucXhcsERM7Xeo1GWPblfyGrG744QxC9Q");
        // kid derivation ignores a previously set kid
        let jwk = PublicKeyJwk {
            kid: Some("other".to_string()),
            ..jwk
        };
        assert_eq!(jwk.key_id(), "dO4T7WCiDwTucXhcsERM7Xeo1GWPblfyGrG744QxC9Q");
    }

    #[test]
    fn canonical_params_shape() {
        let jwk = PublicKeyJwk {
            x: "abc".to_string(),
            ..PublicKeyJwk::default()
        };
        let json = serde_json::to_string(&jwk).expect("should serialize");
        assert_eq!(json, r#"{"alg":"EdDSA","kty":"OKP","crv":"Ed25519","x":"abc"}"#);
    }

    #[test]
    fn from_public_key_sets_kid() {
        let seed = [1u8; 32];
        let public = ed25519_dalek::SigningKey::from_bytes(&seed).verifying_key();
        let jwk = PublicKeyJwk::from_public_key(public.as_bytes());
        assert_eq!(jwk.x, PUBLIC_X);
        assert_eq!(jwk.kid.as_deref(), Some("dO4T7WCiDwTucXhcsERM7Xeo1GWPblfyGrG744QxC9Q"));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        use ed25519_dalek::Signer;

        let signing_key = ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]);
        let jwk = PublicKeyJwk::from_public_key(signing_key.verifying_key().as_bytes());
        let signature = signing_key.sign(b"message").to_bytes();

        jwk.verify(b"message", &signature).expect("should verify");
        assert!(jwk.verify(b"tampered", &signature).is_err());
    }
}
