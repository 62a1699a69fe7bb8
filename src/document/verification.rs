//! # Verification Methods
//!
//! Public-key entries in a DID document, usable for signing credentials or
//! proving control of the DID.

use serde::{Deserialize, Serialize};

use crate::jose::PublicKeyJwk;

/// The verification method type used by this crate.
pub const METHOD_TYPE: &str = "JsonWebKey";

/// A verification method: a public key bound to a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationMethod {
    /// Method id: `<did>#<fragment>`, where the fragment defaults to the
    /// key id derived from the public key.
    pub id: String,

    /// The DID of the document controlling the method.
    pub controller: String,

    /// Method type.
    #[serde(rename = "type")]
    pub type_: String,

    /// Public key material in JWK form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<PublicKeyJwk>,
}

impl VerificationMethod {
    /// Build a method from public key bytes, deriving the key id fragment
    /// unless an explicit fragment is supplied.
    #[must_use]
    pub fn from_public_key(did: &str, public_key: &[u8], fragment: Option<&str>) -> Self {
        let jwk = PublicKeyJwk::from_public_key(public_key);
        let fragment = fragment.map_or_else(|| jwk.key_id(), ToString::to_string);

        Self {
            id: format!("{did}#{fragment}"),
            controller: did.to_string(),
            type_: METHOD_TYPE.to_string(),
            public_key_jwk: Some(jwk),
        }
    }
}
