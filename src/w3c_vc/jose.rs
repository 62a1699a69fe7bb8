//! # JOSE Claim Shapes
//!
//! The JWT claim sets used when credentials and presentations are secured
//! as compact JWTs, per Securing Verifiable Credentials using JOSE and
//! COSE (<https://w3c.github.io/vc-jose-cose>): registered claims carry
//! the credential's identity and timing, and the `vc`/`vp` claim carries a
//! pruned copy of the data-model object.

use chrono::serde::{ts_seconds, ts_seconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Kind, OneMany};
use crate::w3c_vc::vc::{CredentialStatus, CredentialSubject, VerifiableCredential};
use crate::w3c_vc::vp::VerifiablePresentation;

/// Claims of a Verifiable Credential JWT.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VcClaims {
    /// The issuer DID.
    pub iss: String,

    /// Issuance time, as a UNIX timestamp
    /// ([RFC7519](https://www.rfc-editor.org/rfc/rfc7519) `NumericDate`).
    #[serde(with = "ts_seconds")]
    pub nbf: DateTime<Utc>,

    /// The `id` property of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// The subject id the credential is about, from
    /// `credentialSubject.id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// The pruned credential.
    pub vc: VcClaim,
}

/// The `vc` claim: the credential with its registered-claim counterparts
/// (`id`, `issuer`, `issuanceDate`, subject ids) stripped.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VcClaim {
    /// The credential's `@context`.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// The credential type(s).
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The credential subject(s), without ids.
    pub credential_subject: OneMany<CredentialSubject>,

    /// The credential's revocation status entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
}

impl From<&VerifiableCredential> for VcClaim {
    fn from(vc: &VerifiableCredential) -> Self {
        let mut subjects = vc.credential_subject.clone();
        match &mut subjects {
            OneMany::One(subject) => subject.id = None,
            OneMany::Many(set) => {
                for subject in set {
                    subject.id = None;
                }
            }
        }

        Self {
            context: vc.context.clone(),
            type_: vc.type_.clone(),
            credential_subject: subjects,
            credential_status: vc.credential_status.clone(),
        }
    }
}

impl VcClaims {
    /// Build JWT claims from a credential, leaving the credential itself
    /// untouched.
    #[must_use]
    pub fn from_vc(vc: &VerifiableCredential, issued_at: DateTime<Utc>) -> Self {
        let sub = match &vc.credential_subject {
            OneMany::One(subject) => subject.id.clone(),
            OneMany::Many(subjects) => subjects.first().and_then(|subject| subject.id.clone()),
        };

        Self {
            iss: vc.issuer.clone().unwrap_or_default(),
            nbf: issued_at,
            jti: vc.id.clone(),
            sub,
            vc: VcClaim::from(vc),
        }
    }
}

/// Claims of a Verifiable Presentation JWT.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VpClaims {
    /// The holder DID.
    pub iss: String,

    /// The time the presentation was created, as a UNIX timestamp
    /// ([RFC7519](https://www.rfc-editor.org/rfc/rfc7519) `NumericDate`).
    #[serde(with = "ts_seconds")]
    pub nbf: DateTime<Utc>,

    /// The time the presentation expires, as a UNIX timestamp.
    #[serde(with = "ts_seconds_option", skip_serializing_if = "Option::is_none", default)]
    pub exp: Option<DateTime<Utc>>,

    /// The pruned presentation.
    pub vp: VpClaim,
}

/// The `vp` claim: the presentation with the holder stripped (carried by
/// `iss`).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VpClaim {
    /// The presentation's `@context`.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// The presentation type(s).
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The presented credentials, as compact JWTs.
    pub verifiable_credential: Vec<String>,
}

impl From<&VerifiablePresentation> for VpClaim {
    fn from(vp: &VerifiablePresentation) -> Self {
        Self {
            context: vp.context.clone(),
            type_: vp.type_.clone(),
            verifiable_credential: vp.verifiable_credential.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn vc_claim_strips_subject_ids() {
        let vc = VerifiableCredential {
            id: Some("https://example.com/credentials/1".to_string()),
            issuer: Some("did:example:issuer".to_string()),
            credential_subject: OneMany::One(CredentialSubject {
                id: Some("did:example:subject".to_string()),
                claims: json!({"name": "Jane Doe"}).as_object().unwrap().clone(),
            }),
            ..VerifiableCredential::default()
        };

        let claims = VcClaims::from_vc(&vc, Utc::now());
        assert_eq!(claims.sub.as_deref(), Some("did:example:subject"));
        assert_eq!(claims.jti.as_deref(), Some("https://example.com/credentials/1"));
        assert_eq!(claims.vc.credential_subject.as_one().and_then(|s| s.id.as_deref()), None);

        // the source credential keeps its subject id
        assert_eq!(
            vc.credential_subject.as_one().and_then(|s| s.id.as_deref()),
            Some("did:example:subject")
        );
    }

    #[test]
    fn nbf_serializes_as_seconds() {
        let claims = VcClaims {
            iss: "did:example:issuer".to_string(),
            nbf: DateTime::from_timestamp(1_577_836_800, 0).unwrap(),
            jti: None,
            sub: None,
            vc: VcClaim::default(),
        };
        let value = serde_json::to_value(&claims).expect("should serialize");
        assert_eq!(value["nbf"], json!(1_577_836_800));
        assert!(value.get("jti").is_none());
    }
}
