//! # Verifiable Credentials
//!
//! [Verifiable Credentials](https://www.w3.org/TR/vc-data-model/#credentials)
//! express cryptographically verifiable claims about a subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Kind, OneMany};

/// A W3C Verifiable Credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiableCredential {
    /// The @context property maps property URIs into short-form aliases.
    /// An ordered set where the first item is the base credentials
    /// context.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// A unique identifier for the credential, carried as `jti` in JWT
    /// form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The credential type(s). Always contains `VerifiableCredential`.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// Claims about the credential subject(s). A subject's `id` is carried
    /// as `sub` in JWT form.
    pub credential_subject: OneMany<CredentialSubject>,

    /// The DID of the credential issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// When the credential was issued, to millisecond precision.
    #[serde(with = "iso_millis", skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    /// Where a verifier can check the credential's revocation status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
}

/// Claims about a credential subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialSubject {
    /// Identifier of the subject the claims are about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The claims themselves.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Revocation status entry pointing at a bitstring status list published
/// as a service of the issuer's DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialStatus {
    /// Id of the status list service.
    pub id: String,

    /// Type of the status list service.
    #[serde(rename = "type")]
    pub type_: String,

    /// The credential's index into the revocation bitstring, as a decimal
    /// string.
    pub revocation_bitmap_index: String,
}

/// ISO-8601 timestamps with millisecond precision (`issuanceDate` wire
/// form).
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>, serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => {
                serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&text)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn issuance_date_has_millisecond_precision() {
        let vc = VerifiableCredential {
            issuance_date: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..VerifiableCredential::default()
        };
        let value = serde_json::to_value(&vc).expect("should serialize");
        assert_eq!(value["issuanceDate"], json!("2020-01-01T00:00:00.000Z"));

        let parsed: VerifiableCredential =
            serde_json::from_value(value).expect("should deserialize");
        assert_eq!(parsed.issuance_date, vc.issuance_date);
    }

    #[test]
    fn subject_claims_flatten() {
        let subject: CredentialSubject = serde_json::from_value(json!({
            "id": "did:example:subject",
            "@type": "Person",
            "name": "Jane Doe"
        }))
        .expect("should deserialize");

        assert_eq!(subject.id.as_deref(), Some("did:example:subject"));
        assert_eq!(subject.claims["name"], json!("Jane Doe"));

        let value = serde_json::to_value(&subject).expect("should serialize");
        assert_eq!(value["@type"], json!("Person"));
    }

    #[test]
    fn status_wire_shape() {
        let status = CredentialStatus {
            id: "did:example:issuer#revocation".to_string(),
            type_: "BitstringStatusList".to_string(),
            revocation_bitmap_index: "5".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).expect("should serialize"),
            json!({
                "id": "did:example:issuer#revocation",
                "type": "BitstringStatusList",
                "revocationBitmapIndex": "5"
            })
        );
    }
}
