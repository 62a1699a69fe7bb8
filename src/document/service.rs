//! # Services
//!
//! Services express ways of communicating with the DID subject or
//! associated entities, and are used by this crate to publish the
//! credential revocation bitstring as a `data:` URL endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Kind, OneMany};

/// A service attached to a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    /// Service id, a URI qualified by the owning DID (`<did>#<fragment>`).
    pub id: String,

    /// Service type(s).
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The service endpoint: a URI string or an object.
    pub service_endpoint: Kind<Value>,
}

impl Service {
    /// Create a service with a string endpoint.
    #[must_use]
    pub fn new(
        id: impl Into<String>, type_: OneMany<String>, endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            type_,
            service_endpoint: Kind::String(endpoint.into()),
        }
    }

    /// The endpoint as a string, when it is one.
    #[must_use]
    pub fn endpoint_str(&self) -> Option<&str> {
        self.service_endpoint.as_string()
    }

    /// The service type: the first element when the type is a set.
    #[must_use]
    pub fn primary_type(&self) -> Option<&String> {
        self.type_.first()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_to_did_core_shape() {
        let service = Service::new(
            "did:example:123#linked-domain",
            OneMany::One("LinkedDomains".to_string()),
            "https://example.com",
        );
        let value = serde_json::to_value(&service).expect("should serialize");
        assert_eq!(
            value,
            json!({
                "id": "did:example:123#linked-domain",
                "type": "LinkedDomains",
                "serviceEndpoint": "https://example.com"
            })
        );
    }

    #[test]
    fn primary_type_of_a_set() {
        let service = Service::new(
            "did:example:123#svc",
            OneMany::Many(vec!["A".to_string(), "B".to_string()]),
            "https://example.com",
        );
        assert_eq!(service.primary_type().map(String::as_str), Some("A"));
    }
}
