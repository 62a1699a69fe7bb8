//! # DID Documents
//!
//! A typed view over the JSON form of a DID document
//! (<https://www.w3.org/TR/did-core/>): the six verification relationships,
//! each holding verification methods by reference or embedded, and the
//! document's services.
//!
//! Invariants maintained by the mutators: a relationship or the `service`
//! property is absent when empty (never an empty array), and verification
//! method ids are unique across the whole document.

pub mod service;
pub mod verification;

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Kind;
use crate::error::Error;

pub use self::service::Service;
pub use self::verification::VerificationMethod;

/// An entry in a verification relationship: either a reference to a method
/// defined elsewhere in the document, or an embedded method.
pub type MethodRef = Kind<VerificationMethod>;

/// A DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    /// The DID the document describes.
    pub id: String,

    /// General-purpose verification methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<MethodRef>>,

    /// Methods used to authenticate as the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<MethodRef>>,

    /// Methods used to assert claims, such as issuing verifiable
    /// credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<MethodRef>>,

    /// Methods used to negotiate encryption material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<MethodRef>>,

    /// Methods used to invoke a cryptographic capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<MethodRef>>,

    /// Methods used to delegate a cryptographic capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<MethodRef>>,

    /// Ways of communicating with the DID subject or associated entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
}

/// The six verification relationships, in the fixed order used when
/// walking a document's methods.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MethodRelationship {
    /// General-purpose verification methods.
    VerificationMethod,

    /// Authentication methods.
    Authentication,

    /// Assertion methods.
    AssertionMethod,

    /// Key agreement methods.
    KeyAgreement,

    /// Capability invocation methods.
    CapabilityInvocation,

    /// Capability delegation methods.
    CapabilityDelegation,
}

impl MethodRelationship {
    /// All relationships, in document-walk order.
    pub const ALL: [Self; 6] = [
        Self::VerificationMethod,
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];

    /// The document property name for the relationship.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::VerificationMethod => "verificationMethod",
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl Display for MethodRelationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.property())
    }
}

impl FromStr for MethodRelationship {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rel| rel.property() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown verification relationship: {s}")))
    }
}

impl MethodRef {
    /// The id of the referenced or embedded method.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::String(id) => id,
            Self::Object(method) => &method.id,
        }
    }
}

impl Document {
    /// A new document describing the given DID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    fn relationship(&self, relationship: MethodRelationship) -> Option<&Vec<MethodRef>> {
        match relationship {
            MethodRelationship::VerificationMethod => self.verification_method.as_ref(),
            MethodRelationship::Authentication => self.authentication.as_ref(),
            MethodRelationship::AssertionMethod => self.assertion_method.as_ref(),
            MethodRelationship::KeyAgreement => self.key_agreement.as_ref(),
            MethodRelationship::CapabilityInvocation => self.capability_invocation.as_ref(),
            MethodRelationship::CapabilityDelegation => self.capability_delegation.as_ref(),
        }
    }

    fn relationship_mut(&mut self, relationship: MethodRelationship) -> &mut Option<Vec<MethodRef>> {
        match relationship {
            MethodRelationship::VerificationMethod => &mut self.verification_method,
            MethodRelationship::Authentication => &mut self.authentication,
            MethodRelationship::AssertionMethod => &mut self.assertion_method,
            MethodRelationship::KeyAgreement => &mut self.key_agreement,
            MethodRelationship::CapabilityInvocation => &mut self.capability_invocation,
            MethodRelationship::CapabilityDelegation => &mut self.capability_delegation,
        }
    }

    /// Walk every verification relationship entry in document order,
    /// yielding the relationship, the position within it, and the entry.
    pub fn all_methods(&self) -> impl Iterator<Item = (MethodRelationship, usize, &MethodRef)> {
        MethodRelationship::ALL.into_iter().flat_map(|rel| {
            self.relationship(rel)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(move |(position, entry)| (rel, position, entry))
        })
    }

    /// Find a verification method by its fully-qualified id, regardless of
    /// which relationship holds it. A reference entry is resolved against
    /// the embedded methods in `verificationMethod`.
    #[must_use]
    pub fn find_method(&self, id: &str) -> Option<&VerificationMethod> {
        let embedded = |entry: &str| {
            self.verification_method.as_ref().and_then(|methods| {
                methods.iter().find_map(|m| match m {
                    Kind::Object(method) if method.id == entry => Some(method),
                    _ => None,
                })
            })
        };

        self.all_methods().find_map(|(_, _, entry)| match entry {
            Kind::Object(method) if method.id == id => Some(method),
            Kind::String(reference) if reference == id => embedded(reference),
            _ => None,
        })
    }

    /// Upsert a verification method into the given relationship, keyed on
    /// the method id: any existing entry with the same id (in any
    /// relationship) is removed first, then the method is appended.
    pub fn add_method(&mut self, relationship: MethodRelationship, method: VerificationMethod) {
        self.remove_method(&method.id);
        self.relationship_mut(relationship).get_or_insert_with(Vec::new).push(Kind::Object(method));
    }

    /// Remove the first entry matching the method id across all
    /// relationships. An emptied relationship property is dropped. Returns
    /// `false` when no entry matches.
    pub fn remove_method(&mut self, id: &str) -> bool {
        for relationship in MethodRelationship::ALL {
            let slot = self.relationship_mut(relationship);
            if let Some(entries) = slot {
                let Some(position) = entries.iter().position(|entry| entry.id() == id) else {
                    continue;
                };
                entries.remove(position);
                if entries.is_empty() {
                    *slot = None;
                }
                return true;
            }
        }
        false
    }

    /// Find the first service satisfying the predicate.
    pub fn find_service(&self, predicate: impl Fn(&Service) -> bool) -> Option<&Service> {
        self.service.as_ref().and_then(|services| services.iter().find(|svc| predicate(svc)))
    }

    /// Insert a service, replacing any existing service with the same id.
    pub fn insert_service(&mut self, service: Service) {
        let services = self.service.get_or_insert_with(Vec::new);
        if let Some(existing) = services.iter_mut().find(|svc| svc.id == service.id) {
            *existing = service;
        } else {
            services.push(service);
        }
    }

    /// Remove the service with exactly the given id. The `service` property
    /// is dropped when it empties. Returns `false` when no service matches.
    pub fn remove_service(&mut self, id: &str) -> bool {
        let Some(services) = &mut self.service else {
            return false;
        };
        let Some(position) = services.iter().position(|svc| svc.id == id) else {
            return false;
        };
        services.remove(position);
        if services.is_empty() {
            self.service = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::OneMany;

    fn method(id: &str) -> VerificationMethod {
        VerificationMethod {
            id: id.to_string(),
            controller: "did:example:123".to_string(),
            type_: verification::METHOD_TYPE.to_string(),
            public_key_jwk: None,
        }
    }

    #[test]
    fn add_method_is_idempotent() {
        let mut doc = Document::new("did:example:123");
        doc.add_method(MethodRelationship::AssertionMethod, method("did:example:123#key-1"));
        doc.add_method(MethodRelationship::AssertionMethod, method("did:example:123#key-1"));

        assert_eq!(doc.assertion_method.as_ref().map(Vec::len), Some(1));
        assert_eq!(doc.all_methods().count(), 1);
    }

    #[test]
    fn add_method_moves_between_relationships() {
        let mut doc = Document::new("did:example:123");
        doc.add_method(MethodRelationship::Authentication, method("did:example:123#key-1"));
        doc.add_method(MethodRelationship::AssertionMethod, method("did:example:123#key-1"));

        // the emptied relationship is dropped entirely
        assert!(doc.authentication.is_none());
        assert_eq!(doc.assertion_method.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn remove_last_method_drops_property() {
        let mut doc = Document::new("did:example:123");
        doc.add_method(MethodRelationship::AssertionMethod, method("did:example:123#key-1"));

        assert!(doc.remove_method("did:example:123#key-1"));
        assert!(doc.assertion_method.is_none());

        let value = serde_json::to_value(&doc).expect("should serialize");
        assert_eq!(value, json!({"id": "did:example:123"}));
    }

    #[test]
    fn find_method_resolves_references() {
        let mut doc = Document::new("did:example:123");
        doc.add_method(MethodRelationship::VerificationMethod, method("did:example:123#key-1"));
        doc.authentication = Some(vec![Kind::String("did:example:123#key-1".to_string())]);

        let found = doc.find_method("did:example:123#key-1").expect("should find");
        assert_eq!(found.id, "did:example:123#key-1");
        assert!(doc.find_method("did:example:123#missing").is_none());
    }

    #[test]
    fn walk_order_is_fixed() {
        let mut doc = Document::new("did:example:123");
        doc.capability_delegation = Some(vec![Kind::String("did:example:123#d".to_string())]);
        doc.authentication = Some(vec![Kind::String("did:example:123#a".to_string())]);

        let order = doc.all_methods().map(|(rel, _, _)| rel).collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![MethodRelationship::Authentication, MethodRelationship::CapabilityDelegation]
        );
    }

    #[test]
    fn service_insert_replaces_and_remove_drops() {
        let mut doc = Document::new("did:example:123");
        doc.insert_service(Service::new(
            "did:example:123#svc",
            OneMany::One("LinkedDomains".to_string()),
            "https://example.com",
        ));
        doc.insert_service(Service::new(
            "did:example:123#svc",
            OneMany::One("LinkedDomains".to_string()),
            "https://example.org",
        ));

        let services = doc.service.as_ref().expect("should have services");
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].endpoint_str(), Some("https://example.org"));

        assert!(!doc.remove_service("did:example:123#other"));
        assert!(doc.remove_service("did:example:123#svc"));
        assert!(doc.service.is_none());
    }

    #[test]
    fn relationship_parse() {
        assert_eq!(
            "assertionMethod".parse::<MethodRelationship>().expect("should parse"),
            MethodRelationship::AssertionMethod
        );
        assert!("assertion_method".parse::<MethodRelationship>().is_err());
    }
}
