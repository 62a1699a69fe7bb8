//! # Providers
//!
//! Traits implemented by the collaborators the engines depend on: an
//! entity store per persisted record kind, a vault holding signing keys,
//! and a source of randomness. Implementers plug in concrete persistence
//! and key custody; in-memory implementations live in
//! [`test_utils`](crate::test_utils).
//!
//! Provider methods return `anyhow::Result` — the engines wrap failures
//! with operation context before surfacing them.

use std::collections::BTreeMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Context;

/// A persisted record kind, keyed by a stable primary key.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// The record's primary key.
    fn key(&self) -> &str;
}

/// `EntityStore` is implemented by providers to persist one record kind.
///
/// Writes are last-writer-wins: the store offers no optimistic
/// concurrency, so read-modify-write callers must assume races can lose
/// updates.
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Fetch a single record by key, returning `None` if no match was
    /// found.
    fn get(&self, ctx: &Context, key: &str)
    -> impl Future<Output = anyhow::Result<Option<T>>> + Send;

    /// Store a record, replacing any record with the same key.
    fn set(&self, ctx: &Context, entity: &T) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Delete the record with the given key.
    fn remove(&self, ctx: &Context, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Fetch records matching the query conditions.
    fn query(
        &self, ctx: &Context, query: &Query,
    ) -> impl Future<Output = anyhow::Result<Page<T>>> + Send;
}

/// A store query: equality conditions on dotted property paths, an
/// optional sort, and cursor-based paging.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Query {
    /// Conditions a record must satisfy (all of them).
    pub conditions: Vec<Condition>,

    /// Property path to sort by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,

    /// Property paths to include in returned records (all when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    /// Opaque paging cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Maximum number of records per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

/// Equality condition on a dotted property path, e.g.
/// `properties.role.value`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Condition {
    /// Dotted path to the property.
    pub property: String,

    /// Value the property must equal.
    pub value: Value,
}

/// Sort order for query results.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Sort {
    /// Dotted path to the property to sort by.
    pub property: String,

    /// Sort descending rather than ascending.
    #[serde(default)]
    pub descending: bool,
}

/// One page of query results.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    /// The matching records.
    pub entities: Vec<T>,

    /// Cursor for the next page, when more records match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Page size the query was evaluated with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Total number of matching records.
    pub total: usize,
}

/// Look up a dotted property path in a JSON value.
#[must_use]
pub fn property_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |value, segment| value.get(segment))
}

/// `Vault` is implemented by providers to hold Ed25519 signing keys,
/// uniquely owned by name, and to sign and verify on their behalf. Key
/// material never leaves the vault.
pub trait Vault: Send + Sync {
    /// Create a keypair under the given name, returning the public key
    /// bytes. Fails if the name is taken.
    fn create_key(
        &self, ctx: &Context, name: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    /// Atomically rename a key.
    fn rename_key(
        &self, ctx: &Context, from: &str, to: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Sign the message with the named key, returning the 64-byte
    /// signature.
    fn sign(
        &self, ctx: &Context, name: &str, msg: &[u8],
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    /// Verify a signature over the message against the named key.
    fn verify(
        &self, ctx: &Context, name: &str, msg: &[u8], signature: &[u8],
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

/// `Entropy` supplies the randomness used to mint identifiers and
/// temporary key names, made explicit so deterministic tests need no
/// process-global state.
pub trait Entropy: Send + Sync {
    /// 32 fresh random bytes.
    fn random_bytes(&self) -> [u8; 32];
}

/// Entropy drawn from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn random_bytes(&self) -> [u8; 32] {
        rand::random()
    }
}

/// The full capability set the identity, credential and presentation
/// engines require of a provider.
pub trait Provider: EntityStore<IdentityDocument> + Vault + Entropy {}

impl<T: EntityStore<IdentityDocument> + Vault + Entropy> Provider for T {}

/// The persisted envelope for one identity's DID document. The document
/// text is signed by the vault key named after the DID, so a reader that
/// trusts only the vault cannot accept a tampered document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentityDocument {
    /// The DID (primary key, stable for the life of the identity).
    pub id: String,

    /// The canonical JSON text of the DID document.
    pub document: String,

    /// Base64 Ed25519 signature over the UTF-8 bytes of `document`,
    /// produced by the vault key named `id`.
    pub signature: String,

    /// The external identity authorized to mutate the document.
    pub controller: String,
}

impl Entity for IdentityDocument {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Per-identity profile metadata: a flat set of typed properties, each
/// flagged public or private.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentityProfile {
    /// The identity the profile describes (primary key).
    pub identity: String,

    /// Profile properties keyed by name.
    pub properties: BTreeMap<String, ProfileProperty>,
}

impl Entity for IdentityProfile {
    fn key(&self) -> &str {
        &self.identity
    }
}

/// A single profile property.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileProperty {
    /// Property type, e.g. a schema.org type name.
    #[serde(rename = "type")]
    pub type_: String,

    /// Property value.
    pub value: Value,

    /// Whether the property is visible outside the owning identity.
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn property_path_lookup() {
        let value = json!({"properties": {"role": {"value": "admin"}}});
        assert_eq!(property_at(&value, "properties.role.value"), Some(&json!("admin")));
        assert_eq!(property_at(&value, "properties.missing"), None);
    }

    #[test]
    fn profile_property_wire_shape() {
        let property = ProfileProperty {
            type_: "Text".to_string(),
            value: json!("Jane Doe"),
            is_public: true,
        };
        assert_eq!(
            serde_json::to_value(&property).expect("should serialize"),
            json!({"type": "Text", "value": "Jane Doe", "isPublic": true})
        );
    }
}
