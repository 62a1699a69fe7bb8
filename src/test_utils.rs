//! # In-Memory Providers
//!
//! Provider implementations backed by process memory: an entity store per
//! record kind, an Ed25519 vault, and pluggable entropy. Used by the test
//! suite and for bootstrapping without external persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _};
use serde_json::Value;

use crate::core::Context;
use crate::provider::{
    Condition, Entity, EntityStore, Entropy, IdentityDocument, IdentityProfile, OsEntropy, Page,
    Query, Vault, property_at,
};

/// Entropy returning a fixed value, for deterministic tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedEntropy(pub [u8; 32]);

impl Entropy for FixedEntropy {
    fn random_bytes(&self) -> [u8; 32] {
        self.0
    }
}

/// An in-memory entity store for one record kind.
///
/// Records are held as JSON so queries can match dotted property paths.
/// The `fields` projection of a query is ignored: records are returned
/// whole.
#[derive(Clone, Debug)]
pub struct MemStore<T> {
    records: Arc<Mutex<BTreeMap<String, Value>>>,
    marker: std::marker::PhantomData<T>,
}

impl<T> Default for MemStore<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            marker: std::marker::PhantomData,
        }
    }
}

impl<T> MemStore<T> {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>> {
        self.records.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }
}

fn matches(record: &Value, conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .all(|condition| property_at(record, &condition.property) == Some(&condition.value))
}

fn compare(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => std::cmp::Ordering::Equal,
    }
}

impl<T: Entity> EntityStore<T> for MemStore<T> {
    async fn get(&self, _ctx: &Context, key: &str) -> anyhow::Result<Option<T>> {
        let records = self.lock()?;
        let Some(record) = records.get(key) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(record.clone())?))
    }

    async fn set(&self, _ctx: &Context, entity: &T) -> anyhow::Result<()> {
        let record = serde_json::to_value(entity)?;
        self.lock()?.insert(entity.key().to_string(), record);
        Ok(())
    }

    async fn remove(&self, _ctx: &Context, key: &str) -> anyhow::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn query(&self, _ctx: &Context, query: &Query) -> anyhow::Result<Page<T>> {
        let mut found = {
            let records = self.lock()?;
            records.values().filter(|r| matches(r, &query.conditions)).cloned().collect::<Vec<_>>()
        };

        if let Some(sort) = &query.sort {
            found.sort_by(|a, b| {
                let ordering = compare(
                    property_at(a, &sort.property).unwrap_or(&Value::Null),
                    property_at(b, &sort.property).unwrap_or(&Value::Null),
                );
                if sort.descending { ordering.reverse() } else { ordering }
            });
        }

        let total = found.len();
        let offset = match &query.cursor {
            Some(cursor) => cursor.parse::<usize>().map_err(|_| anyhow!("invalid cursor"))?,
            None => 0,
        };
        let page_size = query.page_size.unwrap_or(total);

        let entities = found
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;

        let next = offset + entities.len();
        Ok(Page {
            cursor: (next < total).then(|| next.to_string()),
            page_size: query.page_size,
            total,
            entities,
        })
    }
}

/// An in-memory Ed25519 vault. Keys are uniquely owned by name; rename is
/// atomic under the vault lock.
#[derive(Clone)]
pub struct MemVault {
    keys: Arc<Mutex<HashMap<String, SigningKey>>>,
    entropy: Arc<dyn Entropy>,
}

impl Default for MemVault {
    fn default() -> Self {
        Self::new(OsEntropy)
    }
}

impl MemVault {
    /// A vault generating key seeds from the given entropy.
    pub fn new(entropy: impl Entropy + 'static) -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashMap::new())),
            entropy: Arc::new(entropy),
        }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, SigningKey>>> {
        self.keys.lock().map_err(|_| anyhow!("vault mutex poisoned"))
    }
}

impl Vault for MemVault {
    async fn create_key(&self, _ctx: &Context, name: &str) -> anyhow::Result<Vec<u8>> {
        let mut keys = self.lock()?;
        if keys.contains_key(name) {
            return Err(anyhow!("key already exists: {name}"));
        }
        let signing_key = SigningKey::from_bytes(&self.entropy.random_bytes());
        let public_key = signing_key.verifying_key().to_bytes().to_vec();
        keys.insert(name.to_string(), signing_key);
        Ok(public_key)
    }

    async fn rename_key(&self, _ctx: &Context, from: &str, to: &str) -> anyhow::Result<()> {
        let mut keys = self.lock()?;
        let Some(signing_key) = keys.remove(from) else {
            return Err(anyhow!("key not found: {from}"));
        };
        keys.insert(to.to_string(), signing_key);
        Ok(())
    }

    async fn sign(&self, _ctx: &Context, name: &str, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        let keys = self.lock()?;
        let signing_key = keys.get(name).ok_or_else(|| anyhow!("key not found: {name}"))?;
        Ok(signing_key.sign(msg).to_bytes().to_vec())
    }

    async fn verify(
        &self, _ctx: &Context, name: &str, msg: &[u8], signature: &[u8],
    ) -> anyhow::Result<bool> {
        let keys = self.lock()?;
        let signing_key = keys.get(name).ok_or_else(|| anyhow!("key not found: {name}"))?;
        let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(signing_key.verifying_key().verify(msg, &signature).is_ok())
    }
}

/// A complete in-memory provider: document and profile stores, a vault,
/// and entropy.
#[derive(Clone)]
pub struct TestProvider {
    /// The document envelope store.
    pub documents: MemStore<IdentityDocument>,

    /// The profile store.
    pub profiles: MemStore<IdentityProfile>,

    /// The vault.
    pub vault: MemVault,

    entropy: Arc<dyn Entropy>,
}

impl Default for TestProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProvider {
    /// A provider drawing randomness from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: MemStore::new(),
            profiles: MemStore::new(),
            vault: MemVault::default(),
            entropy: Arc::new(OsEntropy),
        }
    }

    /// A fully deterministic provider: every 32-byte random value (minted
    /// identifiers, temporary key names, vault key seeds) equals `seed`.
    #[must_use]
    pub fn deterministic(seed: [u8; 32]) -> Self {
        Self {
            documents: MemStore::new(),
            profiles: MemStore::new(),
            vault: MemVault::new(FixedEntropy(seed)),
            entropy: Arc::new(FixedEntropy(seed)),
        }
    }
}

impl EntityStore<IdentityDocument> for TestProvider {
    async fn get(&self, ctx: &Context, key: &str) -> anyhow::Result<Option<IdentityDocument>> {
        self.documents.get(ctx, key).await
    }

    async fn set(&self, ctx: &Context, entity: &IdentityDocument) -> anyhow::Result<()> {
        self.documents.set(ctx, entity).await
    }

    async fn remove(&self, ctx: &Context, key: &str) -> anyhow::Result<()> {
        EntityStore::<IdentityDocument>::remove(&self.documents, ctx, key).await
    }

    async fn query(&self, ctx: &Context, query: &Query) -> anyhow::Result<Page<IdentityDocument>> {
        self.documents.query(ctx, query).await
    }
}

impl EntityStore<IdentityProfile> for TestProvider {
    async fn get(&self, ctx: &Context, key: &str) -> anyhow::Result<Option<IdentityProfile>> {
        self.profiles.get(ctx, key).await
    }

    async fn set(&self, ctx: &Context, entity: &IdentityProfile) -> anyhow::Result<()> {
        self.profiles.set(ctx, entity).await
    }

    async fn remove(&self, ctx: &Context, key: &str) -> anyhow::Result<()> {
        EntityStore::<IdentityProfile>::remove(&self.profiles, ctx, key).await
    }

    async fn query(&self, ctx: &Context, query: &Query) -> anyhow::Result<Page<IdentityProfile>> {
        self.profiles.query(ctx, query).await
    }
}

impl Vault for TestProvider {
    async fn create_key(&self, ctx: &Context, name: &str) -> anyhow::Result<Vec<u8>> {
        self.vault.create_key(ctx, name).await
    }

    async fn rename_key(&self, ctx: &Context, from: &str, to: &str) -> anyhow::Result<()> {
        self.vault.rename_key(ctx, from, to).await
    }

    async fn sign(&self, ctx: &Context, name: &str, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.vault.sign(ctx, name, msg).await
    }

    async fn verify(
        &self, ctx: &Context, name: &str, msg: &[u8], signature: &[u8],
    ) -> anyhow::Result<bool> {
        self.vault.verify(ctx, name, msg, signature).await
    }
}

impl Entropy for TestProvider {
    fn random_bytes(&self) -> [u8; 32] {
        self.entropy.random_bytes()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::provider::Sort;

    #[tokio::test]
    async fn store_query_conditions_and_paging() {
        let store = MemStore::<IdentityDocument>::new();
        let ctx = Context::new("tenant", "caller");

        for (id, controller) in [("did:x:1", "alice"), ("did:x:2", "bob"), ("did:x:3", "alice")] {
            let envelope = IdentityDocument {
                id: id.to_string(),
                document: "{}".to_string(),
                signature: String::new(),
                controller: controller.to_string(),
            };
            store.set(&ctx, &envelope).await.expect("should set");
        }

        let query = Query {
            conditions: vec![Condition {
                property: "controller".to_string(),
                value: json!("alice"),
            }],
            sort: Some(Sort {
                property: "id".to_string(),
                descending: true,
            }),
            page_size: Some(1),
            ..Query::default()
        };

        let page = store.query(&ctx, &query).await.expect("should query");
        assert_eq!(page.total, 2);
        assert_eq!(page.entities[0].id, "did:x:3");
        assert_eq!(page.cursor.as_deref(), Some("1"));

        let query = Query {
            cursor: page.cursor,
            ..query
        };
        let page = store.query(&ctx, &query).await.expect("should query");
        assert_eq!(page.entities[0].id, "did:x:1");
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn vault_rename_preserves_key() {
        let vault = MemVault::default();
        let ctx = Context::new("tenant", "caller");

        let public = vault.create_key(&ctx, "temp-1").await.expect("should create");
        vault.rename_key(&ctx, "temp-1", "final-1").await.expect("should rename");

        let signature = vault.sign(&ctx, "final-1", b"msg").await.expect("should sign");
        assert!(vault.verify(&ctx, "final-1", b"msg", &signature).await.expect("should verify"));
        assert!(vault.sign(&ctx, "temp-1", b"msg").await.is_err());

        // same public key before and after rename
        let verifying = ed25519_dalek::VerifyingKey::from_bytes(
            &public.try_into().expect("32 bytes"),
        )
        .expect("valid key");
        assert!(verifying.verify(b"msg", &ed25519_dalek::Signature::from_slice(&signature).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected() {
        let vault = MemVault::default();
        let ctx = Context::new("tenant", "caller");
        vault.create_key(&ctx, "name").await.expect("should create");
        assert!(vault.create_key(&ctx, "name").await.is_err());
    }
}
