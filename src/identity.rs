//! # Identity Engine
//!
//! The DID document lifecycle: minting identities, resolving their
//! documents, and controller-bound mutation of verification methods and
//! services. All state lives behind the provider traits; every mutation
//! reads the current envelope through the tamper-evident gateway, applies
//! the change to the typed document, and writes a freshly signed envelope
//! back.

use crate::core::{Context, OneMany, codec};
use crate::document::{Document, MethodRelationship, Service, VerificationMethod};
use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::status::{self, Bitstring};
use crate::store;

/// The DID method tag used when none is configured.
pub const DEFAULT_METHOD: &str = "gtsc";

/// Manages DID documents held in a signed store.
#[derive(Clone, Debug)]
pub struct IdentityEngine<P> {
    provider: P,
    method: String,
}

impl<P: Provider> IdentityEngine<P> {
    /// An engine minting DIDs under the default method tag.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_method(provider, DEFAULT_METHOD)
    }

    /// An engine minting DIDs under the given method tag.
    #[must_use]
    pub fn with_method(provider: P, method: impl Into<String>) -> Self {
        Self {
            provider,
            method: method.into(),
        }
    }

    /// The DID method tag this engine mints under.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The provider backing this engine.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mint a new identity: a fresh DID, a vault key named after it, and
    /// an initial document carrying an empty revocation bitstring service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vault`] when key creation or signing fails, and
    /// [`Error::Storage`] when the envelope cannot be persisted.
    pub async fn create_document(&self, ctx: &Context, controller: &str) -> Result<Document> {
        tracing::debug!("identity::create_document");

        let did = format!("did:{}:0x{}", self.method, codec::hex_encode(&self.provider.random_bytes()));
        self.provider
            .create_key(ctx, &did)
            .await
            .map_err(|e| Error::vault("createDocument", e))?;

        let mut document = Document::new(&did);
        document.insert_service(Service::new(
            format!("{did}#{}", status::REVOCATION_FRAGMENT),
            OneMany::One(status::STATUS_LIST_TYPE.to_string()),
            Bitstring::new().to_endpoint()?,
        ));

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, &did, &json, controller).await?;

        Ok(document)
    }

    /// Resolve a DID to its current document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown DID and
    /// [`Error::Integrity`] when the stored document fails verification.
    pub async fn resolve_document(&self, ctx: &Context, did: &str) -> Result<Document> {
        tracing::debug!("identity::resolve_document");
        store::read_document(&self.provider, ctx, did).await
    }

    /// Add a verification method to a document under the given
    /// relationship. The keypair is created in the vault under a temporary
    /// name and atomically renamed to the final method id
    /// `<did>#<fragment>`, where the fragment defaults to the key id
    /// derived from the public key.
    ///
    /// Adding a method whose id matches an existing one replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown DID, [`Error::Vault`]
    /// when key creation or renaming fails, and [`Error::Storage`] when
    /// persistence fails.
    pub async fn add_verification_method(
        &self, ctx: &Context, did: &str, relationship: MethodRelationship, fragment: Option<&str>,
    ) -> Result<VerificationMethod> {
        tracing::debug!("identity::add_verification_method");

        let envelope = store::read(&self.provider, ctx, did).await?;
        let mut document: Document = serde_json::from_str(&envelope.document)?;

        let temp_name = format!("temp-{}", codec::b64url_encode(&self.provider.random_bytes()));
        let public_key = self
            .provider
            .create_key(ctx, &temp_name)
            .await
            .map_err(|e| Error::vault("addVerificationMethod", e))?;

        let method = VerificationMethod::from_public_key(did, &public_key, fragment);
        self.provider
            .rename_key(ctx, &temp_name, &method.id)
            .await
            .map_err(|e| Error::vault("addVerificationMethod", e))?;

        document.add_method(relationship, method.clone());

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, did, &json, &envelope.controller).await?;

        Ok(method)
    }

    /// Remove a verification method by its fully-qualified id. The DID is
    /// the id's prefix before `#`. When the containing relationship
    /// empties, the property is dropped from the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id has no `#` or no method
    /// matches.
    pub async fn remove_verification_method(&self, ctx: &Context, method_id: &str) -> Result<()> {
        tracing::debug!("identity::remove_verification_method");

        let Some((did, _)) = method_id.split_once('#') else {
            return Err(Error::NotFound(format!("method id has no fragment: {method_id}")));
        };

        let envelope = store::read(&self.provider, ctx, did).await?;
        let mut document: Document = serde_json::from_str(&envelope.document)?;

        if !document.remove_method(method_id) {
            return Err(Error::NotFound(format!("verification method not found: {method_id}")));
        }

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, did, &json, &envelope.controller).await?;

        Ok(())
    }

    /// Add a service to a document, replacing any service with the same
    /// id. A bare-fragment service id is qualified as `<did>#<fragment>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown DID and
    /// [`Error::Storage`] when persistence fails.
    pub async fn add_service(
        &self, ctx: &Context, did: &str, mut service: Service,
    ) -> Result<Service> {
        tracing::debug!("identity::add_service");

        let envelope = store::read(&self.provider, ctx, did).await?;
        let mut document: Document = serde_json::from_str(&envelope.document)?;

        service.id = Self::qualify(did, &service.id);
        document.insert_service(service.clone());

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, did, &json, &envelope.controller).await?;

        Ok(service)
    }

    /// Remove a service by id (bare fragments are qualified). The
    /// `service` property is dropped when it empties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no service matches the id.
    pub async fn remove_service(&self, ctx: &Context, did: &str, service_id: &str) -> Result<()> {
        tracing::debug!("identity::remove_service");

        let envelope = store::read(&self.provider, ctx, did).await?;
        let mut document: Document = serde_json::from_str(&envelope.document)?;

        let service_id = Self::qualify(did, service_id);
        if !document.remove_service(&service_id) {
            return Err(Error::NotFound(format!("service not found: {service_id}")));
        }

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, did, &json, &envelope.controller).await?;

        Ok(())
    }

    fn qualify(did: &str, service_id: &str) -> String {
        if service_id.contains('#') {
            service_id.to_string()
        } else {
            format!("{did}#{service_id}")
        }
    }
}
