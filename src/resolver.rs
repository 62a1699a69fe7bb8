//! # Resolver
//!
//! Namespace-indexed dispatch of DID operations to connectors. A
//! connector owns one DID method and exposes the full document lifecycle;
//! the resolver routes a DID to the connector registered for its method,
//! falling back to a configured default namespace and finally to a
//! universal connector.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Context;
use crate::document::{Document, MethodRelationship, Service, VerificationMethod};
use crate::error::{Error, Result};
use crate::identity::IdentityEngine;
use crate::provider::Provider;

/// Name under which a catch-all connector may be registered.
pub const FALLBACK_CONNECTOR: &str = "universal";

/// The capability set a DID method connector exposes.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Mint a new identity and its document.
    async fn create_document(&self, ctx: &Context, controller: &str) -> Result<Document>;

    /// Resolve a DID to its current document.
    async fn resolve_document(&self, ctx: &Context, did: &str) -> Result<Document>;

    /// Add a verification method to a document.
    async fn add_verification_method(
        &self, ctx: &Context, did: &str, relationship: MethodRelationship, fragment: Option<&str>,
    ) -> Result<VerificationMethod>;

    /// Remove a verification method by id.
    async fn remove_verification_method(&self, ctx: &Context, method_id: &str) -> Result<()>;

    /// Add a service to a document.
    async fn add_service(&self, ctx: &Context, did: &str, service: Service) -> Result<Service>;

    /// Remove a service by id.
    async fn remove_service(&self, ctx: &Context, did: &str, service_id: &str) -> Result<()>;
}

#[async_trait]
impl<P: Provider + 'static> Connector for IdentityEngine<P> {
    async fn create_document(&self, ctx: &Context, controller: &str) -> Result<Document> {
        Self::create_document(self, ctx, controller).await
    }

    async fn resolve_document(&self, ctx: &Context, did: &str) -> Result<Document> {
        Self::resolve_document(self, ctx, did).await
    }

    async fn add_verification_method(
        &self, ctx: &Context, did: &str, relationship: MethodRelationship, fragment: Option<&str>,
    ) -> Result<VerificationMethod> {
        Self::add_verification_method(self, ctx, did, relationship, fragment).await
    }

    async fn remove_verification_method(&self, ctx: &Context, method_id: &str) -> Result<()> {
        Self::remove_verification_method(self, ctx, method_id).await
    }

    async fn add_service(&self, ctx: &Context, did: &str, service: Service) -> Result<Service> {
        Self::add_service(self, ctx, did, service).await
    }

    async fn remove_service(&self, ctx: &Context, did: &str, service_id: &str) -> Result<()> {
        Self::remove_service(self, ctx, did, service_id).await
    }
}

/// Routes DIDs to the connector owning their method.
#[derive(Clone, Default)]
pub struct Resolver {
    connectors: HashMap<String, Arc<dyn Connector>>,
    default_namespace: Option<String>,
}

impl Resolver {
    /// An empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under a namespace (DID method) name.
    #[must_use]
    pub fn register(mut self, namespace: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        self.connectors.insert(namespace.into(), connector);
        self
    }

    /// Namespace to fall back to when a DID's method has no registered
    /// connector.
    #[must_use]
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// The connector answering for a method: the one registered under it,
    /// else the default namespace's, else the universal connector.
    #[must_use]
    pub fn connector(&self, method: &str) -> Option<&Arc<dyn Connector>> {
        self.connectors
            .get(method)
            .or_else(|| {
                self.default_namespace.as_ref().and_then(|name| self.connectors.get(name))
            })
            .or_else(|| self.connectors.get(FALLBACK_CONNECTOR))
    }

    /// Resolve a DID to its document via the connector owning its method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the identifier is not a
    /// DID, and [`Error::NotFound`] when no connector answers for its
    /// method.
    pub async fn resolve(&self, ctx: &Context, did: &str) -> Result<Document> {
        tracing::debug!("resolver::resolve");

        let Some(rest) = did.strip_prefix("did:") else {
            return Err(Error::InvalidArgument(format!("not a DID: {did}")));
        };
        let method = rest.split(':').next().unwrap_or_default();

        let connector = self
            .connector(method)
            .ok_or_else(|| Error::NotFound(format!("no connector for namespace: {method}")))?;

        connector.resolve_document(ctx, did).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubConnector(&'static str);

    #[async_trait]
    impl Connector for StubConnector {
        async fn create_document(&self, _: &Context, _: &str) -> Result<Document> {
            unimplemented!()
        }

        async fn resolve_document(&self, _: &Context, did: &str) -> Result<Document> {
            let mut document = Document::new(did);
            document.id = format!("{did}@{}", self.0);
            Ok(document)
        }

        async fn add_verification_method(
            &self, _: &Context, _: &str, _: MethodRelationship, _: Option<&str>,
        ) -> Result<VerificationMethod> {
            unimplemented!()
        }

        async fn remove_verification_method(&self, _: &Context, _: &str) -> Result<()> {
            unimplemented!()
        }

        async fn add_service(&self, _: &Context, _: &str, _: Service) -> Result<Service> {
            unimplemented!()
        }

        async fn remove_service(&self, _: &Context, _: &str, _: &str) -> Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn dispatches_by_method() {
        let resolver = Resolver::new()
            .register("gtsc", Arc::new(StubConnector("gtsc")))
            .register("web", Arc::new(StubConnector("web")));
        let ctx = Context::new("tenant", "caller");

        let document = resolver.resolve(&ctx, "did:web:example.com").await.expect("should resolve");
        assert_eq!(document.id, "did:web:example.com@web");
    }

    #[tokio::test]
    async fn falls_back_to_default_then_universal() {
        let ctx = Context::new("tenant", "caller");

        let resolver = Resolver::new()
            .register("gtsc", Arc::new(StubConnector("gtsc")))
            .with_default_namespace("gtsc");
        let document = resolver.resolve(&ctx, "did:key:z6Mk").await.expect("should resolve");
        assert_eq!(document.id, "did:key:z6Mk@gtsc");

        let resolver = Resolver::new().register(FALLBACK_CONNECTOR, Arc::new(StubConnector("any")));
        let document = resolver.resolve(&ctx, "did:key:z6Mk").await.expect("should resolve");
        assert_eq!(document.id, "did:key:z6Mk@any");
    }

    #[tokio::test]
    async fn rejects_non_dids_and_unknown_methods() {
        let resolver = Resolver::new();
        let ctx = Context::new("tenant", "caller");

        let err = resolver.resolve(&ctx, "urn:uuid:1234").await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = resolver.resolve(&ctx, "did:key:z6Mk").await.expect_err("should fail");
        assert!(matches!(err, Error::NotFound(_)));
    }
}
