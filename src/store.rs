//! # Document Store Gateway
//!
//! Tamper-evident reads and writes of DID document envelopes. Every write
//! signs the document text with the vault key named after the DID; every
//! read re-verifies that signature before the document is surfaced, so a
//! tampered store is detected at the first read.
//!
//! Writes are last-writer-wins (inherited from the persistence contract):
//! callers needing stronger guarantees must serialize writes per DID
//! outside this crate.

use crate::core::{Context, codec};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::provider::{EntityStore, IdentityDocument, Provider};

/// Read and signature-verify the envelope for a DID.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no envelope exists,
/// [`Error::Integrity`] when the stored document fails vault signature
/// verification, and [`Error::Vault`]/[`Error::Storage`] for collaborator
/// failures.
pub async fn read(provider: &impl Provider, ctx: &Context, did: &str) -> Result<IdentityDocument> {
    tracing::debug!("store::read");

    let envelope = EntityStore::<IdentityDocument>::get(provider, ctx, did)
        .await
        .map_err(|e| Error::storage("readDocument", e))?;
    let Some(envelope) = envelope else {
        return Err(Error::NotFound(format!("document not found: {did}")));
    };

    let signature = codec::b64_decode(&envelope.signature)?;
    let verified = provider
        .verify(ctx, did, envelope.document.as_bytes(), &signature)
        .await
        .map_err(|e| Error::vault("readDocument", e))?;
    if !verified {
        return Err(Error::Integrity(format!("stored document failed verification: {did}")));
    }

    Ok(envelope)
}

/// Read, verify, and parse the DID document for a DID.
///
/// # Errors
///
/// As for [`read`], plus [`Error::Encoding`] when the stored text is not a
/// valid document.
pub async fn read_document(
    provider: &impl Provider, ctx: &Context, did: &str,
) -> Result<Document> {
    let envelope = read(provider, ctx, did).await?;
    serde_json::from_str(&envelope.document).map_err(Error::from)
}

/// Sign and persist a document for a DID.
///
/// # Errors
///
/// Returns [`Error::Vault`] when signing fails and [`Error::Storage`] when
/// persistence fails.
pub async fn write(
    provider: &impl Provider, ctx: &Context, did: &str, document: &str, controller: &str,
) -> Result<IdentityDocument> {
    tracing::debug!("store::write");

    let signature = provider
        .sign(ctx, did, document.as_bytes())
        .await
        .map_err(|e| Error::vault("writeDocument", e))?;

    let envelope = IdentityDocument {
        id: did.to_string(),
        document: document.to_string(),
        signature: codec::b64_encode(&signature),
        controller: controller.to_string(),
    };
    EntityStore::<IdentityDocument>::set(provider, ctx, &envelope)
        .await
        .map_err(|e| Error::storage("writeDocument", e))?;

    Ok(envelope)
}
