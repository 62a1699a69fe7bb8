//! # Credential Engine
//!
//! Issues and verifies W3C Verifiable Credentials as EdDSA-signed compact
//! JWTs, and maintains the issuer's revocation bitstring. Issuance signs
//! with the vault key named after the issuing verification method;
//! verification needs only the issuer's DID document.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::core::{Context, Kind, OneMany};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::jose::jws::{self, Protected};
use crate::provider::Provider;
use crate::status::{self, Bitstring};
use crate::store;
use crate::w3c_vc::jose::VcClaims;
use crate::w3c_vc::vc::{CredentialStatus, CredentialSubject, VerifiableCredential};
use crate::w3c_vc::{BASE_CONTEXT, VC_TYPE};

/// A request to issue a credential.
#[derive(Clone, Debug, Default)]
pub struct CredentialRequest {
    /// Id of the verification method (and vault key) signing the
    /// credential. The issuer DID is the id's prefix before `#`.
    pub verification_method_id: String,

    /// Credential id, carried as `jti`.
    pub credential_id: Option<String>,

    /// Credential types, appended to `VerifiableCredential`.
    pub types: Vec<String>,

    /// JSON-LD contexts, appended to the base credentials context.
    pub contexts: Vec<String>,

    /// Claims about the credential subject(s).
    pub subject: OneMany<CredentialSubject>,

    /// Index into the issuer's revocation bitstring. Only recorded when
    /// the issuer document publishes a revocation service.
    pub revocation_index: Option<usize>,
}

/// An issued credential: the data-model object and its signed JWT form.
#[derive(Clone, Debug)]
pub struct IssuedCredential {
    /// The credential as issued.
    pub verifiable_credential: VerifiableCredential,

    /// The credential as a signed compact JWT.
    pub jwt: String,
}

/// The outcome of verifying a credential JWT.
#[derive(Clone, Debug)]
pub struct CredentialVerification {
    /// Whether the credential has been revoked.
    pub revoked: bool,

    /// The verified credential; absent when revoked.
    pub verifiable_credential: Option<VerifiableCredential>,
}

/// Issues, verifies, and revokes credentials.
#[derive(Clone, Debug)]
pub struct CredentialEngine<P> {
    provider: P,
}

impl<P: Provider> CredentialEngine<P> {
    /// An engine backed by the given provider.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Issue a credential signed by the given verification method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the method id has no fragment or
    /// the issuer document/method is unknown, [`Error::InvalidState`] when
    /// the method lacks key material, and [`Error::Vault`] when signing
    /// fails.
    pub async fn create(&self, ctx: &Context, request: CredentialRequest) -> Result<IssuedCredential> {
        tracing::debug!("credential::create");

        let method_id = &request.verification_method_id;
        let Some((issuer_did, _)) = method_id.split_once('#') else {
            return Err(Error::NotFound(format!("method id has no fragment: {method_id}")));
        };

        let document = store::read_document(&self.provider, ctx, issuer_did).await?;
        let method = document
            .find_method(method_id)
            .ok_or_else(|| Error::NotFound(format!("verification method not found: {method_id}")))?;
        if method.public_key_jwk.as_ref().is_none_or(|jwk| jwk.x.is_empty()) {
            return Err(Error::InvalidState(format!("method has no key material: {method_id}")));
        }

        let mut type_ = vec![VC_TYPE.to_string()];
        type_.extend(request.types.iter().cloned());

        let mut context = vec![Kind::String(BASE_CONTEXT.to_string())];
        context.extend(request.contexts.iter().cloned().map(Kind::String));

        let credential_status = request
            .revocation_index
            .and_then(|index| Some((index, revocation_service(&document)?)))
            .map(|(index, service)| CredentialStatus {
                id: service.id.clone(),
                type_: service.primary_type().cloned().unwrap_or_default(),
                revocation_bitmap_index: index.to_string(),
            });

        let now = Utc::now();
        let verifiable_credential = VerifiableCredential {
            context,
            id: request.credential_id.clone(),
            type_: OneMany::Many(type_),
            credential_subject: request.subject.clone(),
            issuer: Some(issuer_did.to_string()),
            issuance_date: Some(now),
            credential_status,
        };

        let claims = VcClaims::from_vc(&verifiable_credential, now);
        let header = Protected::new(method_id.clone());
        let jwt = jws::encode(&header, &claims, |msg| async move {
            self.provider.sign(ctx, method_id, &msg).await
        })
        .await?;

        Ok(IssuedCredential {
            verifiable_credential,
            jwt,
        })
    }

    /// Verify a credential JWT: its structure, its issuer signature, and
    /// its revocation status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed token,
    /// [`Error::NotFound`]/[`Error::Integrity`] when the issuer document
    /// cannot be loaded, [`Error::InvalidState`] when the signing method
    /// lacks key material, and [`Error::Signature`] when the signature
    /// does not verify.
    pub async fn verify(&self, ctx: &Context, credential_jwt: &str) -> Result<CredentialVerification> {
        tracing::debug!("credential::verify");

        let decoded = jws::decode(credential_jwt)
            .map_err(|e| Error::InvalidArgument(format!("malformed credential: {e}")))?;
        let Some(issuer_did) = decoded.claims.get("iss").and_then(Value::as_str) else {
            return Err(Error::InvalidArgument("credential has no issuer".to_string()));
        };

        let document = store::read_document(&self.provider, ctx, issuer_did).await?;

        let Some(kid) = decoded.header.kid.as_deref() else {
            return Err(Error::InvalidArgument("credential header has no kid".to_string()));
        };
        let method = document
            .find_method(kid)
            .ok_or_else(|| Error::NotFound(format!("verification method not found: {kid}")))?;
        let jwk = method
            .public_key_jwk
            .as_ref()
            .filter(|jwk| !jwk.x.is_empty())
            .ok_or_else(|| Error::InvalidState(format!("method has no key material: {kid}")))?;

        let public_key = jwk.public_key()?;
        jws::verify(&decoded.signing_input, &decoded.signature, &public_key)?;

        let verifiable_credential = rebuild_credential(&decoded.claims)?;
        let revoked = is_revoked(&document, verifiable_credential.credential_status.as_ref());

        Ok(CredentialVerification {
            revoked,
            verifiable_credential: if revoked { None } else { Some(verifiable_credential) },
        })
    }

    /// Mark the given bitstring indices revoked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the issuer publishes no revocation
    /// service and [`Error::InvalidArgument`] for out-of-range indices.
    pub async fn revoke(&self, ctx: &Context, issuer_did: &str, indices: &[usize]) -> Result<()> {
        self.set_revocation(ctx, issuer_did, indices, true).await
    }

    /// Clear the given bitstring indices.
    ///
    /// # Errors
    ///
    /// As for [`Self::revoke`].
    pub async fn unrevoke(&self, ctx: &Context, issuer_did: &str, indices: &[usize]) -> Result<()> {
        self.set_revocation(ctx, issuer_did, indices, false).await
    }

    async fn set_revocation(
        &self, ctx: &Context, issuer_did: &str, indices: &[usize], value: bool,
    ) -> Result<()> {
        tracing::debug!("credential::set_revocation");

        let envelope = store::read(&self.provider, ctx, issuer_did).await?;
        let mut document: Document = serde_json::from_str(&envelope.document)?;

        let service = revocation_service(&document).ok_or_else(|| {
            Error::NotFound(format!("no revocation service on document: {issuer_did}"))
        })?;
        let endpoint = service
            .endpoint_str()
            .ok_or_else(|| Error::Encoding("revocation endpoint is not a string".to_string()))?;

        let mut bits = Bitstring::from_endpoint(endpoint)?;
        for &index in indices {
            bits.set(index, value)?;
        }

        let mut service = service.clone();
        service.service_endpoint = Kind::String(bits.to_endpoint()?);
        document.insert_service(service);

        let json = serde_json::to_string(&document)?;
        store::write(&self.provider, ctx, issuer_did, &json, &envelope.controller).await?;

        Ok(())
    }
}

/// The first service on the document whose id ends in `#revocation`.
pub(crate) fn revocation_service(document: &Document) -> Option<&crate::document::Service> {
    document.find_service(|service| {
        service.id.ends_with(&format!("#{}", status::REVOCATION_FRAGMENT))
    })
}

/// Whether a credential's status entry points at a set bit in the issuer's
/// revocation bitstring. Any parse failure along the way means "not
/// revoked".
pub(crate) fn is_revoked(document: &Document, credential_status: Option<&CredentialStatus>) -> bool {
    let Some(status) = credential_status else {
        return false;
    };
    let Ok(index) = status.revocation_bitmap_index.parse::<usize>() else {
        return false;
    };
    let Some(service) = revocation_service(document) else {
        return false;
    };
    if service.primary_type().map(String::as_str) != Some(status::STATUS_LIST_TYPE) {
        return false;
    }
    let Some(endpoint) = service.endpoint_str() else {
        return false;
    };
    let Ok(bits) = Bitstring::from_endpoint(endpoint) else {
        return false;
    };
    bits.get(index).unwrap_or(false)
}

/// Rebuild the credential object from a decoded JWT's claims: the `vc`
/// claim plus its registered-claim counterparts (`jti`, `iss`, `nbf`,
/// `sub`).
pub(crate) fn rebuild_credential(claims: &Value) -> Result<VerifiableCredential> {
    let mut vc_value = claims.get("vc").cloned().unwrap_or_else(|| json!({}));

    if let Value::Object(vc_map) = &mut vc_value {
        if let Some(jti) = claims.get("jti").and_then(Value::as_str) {
            vc_map.insert("id".to_string(), json!(jti));
        }
        if let Some(iss) = claims.get("iss").and_then(Value::as_str) {
            vc_map.insert("issuer".to_string(), json!(iss));
        }
        if let Some(nbf) = claims.get("nbf").and_then(Value::as_i64) {
            if let Some(date) = DateTime::<Utc>::from_timestamp(nbf, 0) {
                vc_map.insert(
                    "issuanceDate".to_string(),
                    json!(date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
                );
            }
        }
        if let Some(sub) = claims.get("sub").and_then(Value::as_str) {
            attach_subject_id(vc_map, sub);
        }
    }

    serde_json::from_value(vc_value).map_err(Error::from)
}

fn attach_subject_id(vc_map: &mut Map<String, Value>, sub: &str) {
    match vc_map.get_mut("credentialSubject") {
        Some(Value::Object(subject)) => {
            subject.insert("id".to_string(), json!(sub));
        }
        Some(Value::Array(subjects)) => {
            for subject in subjects {
                if let Value::Object(subject) = subject {
                    subject.insert("id".to_string(), json!(sub));
                }
            }
        }
        _ => {}
    }
}
