//! # Presentation Engine
//!
//! Bundles issued credential JWTs into W3C Verifiable Presentations
//! signed by the holder, and verifies presentations: the holder's
//! document is integrity-checked and every embedded credential has its
//! issuer resolved and its revocation bit consulted.

use chrono::{TimeDelta, Utc};
use serde_json::Value;

use crate::core::{Context, Kind, OneMany};
use crate::credential;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::jose::jws::{self, Protected};
use crate::provider::Provider;
use crate::store;
use crate::w3c_vc::jose::{VpClaim, VpClaims};
use crate::w3c_vc::vp::VerifiablePresentation;
use crate::w3c_vc::{BASE_CONTEXT, VP_TYPE};

/// A request to create a presentation.
#[derive(Clone, Debug, Default)]
pub struct PresentationRequest {
    /// Id of the holder's verification method (and vault key) signing the
    /// presentation. The holder DID is the id's prefix before `#`.
    pub presentation_method_id: String,

    /// Presentation types, appended to `VerifiablePresentation`.
    pub types: Vec<String>,

    /// JSON-LD contexts, appended to the base credentials context.
    pub contexts: Vec<String>,

    /// The credentials to present, as compact JWTs.
    pub credentials: Vec<String>,

    /// Minutes until the presentation expires. No `exp` claim when absent.
    pub expires_in_minutes: Option<i64>,
}

/// A created presentation: the data-model object and its signed JWT form.
#[derive(Clone, Debug)]
pub struct IssuedPresentation {
    /// The presentation as created.
    pub verifiable_presentation: VerifiablePresentation,

    /// The presentation as a signed compact JWT.
    pub jwt: String,
}

/// The outcome of verifying a presentation JWT.
#[derive(Clone, Debug)]
pub struct PresentationVerification {
    /// Whether any presented credential has been revoked.
    pub revoked: bool,

    /// The verified presentation.
    pub verifiable_presentation: Option<VerifiablePresentation>,

    /// The documents of the issuers of the presented credentials, in
    /// presentation order.
    pub issuers: Option<Vec<Document>>,
}

/// Creates and verifies presentations.
#[derive(Clone, Debug)]
pub struct PresentationEngine<P> {
    provider: P,
}

impl<P: Provider> PresentationEngine<P> {
    /// An engine backed by the given provider.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Create a presentation signed by the holder's verification method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the method id has no fragment or
    /// the holder document/method is unknown, [`Error::InvalidState`] when
    /// the method lacks key material, and [`Error::Vault`] when signing
    /// fails.
    pub async fn create(
        &self, ctx: &Context, request: PresentationRequest,
    ) -> Result<IssuedPresentation> {
        tracing::debug!("presentation::create");

        let method_id = &request.presentation_method_id;
        let Some((holder_did, _)) = method_id.split_once('#') else {
            return Err(Error::NotFound(format!("method id has no fragment: {method_id}")));
        };

        let document = store::read_document(&self.provider, ctx, holder_did).await?;
        let method = document
            .find_method(method_id)
            .ok_or_else(|| Error::NotFound(format!("verification method not found: {method_id}")))?;
        if method.public_key_jwk.as_ref().is_none_or(|jwk| jwk.x.is_empty()) {
            return Err(Error::InvalidState(format!("method has no key material: {method_id}")));
        }

        let mut type_ = vec![VP_TYPE.to_string()];
        type_.extend(request.types.iter().cloned());

        let mut context = vec![Kind::String(BASE_CONTEXT.to_string())];
        context.extend(request.contexts.iter().cloned().map(Kind::String));

        let verifiable_presentation = VerifiablePresentation {
            context,
            type_: OneMany::Many(type_),
            verifiable_credential: request.credentials.clone(),
            holder: Some(holder_did.to_string()),
        };

        let now = Utc::now();
        let claims = VpClaims {
            iss: holder_did.to_string(),
            nbf: now,
            exp: request.expires_in_minutes.and_then(|minutes| {
                TimeDelta::try_minutes(minutes)
                    .and_then(|delta| now.checked_add_signed(delta))
            }),
            vp: VpClaim::from(&verifiable_presentation),
        };

        let header = Protected::new(method_id.clone());
        let jwt = jws::encode(&header, &claims, |msg| async move {
            self.provider.sign(ctx, method_id, &msg).await
        })
        .await?;

        Ok(IssuedPresentation {
            verifiable_presentation,
            jwt,
        })
    }

    /// Verify a presentation JWT: the holder's document is loaded and
    /// integrity-checked, and each presented credential is decoded, its
    /// issuer document resolved, and its revocation bit consulted. Any
    /// revoked credential makes the whole presentation `revoked`.
    ///
    /// A store may refuse to serve a revoked identity outright rather
    /// than publish its bitstring. When resolving a presented credential
    /// fails with an error that mentions revocation, the presentation is
    /// reported revoked (with no presentation or issuers) instead of the
    /// error propagating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed token and
    /// [`Error::NotFound`]/[`Error::Integrity`] when the holder or an
    /// issuer document cannot be loaded.
    pub async fn verify(
        &self, ctx: &Context, presentation_jwt: &str,
    ) -> Result<PresentationVerification> {
        tracing::debug!("presentation::verify");

        let decoded = jws::decode(presentation_jwt)
            .map_err(|e| Error::InvalidArgument(format!("malformed presentation: {e}")))?;
        let Some(holder_did) = decoded.claims.get("iss").and_then(Value::as_str) else {
            return Err(Error::InvalidArgument("presentation has no holder".to_string()));
        };

        store::read(&self.provider, ctx, holder_did).await?;

        let mut vp_value =
            decoded.claims.get("vp").cloned().unwrap_or_else(|| serde_json::json!({}));
        if let Value::Object(vp_map) = &mut vp_value {
            vp_map.insert("holder".to_string(), Value::String(holder_did.to_string()));
        }
        let verifiable_presentation: VerifiablePresentation =
            serde_json::from_value(vp_value).map_err(Error::from)?;

        let mut issuers = Vec::new();
        let mut revoked = false;
        for credential_jwt in &verifiable_presentation.verifiable_credential {
            match self.check_credential(ctx, credential_jwt).await {
                Ok((issuer_document, credential_revoked)) => {
                    issuers.push(issuer_document);
                    revoked = revoked || credential_revoked;
                }
                // a collaborator refusing a revoked identity reads as
                // revocation, not as a failure
                Err(e) if e.to_string().to_lowercase().contains("revoked") => {
                    return Ok(PresentationVerification {
                        revoked: true,
                        verifiable_presentation: None,
                        issuers: None,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(PresentationVerification {
            revoked,
            verifiable_presentation: Some(verifiable_presentation),
            issuers: Some(issuers),
        })
    }

    /// Decode one presented credential, resolve its issuer, and read its
    /// revocation bit.
    async fn check_credential(
        &self, ctx: &Context, credential_jwt: &str,
    ) -> Result<(Document, bool)> {
        let decoded = jws::decode(credential_jwt)
            .map_err(|e| Error::InvalidArgument(format!("malformed credential: {e}")))?;
        let Some(issuer_did) = decoded.claims.get("iss").and_then(Value::as_str) else {
            return Err(Error::InvalidArgument("credential has no issuer".to_string()));
        };

        let issuer_document = store::read_document(&self.provider, ctx, issuer_did).await?;

        let verifiable_credential = credential::rebuild_credential(&decoded.claims)?;
        let revoked = credential::is_revoked(
            &issuer_document,
            verifiable_credential.credential_status.as_ref(),
        );

        Ok((issuer_document, revoked))
    }
}
