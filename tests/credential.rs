//! Tests for credential issuance, verification and revocation.

use credibil_identity::credential::{CredentialEngine, CredentialRequest};
use credibil_identity::document::MethodRelationship;
use credibil_identity::identity::IdentityEngine;
use credibil_identity::status::STATUS_LIST_TYPE;
use credibil_identity::test_utils::TestProvider;
use credibil_identity::w3c_vc::CredentialSubject;
use credibil_identity::{Context, Error, OneMany};
use serde_json::json;

struct Issuer {
    identity: IdentityEngine<TestProvider>,
    credentials: CredentialEngine<TestProvider>,
    ctx: Context,
    did: String,
    method_id: String,
}

impl Issuer {
    async fn new() -> Self {
        let provider = TestProvider::new();
        let identity = IdentityEngine::new(provider.clone());
        let credentials = CredentialEngine::new(provider);
        let ctx = Context::new("tenant", "caller");

        let document =
            identity.create_document(&ctx, "issuer-controller").await.expect("should create");
        let method = identity
            .add_verification_method(&ctx, &document.id, MethodRelationship::AssertionMethod, None)
            .await
            .expect("should add");

        Self {
            identity,
            credentials,
            ctx,
            did: document.id,
            method_id: method.id,
        }
    }

    fn person_request(&self, revocation_index: Option<usize>) -> CredentialRequest {
        CredentialRequest {
            verification_method_id: self.method_id.clone(),
            credential_id: Some("https://example.com/credentials/1".to_string()),
            types: vec!["Person".to_string()],
            contexts: vec!["http://schema.org/".to_string()],
            subject: OneMany::One(CredentialSubject {
                id: None,
                claims: json!({"@type": "Person", "name": "Jane Doe"})
                    .as_object()
                    .unwrap()
                    .clone(),
            }),
            revocation_index,
        }
    }
}

#[tokio::test]
async fn issued_credential_carries_status_and_three_segments() {
    let issuer = Issuer::new().await;
    let issued = issuer
        .credentials
        .create(&issuer.ctx, issuer.person_request(Some(5)))
        .await
        .expect("should issue");

    assert_eq!(issued.jwt.split('.').count(), 3);

    let vc = &issued.verifiable_credential;
    assert_eq!(vc.issuer.as_deref(), Some(issuer.did.as_str()));
    assert!(vc.issuance_date.is_some());
    assert_eq!(
        vc.type_.as_many(),
        Some(&["VerifiableCredential".to_string(), "Person".to_string()][..])
    );
    assert_eq!(vc.context.len(), 2);

    let status = vc.credential_status.as_ref().expect("should have status");
    assert_eq!(status.id, format!("{}#revocation", issuer.did));
    assert_eq!(status.type_, STATUS_LIST_TYPE);
    assert_eq!(status.revocation_bitmap_index, "5");
}

#[tokio::test]
async fn verify_roundtrip_reattaches_subject_id() {
    let issuer = Issuer::new().await;

    let mut request = issuer.person_request(None);
    request.subject = OneMany::One(CredentialSubject {
        id: Some("did:example:subject".to_string()),
        claims: json!({"name": "Jane Doe"}).as_object().unwrap().clone(),
    });
    let issued = issuer.credentials.create(&issuer.ctx, request).await.expect("should issue");

    // the subject id is carried by `sub`, not inside the `vc` claim
    let decoded = credibil_identity::jose::jws::decode(&issued.jwt).expect("should decode");
    assert_eq!(decoded.claims["sub"], json!("did:example:subject"));
    assert!(decoded.claims["vc"]["credentialSubject"].get("id").is_none());
    assert_eq!(decoded.header.kid.as_deref(), Some(issuer.method_id.as_str()));

    let verification =
        issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect("should verify");
    assert!(!verification.revoked);

    let vc = verification.verifiable_credential.expect("should return credential");
    assert_eq!(
        vc.credential_subject.as_one().and_then(|s| s.id.as_deref()),
        Some("did:example:subject")
    );
    assert_eq!(vc.id.as_deref(), Some("https://example.com/credentials/1"));
    assert_eq!(vc.issuer.as_deref(), Some(issuer.did.as_str()));
    assert!(vc.issuance_date.is_some());
}

#[tokio::test]
async fn revoke_then_unrevoke() {
    let issuer = Issuer::new().await;
    let issued = issuer
        .credentials
        .create(&issuer.ctx, issuer.person_request(Some(5)))
        .await
        .expect("should issue");

    issuer.credentials.revoke(&issuer.ctx, &issuer.did, &[5]).await.expect("should revoke");

    let verification =
        issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect("should verify");
    assert!(verification.revoked);
    assert!(verification.verifiable_credential.is_none());

    issuer.credentials.unrevoke(&issuer.ctx, &issuer.did, &[5]).await.expect("should unrevoke");

    let verification =
        issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect("should verify");
    assert!(!verification.revoked);
    assert!(verification.verifiable_credential.is_some());
}

#[tokio::test]
async fn revoking_a_different_index_does_not_affect_the_credential() {
    let issuer = Issuer::new().await;
    let issued = issuer
        .credentials
        .create(&issuer.ctx, issuer.person_request(Some(5)))
        .await
        .expect("should issue");

    issuer.credentials.revoke(&issuer.ctx, &issuer.did, &[4, 6]).await.expect("should revoke");

    let verification =
        issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect("should verify");
    assert!(!verification.revoked);
}

#[tokio::test]
async fn revocation_index_without_service_issues_without_status() {
    let issuer = Issuer::new().await;
    issuer
        .identity
        .remove_service(&issuer.ctx, &issuer.did, "revocation")
        .await
        .expect("should remove");

    let issued = issuer
        .credentials
        .create(&issuer.ctx, issuer.person_request(Some(5)))
        .await
        .expect("should issue");
    assert!(issued.verifiable_credential.credential_status.is_none());

    // and a credential without status always verifies unrevoked
    let verification =
        issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect("should verify");
    assert!(!verification.revoked);
    assert!(verification.verifiable_credential.is_some());
}

#[tokio::test]
async fn out_of_range_revocation_index_is_rejected() {
    let issuer = Issuer::new().await;
    let err = issuer
        .credentials
        .revoke(&issuer.ctx, &issuer.did, &[131_072])
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn tampered_jwt_fails_signature_verification() {
    let issuer = Issuer::new().await;
    let issued =
        issuer.credentials.create(&issuer.ctx, issuer.person_request(None)).await.expect("issue");

    // splice different claims into the signed token
    let parts = issued.jwt.split('.').collect::<Vec<&str>>();
    let decoded = credibil_identity::jose::jws::decode(&issued.jwt).expect("should decode");
    let mut claims = decoded.claims;
    claims["jti"] = json!("https://example.com/credentials/2");
    let claims_b64 = base64url(&serde_json::to_vec(&claims).unwrap());
    let tampered = format!("{}.{claims_b64}.{}", parts[0], parts[2]);

    let err = issuer.credentials.verify(&issuer.ctx, &tampered).await.expect_err("should fail");
    assert!(matches!(err, Error::Signature(_)));
}

#[tokio::test]
async fn malformed_jwt_is_invalid_argument() {
    let issuer = Issuer::new().await;

    let err = issuer.credentials.verify(&issuer.ctx, "not-a-jwt").await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = issuer.credentials.verify(&issuer.ctx, "a.b.c").await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn unknown_signing_method_is_not_found() {
    let issuer = Issuer::new().await;
    let issued =
        issuer.credentials.create(&issuer.ctx, issuer.person_request(None)).await.expect("issue");

    issuer
        .identity
        .remove_verification_method(&issuer.ctx, &issuer.method_id)
        .await
        .expect("should remove");

    let err = issuer.credentials.verify(&issuer.ctx, &issued.jwt).await.expect_err("should fail");
    assert!(matches!(err, Error::NotFound(_)));
}

fn base64url(data: &[u8]) -> String {
    use base64ct::{Base64UrlUnpadded, Encoding};
    Base64UrlUnpadded::encode_string(data)
}
