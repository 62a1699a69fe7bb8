//! # Verifiable Credentials
//!
//! Data model types from the family of W3C Recommendations for Verifiable
//! Credentials (<https://www.w3.org/TR/vc-data-model/>), together with the
//! claim shapes used when a credential or presentation is secured as a
//! compact JWT.

pub mod jose;
pub mod vc;
pub mod vp;

pub use self::vc::{CredentialStatus, CredentialSubject, VerifiableCredential};
pub use self::vp::VerifiablePresentation;

/// Base JSON-LD context of issued credentials and presentations.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Base type of every verifiable credential.
pub const VC_TYPE: &str = "VerifiableCredential";

/// Base type of every verifiable presentation.
pub const VP_TYPE: &str = "VerifiablePresentation";
