//! # Verifiable Presentations
//!
//! [Verifiable Presentations](https://www.w3.org/TR/vc-data-model/#presentations-0)
//! combine one or more credentials for presentation to a verifier. In this
//! crate the bundled credentials are always compact JWTs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Kind, OneMany};

/// A W3C Verifiable Presentation bundling credential JWTs.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiablePresentation {
    /// The @context property maps property URIs into short-form aliases.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// The presentation type(s). Always contains
    /// `VerifiablePresentation`.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The presented credentials, as compact JWTs.
    pub verifiable_credential: Vec<String>,

    /// The DID of the entity generating the presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
}
