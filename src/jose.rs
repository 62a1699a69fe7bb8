//! # JSON Object Signing and Encryption (JOSE)
//!
//! The subset of JWT [RFC7519], JWS [RFC7515], and JWK [RFC7517] needed to
//! secure DID documents and Verifiable Credentials: Ed25519 keys in JWK
//! form and EdDSA-signed compact JWTs. No other algorithms are supported.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

pub mod jwa;
pub mod jwk;
pub mod jws;

pub use jwa::Algorithm;
pub use jwk::PublicKeyJwk;
pub use jws::{DecodedJwt, Protected};
