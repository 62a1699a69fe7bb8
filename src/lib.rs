//! Self-custodied decentralized identity: DID documents held in a
//! pluggable, tamper-evident store, and W3C Verifiable Credentials and
//! Presentations secured as EdDSA-signed compact JWTs with
//! bitstring-based revocation.
//!
//! The crate is organized around three engines — [`identity`] for the DID
//! document lifecycle, [`credential`] for issuing, verifying and revoking
//! credentials, and [`presentation`] for bundling credentials for a
//! verifier — plus a [`resolver`] dispatching DIDs to the connector
//! owning their method. Persistence and key custody are supplied by the
//! caller through the [`provider`] traits; in-memory implementations live
//! in [`test_utils`].

pub mod core;
pub mod credential;
pub mod document;
pub mod error;
pub mod identity;
pub mod jose;
pub mod presentation;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod status;
pub mod store;
pub mod test_utils;
pub mod w3c_vc;

pub use crate::core::{Context, Kind, OneMany};
pub use crate::error::{Error, Result};
