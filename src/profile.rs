//! # Identity Profiles
//!
//! A thin mapping of per-identity metadata onto the entity store: a flat
//! set of typed properties, each flagged public or private. The public
//! view of a profile filters out private properties; the full view is for
//! the identity itself.

use std::collections::BTreeMap;

use crate::core::Context;
use crate::error::{Error, Result};
use crate::provider::{EntityStore, IdentityProfile, ProfileProperty};

/// Stores and retrieves identity profiles.
#[derive(Clone, Debug)]
pub struct ProfileEngine<P> {
    provider: P,
}

impl<P: EntityStore<IdentityProfile>> ProfileEngine<P> {
    /// An engine backed by the given provider.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Fetch a profile. The public view strips private properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no profile exists for the
    /// identity.
    pub async fn get(
        &self, ctx: &Context, identity: &str, public_only: bool,
    ) -> Result<IdentityProfile> {
        let profile = self
            .provider
            .get(ctx, identity)
            .await
            .map_err(|e| Error::storage("getProfile", e))?
            .ok_or_else(|| Error::NotFound(format!("profile not found: {identity}")))?;

        if !public_only {
            return Ok(profile);
        }

        Ok(IdentityProfile {
            identity: profile.identity,
            properties: profile
                .properties
                .into_iter()
                .filter(|(_, property)| property.is_public)
                .collect(),
        })
    }

    /// Merge properties into a profile, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when persistence fails.
    pub async fn set(
        &self, ctx: &Context, identity: &str, properties: BTreeMap<String, ProfileProperty>,
    ) -> Result<IdentityProfile> {
        let mut profile = self
            .provider
            .get(ctx, identity)
            .await
            .map_err(|e| Error::storage("setProfile", e))?
            .unwrap_or_else(|| IdentityProfile {
                identity: identity.to_string(),
                properties: BTreeMap::new(),
            });

        profile.properties.extend(properties);
        self.provider.set(ctx, &profile).await.map_err(|e| Error::storage("setProfile", e))?;

        Ok(profile)
    }

    /// Remove named properties from a profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no profile exists for the
    /// identity.
    pub async fn remove_properties(
        &self, ctx: &Context, identity: &str, keys: &[&str],
    ) -> Result<IdentityProfile> {
        let mut profile = self
            .provider
            .get(ctx, identity)
            .await
            .map_err(|e| Error::storage("removeProfileProperties", e))?
            .ok_or_else(|| Error::NotFound(format!("profile not found: {identity}")))?;

        for key in keys {
            profile.properties.remove(*key);
        }
        self.provider
            .set(ctx, &profile)
            .await
            .map_err(|e| Error::storage("removeProfileProperties", e))?;

        Ok(profile)
    }
}
