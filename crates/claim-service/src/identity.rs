//! Identity & role resolution
//!
//! Maps callers to roles and owns user profiles. Role lookup is a read-only
//! query with a fixed default, so every other component can consult it on
//! each call.

use portal_common::{Caller, Error, Principal, Result, UserProfile, UserRole};
use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::Storage;

pub struct IdentityResolver {
    storage: Arc<dyn Storage>,
}

impl IdentityResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Assigned role, or `user` for an authenticated principal without one and
    /// `guest` for anonymous callers. Only storage failures produce an error.
    pub async fn resolve_role(&self, caller: &Caller) -> Result<UserRole> {
        match caller {
            Caller::Anonymous => Ok(UserRole::Guest),
            Caller::Authenticated(principal) => Ok(self
                .storage
                .get_role(principal)
                .await?
                .unwrap_or(UserRole::User)),
        }
    }

    pub async fn is_admin(&self, caller: &Caller) -> Result<bool> {
        Ok(self.resolve_role(caller).await? == UserRole::Admin)
    }

    /// Upsert the role of `target`. Only admins may assign roles.
    pub async fn assign_role(
        &self,
        acting: &Caller,
        target: &Principal,
        role: UserRole,
    ) -> Result<()> {
        let Some(actor) = acting.principal() else {
            return Err(Error::Unauthorized(
                "Authentication required to assign roles".to_string(),
            ));
        };

        if !self.is_admin(acting).await? {
            warn!("Non-admin {} attempted to assign role {} to {}", actor, role, target);
            return Err(Error::Forbidden("Only admins can assign roles".to_string()));
        }

        self.storage.set_role(target, role).await?;
        info!("{} assigned role {} to {}", actor, role, target);
        Ok(())
    }

    /// Grant `admin` without an acting admin. Used at startup only.
    pub async fn bootstrap_admins(&self, admins: &[Principal]) -> Result<()> {
        for admin in admins {
            self.storage.set_role(admin, UserRole::Admin).await?;
            info!("Bootstrapped admin: {}", admin);
        }
        Ok(())
    }

    pub async fn get_caller_profile(&self, caller: &Caller) -> Result<Option<UserProfile>> {
        match caller.principal() {
            Some(principal) => self.storage.get_profile(principal).await,
            None => Ok(None),
        }
    }

    /// Profile of `principal`, readable by that principal or an admin
    pub async fn get_profile(
        &self,
        caller: &Caller,
        principal: &Principal,
    ) -> Result<Option<UserProfile>> {
        let Some(me) = caller.principal() else {
            return Err(Error::Unauthorized(
                "Authentication required to read profiles".to_string(),
            ));
        };

        if me != principal && !self.is_admin(caller).await? {
            return Err(Error::Forbidden(
                "Can only view your own profile".to_string(),
            ));
        }

        self.storage.get_profile(principal).await
    }

    /// Create or overwrite the caller's own profile. The key is always the
    /// caller, never a parameter.
    pub async fn save_own_profile(&self, caller: &Caller, profile: UserProfile) -> Result<()> {
        let Some(principal) = caller.principal() else {
            return Err(Error::Unauthorized(
                "Authentication required to save a profile".to_string(),
            ));
        };

        profile.validate()?;
        self.storage.put_profile(principal, &profile).await?;
        info!("Saved profile for {}", principal);
        Ok(())
    }
}
