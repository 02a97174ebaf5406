//! Access control gate shared by every mutating and listing operation

use portal_common::{Caller, Error, Principal, Result, UserRole};
use std::sync::Arc;
use tracing::warn;

use crate::identity::IdentityResolver;

#[derive(Clone)]
pub struct AccessGate {
    identity: Arc<IdentityResolver>,
}

impl AccessGate {
    pub fn new(identity: Arc<IdentityResolver>) -> Self {
        Self { identity }
    }

    pub async fn role(&self, caller: &Caller) -> Result<UserRole> {
        self.identity.resolve_role(caller).await
    }

    /// Require an authenticated caller holding `user` or `admin`.
    ///
    /// Anonymous callers get `Unauthorized`; principals demoted to `guest`
    /// get `Forbidden`.
    pub async fn require_user<'a>(&self, caller: &'a Caller, action: &str) -> Result<&'a Principal> {
        let Some(principal) = caller.principal() else {
            return Err(Error::Unauthorized(format!(
                "Authentication required to {}",
                action
            )));
        };

        match self.role(caller).await? {
            UserRole::Admin | UserRole::User => Ok(principal),
            UserRole::Guest => {
                warn!("Guest {} denied: {}", principal, action);
                Err(Error::Forbidden(format!("Guests cannot {}", action)))
            }
        }
    }

    /// Require an admin caller
    pub async fn require_admin<'a>(
        &self,
        caller: &'a Caller,
        action: &str,
    ) -> Result<&'a Principal> {
        let Some(principal) = caller.principal() else {
            return Err(Error::Unauthorized(format!(
                "Authentication required to {}",
                action
            )));
        };

        if self.role(caller).await? != UserRole::Admin {
            warn!("Non-admin {} denied: {}", principal, action);
            return Err(Error::Forbidden(format!("Only admins can {}", action)));
        }

        Ok(principal)
    }
}
