//! Claim store: submission, review and listing of winner claims

use portal_common::{
    Caller, ClaimStatus, Error, PageRequest, PayoutMethod, Principal, Result, UserRole,
    WinnerClaim,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::AccessGate;
use crate::storage::Storage;

/// Client-supplied part of a claim. Status and timestamp are always set by
/// the service.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub id: Option<String>,
    pub winner_id: String,
    pub claimant: Principal,
    pub payout_method: PayoutMethod,
    pub id_card_image_id: Option<String>,
    pub selfie_image_id: Option<String>,
}

#[derive(Clone)]
pub struct ClaimStore {
    storage: Arc<dyn Storage>,
    gate: AccessGate,
    max_page_size: u64,
}

impl ClaimStore {
    pub fn new(storage: Arc<dyn Storage>, gate: AccessGate, max_page_size: u64) -> Self {
        Self {
            storage,
            gate,
            max_page_size,
        }
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Record a new claim as `pending`. The claimant must be the caller.
    pub async fn submit(&self, caller: &Caller, new_claim: NewClaim) -> Result<WinnerClaim> {
        let principal = self.gate.require_user(caller, "submit a claim").await?;

        if &new_claim.claimant != principal {
            return Err(Error::Unauthorized(
                "Claimant must be the calling principal".to_string(),
            ));
        }

        new_claim.payout_method.validate()?;

        let id = match new_claim.id {
            Some(id) if id.trim().is_empty() => {
                return Err(Error::BadRequest("Claim id must not be empty".to_string()))
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let claim = WinnerClaim::new(
            id,
            new_claim.winner_id,
            new_claim.claimant,
            new_claim.payout_method,
            new_claim.id_card_image_id,
            new_claim.selfie_image_id,
        );

        if !self.storage.insert_claim(&claim).await? {
            return Err(Error::Conflict(format!("Claim already exists: {}", claim.id)));
        }

        info!(
            "Claim {} submitted by {} for entry {} ({})",
            claim.id,
            claim.claimant,
            claim.winner_id,
            claim.payout_method.kind()
        );
        Ok(claim)
    }

    /// Admin listing in submission order, optionally filtered by status
    pub async fn get_all_claims(
        &self,
        caller: &Caller,
        status: Option<ClaimStatus>,
        page: PageRequest,
    ) -> Result<Vec<WinnerClaim>> {
        self.gate.require_admin(caller, "list all claims").await?;
        let page = page.bounded(self.max_page_size)?;

        let claims = self.storage.list_claims().await?;
        Ok(page.slice(
            claims
                .into_iter()
                .filter(|c| status.map_or(true, |s| c.status == s)),
        ))
    }

    /// The caller's own claims, same ordering and paging as the admin listing
    pub async fn get_my_claims(
        &self,
        caller: &Caller,
        status: Option<ClaimStatus>,
        page: PageRequest,
    ) -> Result<Vec<WinnerClaim>> {
        let principal = self.gate.require_user(caller, "list claims").await?;
        let page = page.bounded(self.max_page_size)?;

        let claims = self.storage.list_claims().await?;
        Ok(page.slice(claims.into_iter().filter(|c| {
            &c.claimant == principal && status.map_or(true, |s| c.status == s)
        })))
    }

    /// A single claim, visible to admins and its claimant. Anyone else sees
    /// `NotFound`.
    pub async fn get_claim(&self, caller: &Caller, id: &str) -> Result<WinnerClaim> {
        let principal = self.gate.require_user(caller, "view a claim").await?;
        let not_found = || Error::NotFound(format!("Claim not found: {}", id));

        let claim = self.storage.get_claim(id).await?.ok_or_else(not_found)?;
        if &claim.claimant == principal || self.gate.role(caller).await? == UserRole::Admin {
            Ok(claim)
        } else {
            debug!("{} requested claim {} owned by someone else", principal, id);
            Err(not_found())
        }
    }

    /// Move a claim to any status
    pub async fn update_claim_status(
        &self,
        caller: &Caller,
        id: &str,
        status: ClaimStatus,
    ) -> Result<()> {
        let admin = self.gate.require_admin(caller, "update claim status").await?;

        if !self.storage.set_claim_status(id, status).await? {
            return Err(Error::NotFound(format!("Claim not found: {}", id)));
        }

        info!("{} set claim {} to {}", admin, id, status);
        Ok(())
    }

    /// Replace the admin message on a claim
    pub async fn admin_response(&self, caller: &Caller, id: &str, response: &str) -> Result<()> {
        let admin = self.gate.require_admin(caller, "respond to a claim").await?;

        if !self.storage.set_admin_response(id, response).await? {
            return Err(Error::NotFound(format!("Claim not found: {}", id)));
        }

        info!("{} responded to claim {}", admin, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityResolver;
    use crate::storage::MemoryStorage;
    use portal_common::{BankTransfer, CertifiedCheck, ErrorKind};

    fn principal(id: &str) -> Principal {
        Principal::new(id).unwrap()
    }

    fn caller(id: &str) -> Caller {
        Caller::from(principal(id))
    }

    fn check(payee: &str) -> PayoutMethod {
        PayoutMethod::CertifiedCheck(CertifiedCheck {
            bank: "First Bank".to_string(),
            payee_name: payee.to_string(),
        })
    }

    fn new_claim(id: Option<&str>, claimant: &str) -> NewClaim {
        NewClaim {
            id: id.map(str::to_string),
            winner_id: "e1".to_string(),
            claimant: principal(claimant),
            payout_method: check(claimant),
            id_card_image_id: Some("img-1".to_string()),
            selfie_image_id: None,
        }
    }

    async fn store(max_page_size: u64) -> ClaimStore {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let identity = Arc::new(IdentityResolver::new(storage.clone()));
        identity.bootstrap_admins(&[principal("root")]).await.unwrap();
        ClaimStore::new(storage, AccessGate::new(identity), max_page_size)
    }

    #[tokio::test]
    async fn test_submit_sets_pending_and_generates_id() {
        let store = store(100).await;

        let claim = store
            .submit(&caller("alice"), new_claim(None, "alice"))
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(Uuid::parse_str(&claim.id).is_ok());
        assert_eq!(claim.id_card_image_id.as_deref(), Some("img-1"));

        let fixed = store
            .submit(&caller("alice"), new_claim(Some("c1"), "alice"))
            .await
            .unwrap();
        assert_eq!(fixed.id, "c1");

        let err = store
            .submit(&caller("alice"), new_claim(Some("c1"), "alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // The rejected duplicate did not overwrite the original
        let stored = store.get_claim(&caller("alice"), "c1").await.unwrap();
        assert_eq!(stored.submission_timestamp, fixed.submission_timestamp);
    }

    #[tokio::test]
    async fn test_submit_rejects_impersonation_and_bad_payout() {
        let store = store(100).await;

        let err = store
            .submit(&caller("mallory"), new_claim(None, "alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = store
            .submit(&Caller::Anonymous, new_claim(None, "alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut blank = new_claim(None, "alice");
        blank.payout_method = PayoutMethod::BankTransfer(BankTransfer {
            bank: "B".to_string(),
            routing_number: "021000021".to_string(),
            account_name: "Alice".to_string(),
            account_number: String::new(),
        });
        let err = store.submit(&caller("alice"), blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.to_string().contains("account_number"));
    }

    #[tokio::test]
    async fn test_pagination_over_25_claims() {
        let store = store(100).await;
        for i in 0..25 {
            store
                .submit(&caller("alice"), new_claim(Some(&format!("c{:02}", i)), "alice"))
                .await
                .unwrap();
        }

        let admin = caller("root");
        let mut seen = Vec::new();
        for (page, expected) in [(0, 10), (1, 10), (2, 5), (3, 0)] {
            let claims = store
                .get_all_claims(&admin, None, PageRequest::new(page, 10))
                .await
                .unwrap();
            assert_eq!(claims.len(), expected, "page {}", page);
            seen.extend(claims.into_iter().map(|c| c.id));
        }

        let expected: Vec<String> = (0..25).map(|i| format!("c{:02}", i)).collect();
        assert_eq!(seen, expected);

        let err = store
            .get_all_claims(&admin, None, PageRequest::new(0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_page_size_is_capped() {
        let store = store(3).await;
        for i in 0..5 {
            store
                .submit(&caller("alice"), new_claim(Some(&format!("c{}", i)), "alice"))
                .await
                .unwrap();
        }

        let claims = store
            .get_all_claims(&caller("root"), None, PageRequest::new(0, 50))
            .await
            .unwrap();
        assert_eq!(claims.len(), 3);
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let store = store(100).await;
        store
            .submit(&caller("alice"), new_claim(Some("a1"), "alice"))
            .await
            .unwrap();
        store
            .submit(&caller("bob"), new_claim(Some("b1"), "bob"))
            .await
            .unwrap();
        store
            .submit(&caller("alice"), new_claim(Some("a2"), "alice"))
            .await
            .unwrap();

        let err = store
            .get_all_claims(&caller("alice"), None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mine = store
            .get_my_claims(&caller("alice"), None, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<&str> = mine.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);

        store
            .update_claim_status(&caller("root"), "a2", ClaimStatus::Approved)
            .await
            .unwrap();
        let approved = store
            .get_all_claims(
                &caller("root"),
                Some(ClaimStatus::Approved),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, "a2");

        // Someone else's claim is indistinguishable from a missing one
        let err = store.get_claim(&caller("bob"), "a1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.get_claim(&caller("root"), "a1").await.is_ok());
    }

    #[tokio::test]
    async fn test_admin_review() {
        let store = store(100).await;
        store
            .submit(&caller("alice"), new_claim(Some("c1"), "alice"))
            .await
            .unwrap();

        let err = store
            .update_claim_status(&caller("alice"), "c1", ClaimStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = store
            .admin_response(&caller("alice"), "c1", "approve me")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // Transitions are unrestricted, including back to pending
        for status in [
            ClaimStatus::Approved,
            ClaimStatus::AwaitingInfo,
            ClaimStatus::Pending,
            ClaimStatus::Rejected,
        ] {
            store
                .update_claim_status(&caller("root"), "c1", status)
                .await
                .unwrap();
        }
        store
            .admin_response(&caller("root"), "c1", "Missing selfie")
            .await
            .unwrap();

        let claim = store.get_claim(&caller("alice"), "c1").await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Rejected);
        assert_eq!(claim.admin_response.as_deref(), Some("Missing selfie"));
        assert_eq!(claim.claimant.as_str(), "alice");
        assert_eq!(claim.winner_id, "e1");

        let err = store
            .update_claim_status(&caller("root"), "missing", ClaimStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store
            .admin_response(&caller("root"), "missing", "hello")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_demoted_user_cannot_submit() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let identity = Arc::new(IdentityResolver::new(storage.clone()));
        identity.bootstrap_admins(&[principal("root")]).await.unwrap();
        identity
            .assign_role(&caller("root"), &principal("alice"), UserRole::Guest)
            .await
            .unwrap();

        let store = ClaimStore::new(storage, AccessGate::new(identity), 100);
        let err = store
            .submit(&caller("alice"), new_claim(None, "alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
