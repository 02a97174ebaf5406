//! In-process storage backend
//!
//! Catalog-level `RwLock`s guard only membership and order. Each record sits
//! behind its own `Mutex`, so mutations of one record never wait on another.

use async_trait::async_trait;
use portal_common::{
    Activation, ClaimStatus, Principal, Result, Testimonial, UserProfile, UserRole, WinnerClaim,
    WinningEntry,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{ActivationOutcome, EntryInsert, Storage};

type Shared<T> = Arc<Mutex<T>>;

/// Insertion-ordered set of individually locked records
struct Catalog<T> {
    order: Vec<Shared<T>>,
    by_id: HashMap<String, Shared<T>>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T: Clone> Catalog<T> {
    fn get(&self, id: &str) -> Option<Shared<T>> {
        self.by_id.get(id).cloned()
    }

    fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn insert(&mut self, id: String, value: T) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }
        let record = Arc::new(Mutex::new(value));
        self.order.push(record.clone());
        self.by_id.insert(id, record);
        true
    }

    fn handles(&self) -> Vec<Shared<T>> {
        self.order.clone()
    }
}

/// Copy every record, locking one at a time
async fn snapshot<T: Clone>(handles: Vec<Shared<T>>) -> Vec<T> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.lock().await.clone());
    }
    out
}

#[derive(Default)]
struct EntryCatalog {
    records: Catalog<WinningEntry>,
    by_prize_number: HashMap<String, String>,
}

/// Storage kept entirely in memory; contents are lost on restart
#[derive(Default)]
pub struct MemoryStorage {
    roles: RwLock<HashMap<Principal, UserRole>>,
    profiles: RwLock<HashMap<Principal, UserProfile>>,
    entries: RwLock<EntryCatalog>,
    claims: RwLock<Catalog<WinnerClaim>>,
    testimonials: RwLock<Vec<Testimonial>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_role(&self, principal: &Principal) -> Result<Option<UserRole>> {
        Ok(self.roles.read().await.get(principal).copied())
    }

    async fn set_role(&self, principal: &Principal, role: UserRole) -> Result<()> {
        self.roles.write().await.insert(principal.clone(), role);
        Ok(())
    }

    async fn get_profile(&self, principal: &Principal) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(principal).cloned())
    }

    async fn put_profile(&self, principal: &Principal, profile: &UserProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(principal.clone(), profile.clone());
        Ok(())
    }

    async fn insert_entry(&self, entry: &WinningEntry) -> Result<EntryInsert> {
        let mut entries = self.entries.write().await;

        if entries.records.contains(&entry.id) {
            return Ok(EntryInsert::DuplicateId);
        }
        if entries.by_prize_number.contains_key(&entry.prize_number) {
            return Ok(EntryInsert::DuplicatePrizeNumber);
        }

        entries
            .by_prize_number
            .insert(entry.prize_number.clone(), entry.id.clone());
        entries.records.insert(entry.id.clone(), entry.clone());
        Ok(EntryInsert::Inserted)
    }

    async fn get_entry(&self, id: &str) -> Result<Option<WinningEntry>> {
        let handle = self.entries.read().await.records.get(id);
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_entry_by_prize_number(
        &self,
        prize_number: &str,
    ) -> Result<Option<WinningEntry>> {
        let handle = {
            let entries = self.entries.read().await;
            entries
                .by_prize_number
                .get(prize_number)
                .and_then(|id| entries.records.get(id))
        };
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list_entries(&self) -> Result<Vec<WinningEntry>> {
        let handles = self.entries.read().await.records.handles();
        Ok(snapshot(handles).await)
    }

    async fn activate_entry(
        &self,
        id: &str,
        activation: Activation,
    ) -> Result<ActivationOutcome> {
        let Some(handle) = self.entries.read().await.records.get(id) else {
            return Ok(ActivationOutcome::NotFound);
        };

        // Check and set under the entry's own lock
        let mut entry = handle.lock().await;
        if entry.activate(activation) {
            Ok(ActivationOutcome::Activated(entry.clone()))
        } else {
            Ok(ActivationOutcome::AlreadyClaimed)
        }
    }

    async fn insert_claim(&self, claim: &WinnerClaim) -> Result<bool> {
        Ok(self
            .claims
            .write()
            .await
            .insert(claim.id.clone(), claim.clone()))
    }

    async fn get_claim(&self, id: &str) -> Result<Option<WinnerClaim>> {
        let handle = self.claims.read().await.get(id);
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list_claims(&self) -> Result<Vec<WinnerClaim>> {
        let handles = self.claims.read().await.handles();
        Ok(snapshot(handles).await)
    }

    async fn set_claim_status(&self, id: &str, status: ClaimStatus) -> Result<bool> {
        let Some(handle) = self.claims.read().await.get(id) else {
            return Ok(false);
        };
        handle.lock().await.status = status;
        Ok(true)
    }

    async fn set_admin_response(&self, id: &str, response: &str) -> Result<bool> {
        let Some(handle) = self.claims.read().await.get(id) else {
            return Ok(false);
        };
        handle.lock().await.admin_response = Some(response.to_string());
        Ok(true)
    }

    async fn upsert_testimonial(&self, testimonial: &Testimonial) -> Result<()> {
        let mut testimonials = self.testimonials.write().await;
        match testimonials.iter_mut().find(|t| t.name == testimonial.name) {
            Some(existing) => *existing = testimonial.clone(),
            None => testimonials.push(testimonial.clone()),
        }
        Ok(())
    }

    async fn remove_testimonial(&self, name: &str) -> Result<bool> {
        let mut testimonials = self.testimonials.write().await;
        let before = testimonials.len();
        testimonials.retain(|t| t.name != name);
        Ok(testimonials.len() != before)
    }

    async fn list_testimonials(&self) -> Result<Vec<Testimonial>> {
        Ok(self.testimonials.read().await.clone())
    }
}
