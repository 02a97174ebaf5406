//! Storage backends for roles, profiles, entries, claims and testimonials
//!
//! Every mutation a backend exposes is atomic per record: two writers on the
//! same record are serialised, writers on different records do not block each
//! other.

mod memory;
mod redis_store;

pub use self::memory::MemoryStorage;
pub use self::redis_store::RedisStorage;

use async_trait::async_trait;
use portal_common::{
    Activation, ClaimStatus, Principal, Result, Testimonial, UserProfile, UserRole, WinnerClaim,
    WinningEntry,
};

/// Result of an activation attempt on a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// This call flipped the entry to claimed; carries the updated entry
    Activated(WinningEntry),
    /// The entry was already claimed before this call
    AlreadyClaimed,
    NotFound,
}

/// Result of inserting a winning entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryInsert {
    Inserted,
    /// An entry with this id already exists
    DuplicateId,
    /// The prize number belongs to another entry
    DuplicatePrizeNumber,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Assigned role, if any
    async fn get_role(&self, principal: &Principal) -> Result<Option<UserRole>>;

    async fn set_role(&self, principal: &Principal, role: UserRole) -> Result<()>;

    async fn get_profile(&self, principal: &Principal) -> Result<Option<UserProfile>>;

    async fn put_profile(&self, principal: &Principal, profile: &UserProfile) -> Result<()>;

    async fn insert_entry(&self, entry: &WinningEntry) -> Result<EntryInsert>;

    async fn get_entry(&self, id: &str) -> Result<Option<WinningEntry>>;

    async fn find_entry_by_prize_number(&self, prize_number: &str)
        -> Result<Option<WinningEntry>>;

    /// All entries in insertion order
    async fn list_entries(&self) -> Result<Vec<WinningEntry>>;

    /// Atomic check-and-set of the entry's claim state
    async fn activate_entry(&self, id: &str, activation: Activation)
        -> Result<ActivationOutcome>;

    /// Insert a claim; `Ok(false)` if the id is taken
    async fn insert_claim(&self, claim: &WinnerClaim) -> Result<bool>;

    async fn get_claim(&self, id: &str) -> Result<Option<WinnerClaim>>;

    /// All claims in insertion order
    async fn list_claims(&self) -> Result<Vec<WinnerClaim>>;

    /// Overwrite the status; `Ok(false)` if the claim does not exist
    async fn set_claim_status(&self, id: &str, status: ClaimStatus) -> Result<bool>;

    /// Overwrite the admin response; `Ok(false)` if the claim does not exist
    async fn set_admin_response(&self, id: &str, response: &str) -> Result<bool>;

    /// Insert, or replace in place when the name exists
    async fn upsert_testimonial(&self, testimonial: &Testimonial) -> Result<()>;

    /// `Ok(false)` if nothing was removed
    async fn remove_testimonial(&self, name: &str) -> Result<bool>;

    /// All testimonials in insertion order
    async fn list_testimonials(&self) -> Result<Vec<Testimonial>>;
}
