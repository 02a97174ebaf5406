//! Entry registry: the catalog of winning entries and their one-time
//! activation.

use portal_common::{Activation, Caller, EntryView, Error, Result, UserRole, WinningEntry};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::access::AccessGate;
use crate::storage::{ActivationOutcome, EntryInsert, Storage};

/// Summary of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct EntryRegistry {
    storage: Arc<dyn Storage>,
    gate: AccessGate,
}

impl EntryRegistry {
    pub fn new(storage: Arc<dyn Storage>, gate: AccessGate) -> Self {
        Self { storage, gate }
    }

    /// Insert seeded entries. Existing ids are skipped; a prize number already
    /// bound to another id aborts the import.
    pub async fn import(&self, entries: Vec<WinningEntry>) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for entry in entries {
            match self.storage.insert_entry(&entry).await? {
                EntryInsert::Inserted => report.inserted += 1,
                EntryInsert::DuplicateId => {
                    debug!("Entry already present, skipping: {}", entry.id);
                    report.skipped += 1;
                }
                EntryInsert::DuplicatePrizeNumber => {
                    return Err(Error::Conflict(format!(
                        "Prize number {} is already bound to another entry",
                        entry.prize_number
                    )));
                }
            }
        }

        info!(
            "Imported winning entries: {} inserted, {} skipped",
            report.inserted, report.skipped
        );
        Ok(report)
    }

    /// Public lookup by prize number. The ticket number is never included.
    pub async fn get_entry_by_number(&self, prize_number: &str) -> Result<Option<EntryView>> {
        Ok(self
            .storage
            .find_entry_by_prize_number(prize_number)
            .await?
            .map(|entry| entry.redacted()))
    }

    /// Check a prize/ticket pair. Unknown prize numbers and wrong tickets fail
    /// identically.
    pub async fn verify(&self, prize_number: &str, ticket_number: &str) -> Result<EntryView> {
        match self.storage.find_entry_by_prize_number(prize_number).await? {
            Some(entry) if entry.matches(prize_number, ticket_number) => Ok(entry.redacted()),
            _ => {
                debug!("Verification failed for prize number {}", prize_number);
                Err(Error::InvalidVerification)
            }
        }
    }

    /// Activate an entry for the caller. Of any number of concurrent callers
    /// on one entry, exactly one succeeds.
    pub async fn claim_winning_entry(&self, caller: &Caller, entry_id: &str) -> Result<EntryView> {
        let principal = self.gate.require_user(caller, "claim a winning entry").await?;

        let outcome = self
            .storage
            .activate_entry(entry_id, Activation::now(principal.clone()))
            .await?;

        match outcome {
            ActivationOutcome::Activated(entry) => {
                info!("Entry {} activated by {}", entry_id, principal);
                Ok(entry.redacted())
            }
            ActivationOutcome::AlreadyClaimed => {
                warn!("Entry {} already claimed; rejected {}", entry_id, principal);
                Err(Error::AlreadyClaimed)
            }
            ActivationOutcome::NotFound => Err(Error::NotFound(format!(
                "Winning entry not found: {}",
                entry_id
            ))),
        }
    }

    /// Full catalog. Admins see ticket numbers; everyone else gets the
    /// redacted view.
    pub async fn get_all_winning_entries(&self, caller: &Caller) -> Result<Vec<EntryView>> {
        let entries = self.storage.list_entries().await?;
        let is_admin = self.gate.role(caller).await? == UserRole::Admin;

        Ok(entries
            .iter()
            .map(|entry| {
                if is_admin {
                    entry.full_view()
                } else {
                    entry.redacted()
                }
            })
            .collect())
    }
}
