//! Winning entries: one prize slot each, activated at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::principal::Principal;

/// Winning entry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningEntry {
    /// Stable entry identifier
    pub id: String,

    /// Public lookup key
    pub prize_number: String,

    /// Secret verification key; never leaves the service for non-admins
    pub ticket_number: String,

    /// Prize description
    pub name: String,

    is_claimed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    claimed_by: Option<Principal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    claim_timestamp: Option<DateTime<Utc>>,
}

/// The claim state written by a successful activation. The claimant and the
/// instant always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub claimed_by: Principal,
    pub claim_timestamp: DateTime<Utc>,
}

impl Activation {
    pub fn now(claimed_by: Principal) -> Self {
        Self {
            claimed_by,
            claim_timestamp: Utc::now(),
        }
    }
}

impl WinningEntry {
    /// Create an unclaimed entry
    pub fn new(
        id: impl Into<String>,
        prize_number: impl Into<String>,
        ticket_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prize_number: prize_number.into(),
            ticket_number: ticket_number.into(),
            name: name.into(),
            is_claimed: false,
            claimed_by: None,
            claim_timestamp: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.is_claimed
    }

    pub fn claimed_by(&self) -> Option<&Principal> {
        self.claimed_by.as_ref()
    }

    pub fn claim_timestamp(&self) -> Option<DateTime<Utc>> {
        self.claim_timestamp
    }

    pub fn activation(&self) -> Option<Activation> {
        match (&self.claimed_by, self.claim_timestamp) {
            (Some(claimed_by), Some(claim_timestamp)) if self.is_claimed => Some(Activation {
                claimed_by: claimed_by.clone(),
                claim_timestamp,
            }),
            _ => None,
        }
    }

    /// Apply an activation if the entry is still unclaimed.
    ///
    /// Returns `false` and leaves the entry untouched when it was already
    /// claimed. Callers must hold the entry's lock across this call.
    pub fn activate(&mut self, activation: Activation) -> bool {
        if self.is_claimed {
            return false;
        }
        self.is_claimed = true;
        self.claimed_by = Some(activation.claimed_by);
        self.claim_timestamp = Some(activation.claim_timestamp);
        true
    }

    /// Rebuild an entry from its base record and a separately stored activation
    pub fn with_activation(mut self, activation: Option<Activation>) -> Self {
        if let Some(activation) = activation {
            self.is_claimed = false;
            self.activate(activation);
        }
        self
    }

    /// Exact, case-sensitive match on both keys. The ticket comparison runs in
    /// constant time.
    pub fn matches(&self, prize_number: &str, ticket_number: &str) -> bool {
        let ticket_ok: bool = self
            .ticket_number
            .as_bytes()
            .ct_eq(ticket_number.as_bytes())
            .into();
        self.prize_number == prize_number && ticket_ok
    }

    /// View with the ticket number removed
    pub fn redacted(&self) -> EntryView {
        EntryView {
            ticket_number: None,
            ..self.full_view()
        }
    }

    /// View including the ticket number (admins only)
    pub fn full_view(&self) -> EntryView {
        EntryView {
            id: self.id.clone(),
            prize_number: self.prize_number.clone(),
            ticket_number: Some(self.ticket_number.clone()),
            name: self.name.clone(),
            is_claimed: self.is_claimed,
            claimed_by: self.claimed_by.clone(),
            claim_timestamp: self.claim_timestamp,
        }
    }
}

/// Caller-facing projection of a [`WinningEntry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub id: String,
    pub prize_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    pub name: String,
    pub is_claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_timestamp: Option<DateTime<Utc>>,
}
