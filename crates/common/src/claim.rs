//! Winner claims and their review status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;
use crate::principal::Principal;

/// Review stage of a claim. Admins may move a claim between any two stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Pending,
    AwaitingInfo,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::AwaitingInfo => "awaiting_info",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClaimStatus::Pending),
            "awaiting_info" => Some(ClaimStatus::AwaitingInfo),
            "approved" => Some(ClaimStatus::Approved),
            "rejected" => Some(ClaimStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payout instructions. Exactly one variant, no extra fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    AtmCard(AtmCard),
    CertifiedCheck(CertifiedCheck),
    BankTransfer(BankTransfer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtmCard {
    pub bank: String,
    pub card_type: String,
    pub card_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertifiedCheck {
    pub bank: String,
    pub payee_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankTransfer {
    pub bank: String,
    pub routing_number: String,
    pub account_name: String,
    pub account_number: String,
}

impl PayoutMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            PayoutMethod::AtmCard(_) => "atm_card",
            PayoutMethod::CertifiedCheck(_) => "certified_check",
            PayoutMethod::BankTransfer(_) => "bank_transfer",
        }
    }

    /// Reject blank required fields. Error messages name the field only.
    pub fn validate(&self) -> Result<(), Error> {
        let fields: Vec<(&str, &str)> = match self {
            PayoutMethod::AtmCard(m) => vec![
                ("bank", m.bank.as_str()),
                ("card_type", m.card_type.as_str()),
                ("card_number", m.card_number.as_str()),
            ],
            PayoutMethod::CertifiedCheck(m) => {
                vec![("bank", m.bank.as_str()), ("payee_name", m.payee_name.as_str())]
            }
            PayoutMethod::BankTransfer(m) => vec![
                ("bank", m.bank.as_str()),
                ("routing_number", m.routing_number.as_str()),
                ("account_name", m.account_name.as_str()),
                ("account_number", m.account_number.as_str()),
            ],
        };

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::BadRequest(format!(
                    "{} payout field `{}` must not be empty",
                    self.kind(),
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Claim record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerClaim {
    /// Unique claim identifier
    pub id: String,

    /// Id of the winning entry this claim refers to
    pub winner_id: String,

    /// Submitting principal; immutable after creation
    pub claimant: Principal,

    pub payout_method: PayoutMethod,

    pub status: ClaimStatus,

    /// Set by the service at creation; immutable
    pub submission_timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card_image_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selfie_image_id: Option<String>,

    /// Latest admin message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
}

impl WinnerClaim {
    /// Create a pending claim stamped with the current time
    pub fn new(
        id: String,
        winner_id: String,
        claimant: Principal,
        payout_method: PayoutMethod,
        id_card_image_id: Option<String>,
        selfie_image_id: Option<String>,
    ) -> Self {
        Self {
            id,
            winner_id,
            claimant,
            payout_method,
            status: ClaimStatus::Pending,
            submission_timestamp: Utc::now(),
            id_card_image_id,
            selfie_image_id,
            admin_response: None,
        }
    }
}
