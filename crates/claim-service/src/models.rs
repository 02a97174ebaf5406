//! HTTP request and response bodies

use portal_common::{
    ClaimStatus, EntryView, PayoutMethod, Principal, Testimonial, UserProfile, UserRole,
    WinnerClaim,
};
use serde::{Deserialize, Serialize};

use crate::claims::NewClaim;

/// Request to submit a claim. Unknown fields such as `status` or
/// `submission_timestamp` are ignored.
#[derive(Debug, Deserialize)]
pub struct SubmitClaimRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub winner_id: String,
    pub claimant: Principal,
    pub payout_method: PayoutMethod,
    #[serde(default)]
    pub id_card_image_id: Option<String>,
    #[serde(default)]
    pub selfie_image_id: Option<String>,
}

impl From<SubmitClaimRequest> for NewClaim {
    fn from(req: SubmitClaimRequest) -> Self {
        NewClaim {
            id: req.id,
            winner_id: req.winner_id,
            claimant: req.claimant,
            payout_method: req.payout_method,
            id_card_image_id: req.id_card_image_id,
            selfie_image_id: req.selfie_image_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub prize_number: String,
    pub ticket_number: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ClaimStatus,
}

#[derive(Debug, Deserialize)]
pub struct AdminResponseRequest {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: UserRole,
}

/// Query string of claim listings
#[derive(Debug, Default, Deserialize)]
pub struct ListClaimsQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: EntryView,
}

/// Lookup result; `entry` is null when the prize number is unknown
#[derive(Debug, Serialize)]
pub struct EntryLookupResponse {
    pub entry: Option<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct EntriesListResponse {
    pub entries: Vec<EntryView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub claim: WinnerClaim,
}

#[derive(Debug, Serialize)]
pub struct ClaimsListResponse {
    pub claims: Vec<WinnerClaim>,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Serialize)]
pub struct TestimonialsListResponse {
    pub testimonials: Vec<Testimonial>,
}
