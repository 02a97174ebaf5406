//! API request handlers for the claim service

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use portal_common::{
    Caller, ClaimStatus, Error, ErrorKind, PageRequest, Principal, Testimonial, UserProfile,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    access::AccessGate,
    claims::ClaimStore,
    entries::EntryRegistry,
    identity::IdentityResolver,
    models::{
        AdminResponseRequest, AssignRoleRequest, ClaimResponse, ClaimsListResponse,
        EntriesListResponse, EntryLookupResponse, EntryResponse, IsAdminResponse,
        ListClaimsQuery, ProfileResponse, RoleResponse, SubmitClaimRequest, SuccessResponse,
        TestimonialsListResponse, UpdateStatusRequest, VerifyRequest,
    },
    storage::Storage,
    testimonials::TestimonialCatalog,
};

/// Header carrying the authenticated principal, set by the fronting gateway.
/// Missing or blank means anonymous.
pub const CALLER_HEADER: &str = "x-caller-principal";

/// Shared application state
pub struct AppState {
    pub identity: Arc<IdentityResolver>,
    pub entries: EntryRegistry,
    pub claims: ClaimStore,
    pub testimonials: TestimonialCatalog,
}

impl AppState {
    /// Wire every component to one storage backend
    pub fn new(storage: Arc<dyn Storage>, max_page_size: u64) -> Self {
        let identity = Arc::new(IdentityResolver::new(storage.clone()));
        let gate = AccessGate::new(identity.clone());

        Self {
            entries: EntryRegistry::new(storage.clone(), gate.clone()),
            claims: ClaimStore::new(storage.clone(), gate.clone(), max_page_size),
            testimonials: TestimonialCatalog::new(storage, gate),
            identity,
        }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::AlreadyClaimed => StatusCode::CONFLICT,
            ErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.0.is_internal() {
            error!("Request failed: {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "kind": kind,
        });

        (status, Json(body)).into_response()
    }
}

/// Resolve the caller from request headers
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Principal::new(v).ok())
        .map(Caller::Authenticated)
        .unwrap_or(Caller::Anonymous)
}

/// Unwrap a JSON body, reporting malformed payloads as `BadRequest`
fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

fn page_request(query: &ListClaimsQuery, max_page_size: u64) -> Result<PageRequest, Error> {
    let defaults = PageRequest::default();
    PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.page_size.unwrap_or(defaults.page_size),
    )
    .bounded(max_page_size)
}

fn status_filter(query: &ListClaimsQuery) -> Result<Option<ClaimStatus>, Error> {
    query
        .status
        .as_deref()
        .map(|raw| {
            ClaimStatus::parse(raw)
                .ok_or_else(|| Error::BadRequest(format!("Unknown claim status: {}", raw)))
        })
        .transpose()
}

fn principal_param(raw: String) -> Result<Principal, Error> {
    Principal::new(raw)
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "claim-service"
    }))
}

// Identity

pub async fn get_role_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RoleResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let role = state.identity.resolve_role(&caller).await?;
    Ok(Json(RoleResponse { role }))
}

pub async fn is_admin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<IsAdminResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let is_admin = state.identity.is_admin(&caller).await?;
    Ok(Json(IsAdminResponse { is_admin }))
}

pub async fn assign_role_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(principal): Path<String>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let payload = json_payload(payload)?;
    let caller = caller_from_headers(&headers);
    let target = principal_param(principal)?;

    state
        .identity
        .assign_role(&caller, &target, payload.role)
        .await?;

    Ok(Json(SuccessResponse::new(format!(
        "Assigned role {} to {}",
        payload.role, target
    ))))
}

pub async fn get_my_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let profile = state.identity.get_caller_profile(&caller).await?;
    Ok(Json(ProfileResponse { profile }))
}

pub async fn save_my_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    profile: Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let profile = json_payload(profile)?;
    let caller = caller_from_headers(&headers);
    state.identity.save_own_profile(&caller, profile).await?;
    Ok(Json(SuccessResponse::new("Profile saved")))
}

pub async fn get_user_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(principal): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let principal = principal_param(principal)?;
    let profile = state.identity.get_profile(&caller, &principal).await?;
    Ok(Json(ProfileResponse { profile }))
}

// Entries

pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<EntriesListResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let entries = state.entries.get_all_winning_entries(&caller).await?;
    let total = entries.len();
    Ok(Json(EntriesListResponse { entries, total }))
}

pub async fn get_entry_by_number_handler(
    State(state): State<Arc<AppState>>,
    Path(prize_number): Path<String>,
) -> Result<Json<EntryLookupResponse>, ApiError> {
    let entry = state.entries.get_entry_by_number(&prize_number).await?;
    Ok(Json(EntryLookupResponse { entry }))
}

pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<EntryResponse>, ApiError> {
    let payload = json_payload(payload)?;
    let entry = state
        .entries
        .verify(&payload.prize_number, &payload.ticket_number)
        .await?;
    Ok(Json(EntryResponse { entry }))
}

pub async fn claim_entry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<Json<EntryResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    info!("Claim attempt on entry {} by {}", entry_id, caller);

    let entry = state.entries.claim_winning_entry(&caller, &entry_id).await?;
    Ok(Json(EntryResponse { entry }))
}

// Claims

pub async fn submit_claim_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SubmitClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    let payload = json_payload(payload)?;
    let caller = caller_from_headers(&headers);
    let claim = state.claims.submit(&caller, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse { claim })))
}

pub async fn list_claims_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ListClaimsQuery>, QueryRejection>,
) -> Result<Json<ClaimsListResponse>, ApiError> {
    let query = query_params(query)?;
    let caller = caller_from_headers(&headers);
    let page = page_request(&query, state.claims.max_page_size())?;
    let status = status_filter(&query)?;

    let claims = state.claims.get_all_claims(&caller, status, page).await?;
    Ok(Json(ClaimsListResponse {
        claims,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn list_my_claims_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ListClaimsQuery>, QueryRejection>,
) -> Result<Json<ClaimsListResponse>, ApiError> {
    let query = query_params(query)?;
    let caller = caller_from_headers(&headers);
    let page = page_request(&query, state.claims.max_page_size())?;
    let status = status_filter(&query)?;

    let claims = state.claims.get_my_claims(&caller, status, page).await?;
    Ok(Json(ClaimsListResponse {
        claims,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn get_claim_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    let claim = state.claims.get_claim(&caller, &id).await?;
    Ok(Json(ClaimResponse { claim }))
}

pub async fn update_claim_status_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let payload = json_payload(payload)?;
    let caller = caller_from_headers(&headers);
    state
        .claims
        .update_claim_status(&caller, &id, payload.status)
        .await?;

    Ok(Json(SuccessResponse::new(format!(
        "Claim {} is now {}",
        id, payload.status
    ))))
}

pub async fn admin_response_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<AdminResponseRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let payload = json_payload(payload)?;
    let caller = caller_from_headers(&headers);
    state
        .claims
        .admin_response(&caller, &id, &payload.response)
        .await?;

    Ok(Json(SuccessResponse::new(format!(
        "Response recorded for claim {}",
        id
    ))))
}

// Testimonials

pub async fn list_testimonials_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestimonialsListResponse>, ApiError> {
    let testimonials = state.testimonials.list().await?;
    Ok(Json(TestimonialsListResponse { testimonials }))
}

pub async fn add_testimonial_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    testimonial: Result<Json<Testimonial>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let testimonial = json_payload(testimonial)?;
    let caller = caller_from_headers(&headers);
    let name = testimonial.name.clone();
    state.testimonials.add(&caller, testimonial).await?;
    Ok(Json(SuccessResponse::new(format!(
        "Testimonial published: {}",
        name
    ))))
}

pub async fn remove_testimonial_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = caller_from_headers(&headers);
    state.testimonials.remove(&caller, &name).await?;
    Ok(Json(SuccessResponse::new(format!(
        "Testimonial removed: {}",
        name
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_from_headers(&headers), Caller::Anonymous);

        headers.insert(CALLER_HEADER, HeaderValue::from_static("   "));
        assert_eq!(caller_from_headers(&headers), Caller::Anonymous);

        headers.insert(CALLER_HEADER, HeaderValue::from_static(" alice "));
        assert_eq!(
            caller_from_headers(&headers),
            Caller::Authenticated(Principal::new("alice").unwrap())
        );
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let response = ApiError(Error::Redis("connection refused at 10.0.0.3".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError(Error::AlreadyClaimed).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError(Error::InvalidVerification).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_page_request_defaults() {
        let page = page_request(&ListClaimsQuery::default(), 100).unwrap();
        assert_eq!(page, PageRequest::new(0, 20));

        let query = ListClaimsQuery {
            status: Some("awaiting_info".to_string()),
            page: Some(2),
            page_size: Some(1000),
        };
        assert_eq!(page_request(&query, 100).unwrap(), PageRequest::new(2, 100));
        assert_eq!(status_filter(&query).unwrap(), Some(ClaimStatus::AwaitingInfo));

        let bad = ListClaimsQuery {
            status: Some("done".to_string()),
            ..Default::default()
        };
        assert!(status_filter(&bad).is_err());
    }
}
