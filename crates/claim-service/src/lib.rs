//! Claim Service
//!
//! Winner claim lifecycle for a sweepstakes portal: prize entry lookup and
//! one-time activation, claim submission and admin review, role-based
//! access control and published testimonials.

pub mod access;
pub mod claims;
pub mod config;
pub mod entries;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod seed;
pub mod storage;
pub mod testimonials;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::{AppState, CALLER_HEADER};
pub use storage::{MemoryStorage, RedisStorage, Storage};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        // Identity
        .route("/api/me/role", get(handlers::get_role_handler))
        .route("/api/me/is-admin", get(handlers::is_admin_handler))
        .route(
            "/api/me/profile",
            get(handlers::get_my_profile_handler).put(handlers::save_my_profile_handler),
        )
        .route("/api/me/claims", get(handlers::list_my_claims_handler))
        .route(
            "/api/users/{principal}/profile",
            get(handlers::get_user_profile_handler),
        )
        .route(
            "/api/users/{principal}/role",
            put(handlers::assign_role_handler),
        )
        // Entries
        .route("/api/entries", get(handlers::list_entries_handler))
        .route(
            "/api/entries/by-number/{prize_number}",
            get(handlers::get_entry_by_number_handler),
        )
        .route("/api/entries/verify", post(handlers::verify_handler))
        .route(
            "/api/entries/{id}/claim",
            post(handlers::claim_entry_handler),
        )
        // Claims
        .route(
            "/api/claims",
            post(handlers::submit_claim_handler).get(handlers::list_claims_handler),
        )
        .route("/api/claims/{id}", get(handlers::get_claim_handler))
        .route(
            "/api/claims/{id}/status",
            put(handlers::update_claim_status_handler),
        )
        .route(
            "/api/claims/{id}/response",
            put(handlers::admin_response_handler),
        )
        // Testimonials
        .route(
            "/api/testimonials",
            get(handlers::list_testimonials_handler).post(handlers::add_testimonial_handler),
        )
        .route(
            "/api/testimonials/{name}",
            delete(handlers::remove_testimonial_handler),
        )
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
