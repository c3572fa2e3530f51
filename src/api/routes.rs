use axum::{
    Router,
    routing::{get, post},
};

use super::AppState;
use super::{auth, billing, scan};

/// V1 API routes
///
/// ## Public Routes (no auth required)
/// - POST /auth/register - Create an account (free tier)
/// - POST /auth/token - Log in, returns a bearer token
/// - POST /scan/free - Anonymous scan, no quota check
///
/// ## Authenticated Routes (bearer token)
/// - POST /billing/subscribe - Create a paid subscription
/// - POST /scan - Run a scan against the caller's quota (403 when exhausted)
/// - GET  /scan/list - The caller's scans, newest first
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        // ========================================
        // Public: registration and login
        // ========================================
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::login))
        // ========================================
        // Billing: bearer auth
        // ========================================
        .route("/billing/subscribe", post(billing::subscribe))
        // ========================================
        // Scans: anonymous free path + quota-gated path
        // ========================================
        .route("/scan/free", post(scan::create_free_scan))
        .route("/scan", post(scan::create_scan))
        .route("/scan/list", get(scan::list_scans))
}
