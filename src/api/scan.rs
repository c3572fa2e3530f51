// Scan endpoints: the anonymous free path skips the quota guard entirely;
// the authenticated path runs identity -> quota -> probes -> persist, and a
// denied request leaves no trace in the store.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::db::queries;
use crate::middleware::{ErrorResponse, require_user_from_headers};
use crate::models::scan::{ScanResult, ScanType};
use crate::quota::{self, QUOTA_WINDOW_DAYS, QuotaDecision};
use crate::scanner;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Newest-first page size for scan listings
const MAX_SCANS_PER_PAGE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct CreateScanRequest {
    pub target_url: String,
    pub scan_type: ScanType,
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub id: Uuid,
    pub scan_type: String,
    pub target_host: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScanListResponse {
    pub scans: Vec<ScanSummary>,
}

fn database_error(e: sqlx::Error) -> ApiError {
    tracing::error!(error = %e, "Scan persistence failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Could not record scan", "DATABASE_ERROR")),
    )
}

/// Run the probes and persist the attempt. Store failure is fatal for the
/// request; there are no retries.
async fn run_and_persist(
    state: &AppState,
    user_id: Option<Uuid>,
    scan_type: ScanType,
    target_host: &str,
) -> Result<ScanResult, ApiError> {
    let outcome = scanner::run_scan(target_host).await;

    let results = serde_json::to_value(&outcome.result).map_err(|e| {
        tracing::error!(error = %e, "Scan result serialization failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Could not record scan", "SERIALIZATION_ERROR")),
        )
    })?;

    let scan_id = queries::insert_scan(
        &state.db,
        user_id,
        scan_type,
        target_host,
        outcome.status,
        &results,
    )
    .await
    .map_err(database_error)?;

    tracing::info!(
        scan_id = %scan_id,
        target = target_host,
        status = outcome.status.as_str(),
        "Scan recorded"
    );

    Ok(outcome.result)
}

/// Anonymous free scan. No identity, no quota; persisted with a null user.
pub async fn create_free_scan(
    State(state): State<AppState>,
    Json(req): Json<CreateScanRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    let result = run_and_persist(&state, None, ScanType::Free, &req.target_url).await?;
    Ok(Json(result))
}

/// Quota-gated scan for authenticated users. Identity is resolved first,
/// then the rolling-window count; a quota denial returns 403 before any
/// probe runs and writes nothing.
pub async fn create_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateScanRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    let user = require_user_from_headers(&state.db, &state.config, &headers).await?;

    let since = Utc::now() - Duration::days(QUOTA_WINDOW_DAYS);
    let recent_count = queries::count_recent_scans(&state.db, user.id, since)
        .await
        .map_err(database_error)?;

    if let QuotaDecision::Deny { message } = quota::evaluate(&user.subscription_tier, recent_count)
    {
        tracing::info!(
            user_id = %user.id,
            tier = user.subscription_tier.as_str(),
            recent_count,
            "Scan denied by quota"
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(message, "SCAN_LIMIT_REACHED")),
        ));
    }

    let result = run_and_persist(&state, Some(user.id), req.scan_type, &req.target_url).await?;
    Ok(Json(result))
}

/// The caller's scans, newest first.
pub async fn list_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScanListResponse>, ApiError> {
    let user = require_user_from_headers(&state.db, &state.config, &headers).await?;

    let rows = queries::list_scans_for_user(&state.db, user.id, MAX_SCANS_PER_PAGE)
        .await
        .map_err(database_error)?;

    Ok(Json(ScanListResponse {
        scans: rows
            .into_iter()
            .map(|row| ScanSummary {
                id: row.id,
                scan_type: row.scan_type,
                target_host: row.target_host,
                status: row.status,
                created_at: row.created_at,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::scan::ScanStatus;
    use crate::models::user::SubscriptionTier;
    use crate::utils::create_access_token;
    use axum::http::header;
    use sqlx::{PgPool, Row};

    fn test_state(pool: PgPool) -> AppState {
        AppState::new(pool, Config::default())
    }

    fn bearer_headers(state: &AppState, email: &str) -> HeaderMap {
        let token = create_access_token(email, &state.config.jwt_secret).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    async fn basic_tier_user(state: &AppState, email: &str) -> Uuid {
        let user = queries::insert_user(&state.db, email, "not-a-real-hash", "Acme Corp")
            .await
            .unwrap();
        queries::set_subscription_tier(&state.db, user.id, &SubscriptionTier::Basic)
            .await
            .unwrap();
        user.id
    }

    #[sqlx::test]
    async fn anonymous_free_scan_persists_with_null_user(pool: PgPool) {
        let state = test_state(pool);
        // .invalid never resolves, so all probes fail fast
        let req = CreateScanRequest {
            target_url: "host.invalid".to_string(),
            // The free path must force the stored type regardless of this
            scan_type: ScanType::Tiered,
        };

        let result = create_free_scan(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert!(result.0.port_scan.is_none());

        let row = sqlx::query("SELECT user_id, scan_type, status FROM scans")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert!(row.get::<Option<Uuid>, _>("user_id").is_none());
        assert_eq!(row.get::<String, _>("scan_type"), "free");
        assert_eq!(
            row.get::<String, _>("status"),
            ScanStatus::Failed.as_str()
        );
    }

    #[sqlx::test]
    async fn first_scan_in_window_is_allowed_and_recorded(pool: PgPool) {
        let state = test_state(pool);
        let user_id = basic_tier_user(&state, "fresh@example.com").await;
        let headers = bearer_headers(&state, "fresh@example.com");

        let req = CreateScanRequest {
            target_url: "host.invalid".to_string(),
            scan_type: ScanType::Tiered,
        };
        create_scan(State(state.clone()), headers, Json(req))
            .await
            .expect("first scan in the window should pass quota");

        let since = Utc::now() - Duration::days(QUOTA_WINDOW_DAYS);
        let count = queries::count_recent_scans(&state.db, user_id, since)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn quota_denied_request_persists_nothing(pool: PgPool) {
        let state = test_state(pool);
        let user_id = basic_tier_user(&state, "capped@example.com").await;

        // Exhaust the basic-tier quota
        queries::insert_scan(
            &state.db,
            Some(user_id),
            ScanType::Tiered,
            "example.com",
            ScanStatus::Completed,
            &serde_json::json!({}),
        )
        .await
        .unwrap();

        let headers = bearer_headers(&state, "capped@example.com");
        let req = CreateScanRequest {
            target_url: "host.invalid".to_string(),
            scan_type: ScanType::Tiered,
        };
        let err = create_scan(State(state.clone()), headers, Json(req))
            .await
            .err()
            .expect("second scan should be denied");
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert_eq!(err.1.0.code, "SCAN_LIMIT_REACHED");
        assert_eq!(err.1.0.error, "Scan limit reached for basic tier");

        // The denial left no trace: still exactly the one seeded row
        let row = sqlx::query("SELECT COUNT(*) AS n FROM scans")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 1);
    }
}
