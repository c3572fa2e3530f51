use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::scan::{ScanStatus, ScanType};
use crate::models::user::{SubscriptionTier, User};

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        company_name: row.get("company_name"),
        subscription_tier: SubscriptionTier::from(row.get::<String, _>("subscription_tier")),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, company_name, subscription_tier, is_active, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    company_name: &str,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, company_name, subscription_tier)
        VALUES ($1, $2, $3, 'free')
        RETURNING id, email, password_hash, company_name, subscription_tier, is_active, created_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(company_name)
    .fetch_one(pool)
    .await?;

    Ok(user_from_row(&row))
}

pub async fn set_subscription_tier(
    pool: &PgPool,
    user_id: Uuid,
    tier: &SubscriptionTier,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET subscription_tier = $1 WHERE id = $2")
        .bind(tier.as_str())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist one scan attempt. Scan rows are insert-only.
pub async fn insert_scan(
    pool: &PgPool,
    user_id: Option<Uuid>,
    scan_type: ScanType,
    target_host: &str,
    status: ScanStatus,
    results: &serde_json::Value,
) -> Result<Uuid, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO scans (user_id, scan_type, target_host, status, results)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(scan_type.as_str())
    .bind(target_host)
    .bind(status.as_str())
    .bind(results)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

/// Number of scans a user has started since `since` (inclusive). Feeds the
/// quota guard's rolling-window check.
pub async fn count_recent_scans(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS scan_count
        FROM scans
        WHERE user_id = $1 AND created_at >= $2
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.get("scan_count"))
}

pub struct ScanSummaryRow {
    pub id: Uuid,
    pub scan_type: String,
    pub target_host: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub async fn list_scans_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ScanSummaryRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, scan_type, target_host, status, created_at
        FROM scans
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ScanSummaryRow {
            id: row.get("id"),
            scan_type: row.get("scan_type"),
            target_host: row.get("target_host"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        })
        .collect())
}
