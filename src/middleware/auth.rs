use axum::{
    Json,
    http::{StatusCode, header},
};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::Config;
use crate::db::queries;
use crate::models::user::User;
use crate::utils::decode_access_token;

#[derive(Serialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

enum ResolveError {
    /// Bad or expired credentials; safe to echo to the caller
    Unauthorized(&'static str),
    /// Store failure; logged server-side, never shown to the caller
    Database(sqlx::Error),
}

async fn resolve_user(db: &PgPool, config: &Config, token: &str) -> Result<User, ResolveError> {
    let claims = decode_access_token(token, &config.jwt_secret)
        .map_err(|_| ResolveError::Unauthorized("Invalid or expired token"))?;

    match queries::find_user_by_email(db, &claims.sub).await {
        Ok(Some(user)) if user.is_active => Ok(user),
        Ok(Some(_)) => Err(ResolveError::Unauthorized("Account is deactivated")),
        Ok(None) => Err(ResolveError::Unauthorized("Invalid or expired token")),
        Err(e) => Err(ResolveError::Database(e)),
    }
}

/// Resolve the requesting user from the `Authorization: Bearer` header.
/// Runs before any quota or scan logic; failures here never create state.
/// Credential problems are 401s; a store failure is a 500 and the driver
/// error stays in the logs.
pub async fn require_user_from_headers(
    db: &PgPool,
    config: &Config,
    headers: &axum::http::HeaderMap,
) -> Result<User, (StatusCode, Json<ErrorResponse>)> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Bearer token required. Please log in.",
                    "TOKEN_REQUIRED",
                )),
            ));
        }
    };

    resolve_user(db, config, token).await.map_err(|err| match err {
        ResolveError::Unauthorized(message) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(message, "TOKEN_INVALID")),
        ),
        ResolveError::Database(e) => {
            tracing::error!(error = %e, "User resolution failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not resolve user", "DATABASE_ERROR")),
            )
        }
    })
}
