use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::db::queries;
use crate::middleware::ErrorResponse;
use crate::utils::{create_access_token, hash_password, verify_password};

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Create an account on the free tier.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if let Err(errors) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Invalid registration payload", "VALIDATION_ERROR")
                    .with_details(errors.to_string()),
            ),
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Could not create account", "HASH_ERROR")),
        )
    })?;

    match queries::insert_user(&state.db, &req.email, &password_hash, &req.company_name).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "User registered successfully".to_string(),
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "An account with this email already exists",
                "EMAIL_TAKEN",
            )),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Failed to insert user");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not create account", "DATABASE_ERROR")),
            ))
        }
    }
}

/// Exchange email + password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "Incorrect email or password",
                "INVALID_CREDENTIALS",
            )),
        )
    };

    let user = queries::find_user_by_email(&state.db, &req.email)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not log in", "DATABASE_ERROR")),
            )
        })?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid_credentials());
    }

    let access_token = create_access_token(&user.email, &state.config.jwt_secret).map_err(|e| {
        tracing::error!(error = %e, "Token signing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Could not log in", "TOKEN_ERROR")),
        )
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
