// Subscription creation against the Stripe REST API. The core never reads
// billing state back; the user's stored tier is the single source of truth
// for quota decisions.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::queries;
use crate::middleware::{ErrorResponse, require_user_from_headers};

type ApiError = (StatusCode, Json<ErrorResponse>);

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// Stripe price id for the plan
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub subscription_id: String,
}

#[derive(Debug, Deserialize)]
struct StripeObject {
    id: String,
}

fn billing_error(detail: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Subscription could not be created", "BILLING_ERROR").with_details(detail)),
    )
}

async fn stripe_post(
    client: &reqwest::Client,
    secret_key: &str,
    path: &str,
    form: &[(&str, &str)],
) -> Result<StripeObject, String> {
    let response = client
        .post(format!("{STRIPE_API_BASE}{path}"))
        .basic_auth(secret_key, None::<&str>)
        .form(form)
        .send()
        .await
        .map_err(|e| format!("Stripe request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Stripe returned {}: {}", status, body));
    }

    response
        .json::<StripeObject>()
        .await
        .map_err(|e| format!("Unexpected Stripe response: {}", e))
}

/// Create a Stripe customer + subscription for the caller and persist the
/// granted tier on their user row. The tier comes from the server-side plan
/// mapping, never from the request.
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let user = require_user_from_headers(&state.db, &state.config, &headers).await?;

    let tier = state.config.tier_for_plan(&req.plan_id).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Unknown billing plan", "UNKNOWN_PLAN")),
        )
    })?;

    let client = reqwest::Client::new();
    let secret_key = &state.config.stripe_secret_key;

    let customer = stripe_post(
        &client,
        secret_key,
        "/customers",
        &[("email", user.email.as_str())],
    )
    .await
    .map_err(billing_error)?;

    let subscription = stripe_post(
        &client,
        secret_key,
        "/subscriptions",
        &[
            ("customer", customer.id.as_str()),
            ("items[0][price]", req.plan_id.as_str()),
        ],
    )
    .await
    .map_err(billing_error)?;

    queries::set_subscription_tier(&state.db, user.id, &tier)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to persist subscription tier");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Subscription created but tier update failed",
                    "DATABASE_ERROR",
                )),
            )
        })?;

    tracing::info!(
        user_id = %user.id,
        tier = tier.as_str(),
        subscription_id = %subscription.id,
        "Subscription created"
    );

    Ok(Json(SubscribeResponse {
        subscription_id: subscription.id,
    }))
}
