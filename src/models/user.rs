use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub company_name: String,
    pub subscription_tier: SubscriptionTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Billing plan of a user, stored as plain text so new tiers can be
/// introduced without a migration. Unrecognized values are kept verbatim
/// and treated as unlimited by the quota policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionTier {
    Free,
    Basic,
    Professional,
    Other(String),
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Professional => "professional",
            SubscriptionTier::Other(s) => s,
        }
    }
}

impl From<&str> for SubscriptionTier {
    fn from(s: &str) -> Self {
        match s {
            "free" => SubscriptionTier::Free,
            "basic" => SubscriptionTier::Basic,
            "professional" => SubscriptionTier::Professional,
            other => SubscriptionTier::Other(other.to_string()),
        }
    }
}

impl From<String> for SubscriptionTier {
    fn from(s: String) -> Self {
        SubscriptionTier::from(s.as_str())
    }
}

impl From<SubscriptionTier> for String {
    fn from(tier: SubscriptionTier) -> Self {
        tier.as_str().to_string()
    }
}
