// Quota Guard: per-tier scan rate limiting over a rolling 30-day window.

use crate::models::user::SubscriptionTier;

/// Rolling window used when counting a user's prior scans
pub const QUOTA_WINDOW_DAYS: i64 = 30;

/// Scans allowed per window on the basic tier
const BASIC_SCAN_LIMIT: i64 = 1;

/// Scans allowed per window on the professional tier
const PROFESSIONAL_SCAN_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny { message: &'static str },
}

/// Decide whether a user on `tier` with `recent_count` scans already in the
/// window may start another one. Pure function of its inputs.
///
/// Free-tier users never reach this check (the anonymous free-scan route
/// skips it), and unrecognized tiers fall through as unlimited.
pub fn evaluate(tier: &SubscriptionTier, recent_count: i64) -> QuotaDecision {
    match tier {
        SubscriptionTier::Basic if recent_count >= BASIC_SCAN_LIMIT => QuotaDecision::Deny {
            message: "Scan limit reached for basic tier",
        },
        SubscriptionTier::Professional if recent_count >= PROFESSIONAL_SCAN_LIMIT => {
            QuotaDecision::Deny {
                message: "Scan limit reached for professional tier",
            }
        }
        _ => QuotaDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deny(tier: &SubscriptionTier, count: i64) -> bool {
        matches!(evaluate(tier, count), QuotaDecision::Deny { .. })
    }

    #[test]
    fn basic_tier_allows_exactly_one_scan_per_window() {
        assert!(!deny(&SubscriptionTier::Basic, 0));
        assert!(deny(&SubscriptionTier::Basic, 1));
        assert!(deny(&SubscriptionTier::Basic, 2));
    }

    #[test]
    fn professional_tier_allows_five_scans_per_window() {
        for count in 0..5 {
            assert!(!deny(&SubscriptionTier::Professional, count));
        }
        assert!(deny(&SubscriptionTier::Professional, 5));
        assert!(deny(&SubscriptionTier::Professional, 6));
    }

    #[test]
    fn free_tier_is_never_denied() {
        for count in [0, 1, 5, 100, i64::MAX] {
            assert!(!deny(&SubscriptionTier::Free, count));
        }
    }

    #[test]
    fn unrecognized_tiers_fall_through_as_unlimited() {
        let tier = SubscriptionTier::Other("superadmin".to_string());
        assert!(!deny(&tier, 10_000));
    }

    #[test]
    fn deny_messages_name_the_tier() {
        match evaluate(&SubscriptionTier::Basic, 1) {
            QuotaDecision::Deny { message } => {
                assert_eq!(message, "Scan limit reached for basic tier")
            }
            QuotaDecision::Allow => panic!("expected deny"),
        }
        match evaluate(&SubscriptionTier::Professional, 5) {
            QuotaDecision::Deny { message } => {
                assert_eq!(message, "Scan limit reached for professional tier")
            }
            QuotaDecision::Allow => panic!("expected deny"),
        }
    }
}
