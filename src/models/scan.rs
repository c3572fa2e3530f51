use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Free,
    Tiered,
}

impl ScanType {
    pub fn as_str(&self) -> &str {
        match self {
            ScanType::Free => "free",
            ScanType::Tiered => "tiered",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Pending,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }
}

/// Aggregate of the three independent probes. Each sub-result reflects its
/// own probe's outcome; one probe failing never blanks out the others.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResult {
    /// Port -> state map, or `None` when the port probe itself failed
    /// (e.g. the target host did not resolve).
    pub port_scan: Option<BTreeMap<u16, PortState>>,
    pub ssl_check: SslCheck,
    pub headers_check: HeadersCheck,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SslCheck {
    pub valid: bool,
    /// PEM text of the peer certificate. Present only when `valid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

impl SslCheck {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            certificate: None,
        }
    }
}

/// Header map on success, or the `{"error": ...}` marker when the HEAD
/// request did not produce a response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeadersCheck {
    Unavailable { error: String },
    Headers(BTreeMap<String, String>),
}

impl HeadersCheck {
    pub fn unavailable() -> Self {
        HeadersCheck::Unavailable {
            error: "Could not check headers".to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, HeadersCheck::Unavailable { .. })
    }
}
