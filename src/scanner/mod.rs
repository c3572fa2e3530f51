// Scan Runner: fans out the three probes against one target and merges
// whatever came back. Probe failures are captured in the result, never
// raised to the caller.

pub mod headers_scanner;
pub mod port_scanner;
pub mod ssl_scanner;

use tracing::{info, warn};

use crate::models::scan::{ScanResult, ScanStatus};

pub struct ScanOutcome {
    pub result: ScanResult,
    pub status: ScanStatus,
}

/// Run all three probes concurrently and join before merging. One probe's
/// failure never cancels the others.
pub async fn run_scan(target_host: &str) -> ScanOutcome {
    info!(target = target_host, "Starting scan");

    let (ports, ssl_check, headers_check) = tokio::join!(
        port_scanner::run_port_scan(target_host),
        ssl_scanner::run_ssl_check(target_host),
        headers_scanner::run_headers_check(target_host),
    );

    let port_scan = match ports {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(target = target_host, error = %e, "Port probe failed");
            None
        }
    };

    let result = ScanResult {
        port_scan,
        ssl_check,
        headers_check,
    };
    let status = derive_status(&result);

    info!(target = target_host, status = status.as_str(), "Scan finished");

    ScanOutcome { result, status }
}

/// `Failed` only when every probe came back empty-handed; partial results
/// still count as a completed scan.
fn derive_status(result: &ScanResult) -> ScanStatus {
    let all_failed = result.port_scan.is_none()
        && !result.ssl_check.valid
        && result.headers_check.is_unavailable();

    if all_failed {
        ScanStatus::Failed
    } else {
        ScanStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::{HeadersCheck, PortState, SslCheck};
    use std::collections::BTreeMap;

    fn open_port_map() -> BTreeMap<u16, PortState> {
        let mut map = BTreeMap::new();
        map.insert(443, PortState::Open);
        map
    }

    #[test]
    fn all_probes_failing_marks_the_scan_failed() {
        let result = ScanResult {
            port_scan: None,
            ssl_check: SslCheck::invalid(),
            headers_check: HeadersCheck::unavailable(),
        };
        assert_eq!(derive_status(&result), ScanStatus::Failed);
    }

    #[test]
    fn a_single_surviving_probe_marks_the_scan_completed() {
        let result = ScanResult {
            port_scan: Some(open_port_map()),
            ssl_check: SslCheck::invalid(),
            headers_check: HeadersCheck::unavailable(),
        };
        assert_eq!(derive_status(&result), ScanStatus::Completed);

        let result = ScanResult {
            port_scan: None,
            ssl_check: SslCheck {
                valid: true,
                certificate: Some("-----BEGIN CERTIFICATE-----".to_string()),
            },
            headers_check: HeadersCheck::unavailable(),
        };
        assert_eq!(derive_status(&result), ScanStatus::Completed);

        let result = ScanResult {
            port_scan: None,
            ssl_check: SslCheck::invalid(),
            headers_check: HeadersCheck::Headers(BTreeMap::new()),
        };
        assert_eq!(derive_status(&result), ScanStatus::Completed);
    }

    #[tokio::test]
    async fn unresolvable_target_fails_every_probe_independently() {
        // .invalid is reserved (RFC 2606) and never resolves
        let outcome = run_scan("host.invalid").await;
        assert_eq!(outcome.status, ScanStatus::Failed);
        assert!(outcome.result.port_scan.is_none());
        assert!(!outcome.result.ssl_check.valid);
        assert!(outcome.result.headers_check.is_unavailable());
    }
}
