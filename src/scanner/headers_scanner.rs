// HTTP security-header probe: one HEAD request against the target over
// HTTPS, capturing the full response header map.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::models::scan::HeadersCheck;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HEAD `https://{target}` and collect response headers. Any failure —
/// refused, timeout, TLS error — collapses to the unavailable marker.
pub async fn run_headers_check(target: &str) -> HeadersCheck {
    let client = match reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("netfix-api/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client for headers probe");
            return HeadersCheck::unavailable();
        }
    };

    let url = format!("https://{target}");
    match client.head(&url).send().await {
        Ok(response) => {
            info!(target, status = %response.status(), "Headers probe got a response");
            let mut headers = BTreeMap::new();
            for (name, value) in response.headers() {
                headers.insert(
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("[invalid utf-8]").to_string(),
                );
            }
            HeadersCheck::Headers(headers)
        }
        Err(e) => {
            debug!(target, error = %e, "Headers probe failed");
            HeadersCheck::unavailable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn refused_connection_yields_the_error_marker() {
        // Bind and drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check = run_headers_check(&format!("127.0.0.1:{}", addr.port())).await;
        match check {
            HeadersCheck::Unavailable { error } => {
                assert_eq!(error, "Could not check headers");
            }
            HeadersCheck::Headers(_) => panic!("expected the probe to fail"),
        }
    }

    #[tokio::test]
    async fn unresolvable_target_yields_the_error_marker() {
        let check = run_headers_check("host.invalid").await;
        assert!(check.is_unavailable());
    }
}
