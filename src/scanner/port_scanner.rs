// TCP connect scan over the common well-known ports.

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::debug;

use crate::models::scan::PortState;

/// Per-port connect timeout. A port that neither accepts nor refuses within
/// this window is reported as filtered.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Concurrent connection attempts per scan
const MAX_IN_FLIGHT: usize = 32;

/// Fast-scan port set: the common well-known TCP services.
pub const WELL_KNOWN_PORTS: &[u16] = &[
    7, 9, 13, 21, 22, 23, 25, 26, 37, 53, 79, 80, 81, 88, 106, 110, 111, 113, 119, 135, 139, 143,
    144, 179, 199, 389, 427, 443, 444, 445, 465, 513, 514, 515, 543, 544, 548, 554, 587, 631, 646,
    873, 990, 993, 995, 1025, 1026, 1027, 1028, 1029, 1110, 1433, 1720, 1723, 1755, 1900, 2000,
    2001, 2049, 2121, 2717, 3000, 3128, 3306, 3389, 3986, 4899, 5000, 5009, 5051, 5060, 5101,
    5190, 5357, 5432, 5631, 5666, 5800, 5900, 6000, 6001, 6646, 7070, 8000, 8008, 8009, 8080,
    8081, 8443, 8888, 9100, 9999, 10000, 32768, 49152, 49153, 49154, 49155, 49156, 49157,
];

#[derive(Debug, Error)]
pub enum PortScanError {
    #[error("could not resolve target '{0}'")]
    Resolve(String),
    #[error("dns lookup failed: {0}")]
    Lookup(#[from] std::io::Error),
}

/// Connect-scan every well-known port on the target. Errors only when the
/// target itself cannot be resolved; individual port outcomes are part of
/// the result map.
pub async fn run_port_scan(target: &str) -> Result<BTreeMap<u16, PortState>, PortScanError> {
    let ip = resolve(target).await?;
    debug!(target, %ip, ports = WELL_KNOWN_PORTS.len(), "Starting port scan");

    let results: Vec<(u16, PortState)> = stream::iter(WELL_KNOWN_PORTS.iter().copied())
        .map(|port| async move { (port, probe_port(ip, port).await) })
        .buffer_unordered(MAX_IN_FLIGHT)
        .collect()
        .await;

    Ok(results.into_iter().collect())
}

async fn probe_port(ip: IpAddr, port: u16) -> PortState {
    let addr = SocketAddr::new(ip, port);
    match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => PortState::Open,
        // Refused or otherwise actively rejected
        Ok(Err(_)) => PortState::Closed,
        // No answer at all within the window
        Err(_) => PortState::Filtered,
    }
}

async fn resolve(target: &str) -> Result<IpAddr, PortScanError> {
    lookup_host((target, 80u16))
        .await?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| PortScanError::Resolve(target.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn bound_port_is_reported_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = probe_port(addr.ip(), addr.port()).await;
        assert_eq!(state, PortState::Open);
    }

    #[tokio::test]
    async fn unbound_loopback_port_is_reported_closed() {
        // Bind and drop to get a port that is free right now
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = probe_port(addr.ip(), addr.port()).await;
        assert_eq!(state, PortState::Closed);
    }

    #[tokio::test]
    async fn unresolvable_target_errors() {
        let err = run_port_scan("host.invalid").await.unwrap_err();
        assert!(matches!(
            err,
            PortScanError::Lookup(_) | PortScanError::Resolve(_)
        ));
    }

    #[tokio::test]
    async fn full_loopback_scan_covers_the_well_known_set() {
        let map = run_port_scan("127.0.0.1").await.unwrap();
        assert_eq!(map.len(), WELL_KNOWN_PORTS.len());
        // Loopback answers immediately, so nothing should look filtered
        assert!(map.values().all(|s| *s != PortState::Filtered));
    }
}
