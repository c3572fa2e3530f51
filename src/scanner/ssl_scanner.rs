// TLS certificate probe: handshake against port 443 and capture of the
// peer certificate as PEM.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use native_tls::TlsConnector;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::{debug, error};

use crate::models::scan::SslCheck;

const HTTPS_PORT: u16 = 443;

/// TCP connect and per-read deadline for the blocking handshake
const TLS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum TlsProbeError {
    #[error("could not resolve target '{0}'")]
    Resolve(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("tls handshake failed: {0}")]
    Handshake(String),
    #[error("server presented no certificate")]
    NoCertificate,
}

/// Handshake with `target:443` and report validity. Any failure — host down,
/// no TLS, certificate rejected — is swallowed into `valid: false`.
pub async fn run_ssl_check(target: &str) -> SslCheck {
    let host = target.to_string();
    // native-tls is synchronous, so the handshake runs on a blocking thread
    let outcome = spawn_blocking(move || fetch_certificate(&host, HTTPS_PORT)).await;

    match outcome {
        Ok(Ok(pem)) => SslCheck {
            valid: true,
            certificate: Some(pem),
        },
        Ok(Err(e)) => {
            debug!(target, error = %e, "TLS probe failed");
            SslCheck::invalid()
        }
        Err(e) => {
            error!(target, error = %e, "TLS probe task panicked");
            SslCheck::invalid()
        }
    }
}

pub(crate) fn fetch_certificate(host: &str, port: u16) -> Result<String, TlsProbeError> {
    let addr: SocketAddr = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TlsProbeError::Resolve(host.to_string()))?;

    let stream = TcpStream::connect_timeout(&addr, TLS_TIMEOUT)?;
    stream.set_read_timeout(Some(TLS_TIMEOUT))?;
    stream.set_write_timeout(Some(TLS_TIMEOUT))?;

    let connector = TlsConnector::new()?;
    let tls_stream = connector
        .connect(host, stream)
        .map_err(|e| TlsProbeError::Handshake(e.to_string()))?;

    let certificate = tls_stream
        .peer_certificate()?
        .ok_or(TlsProbeError::NoCertificate)?;

    Ok(der_to_pem(&certificate.to_der()?))
}

fn der_to_pem(der: &[u8]) -> String {
    let encoded = BASE64.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        // base64 output is pure ASCII
        pem.push_str(std::str::from_utf8(chunk).unwrap_or(""));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}
