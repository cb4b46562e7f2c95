// src/core/scanner/ssl_scanner.rs

use tracing::{debug, error, info};

use super::port_scanner::prefer_ipv4;
use super::{bounded, Interrupted};
use crate::core::models::{NsRecords, PortScanResults, Service, TlsResult, TlsStatus};
use chrono::{DateTime, Utc};
use native_tls::{HandshakeError, TlsConnector};
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use x509_parser::prelude::*;

pub const SKIP_HTTPS_CLOSED: &str = "HTTPS port not open or not applicable.";
pub const SKIP_IP_WITHOUT_HOSTNAME: &str =
    "HTTPS port is open, but IP is not resolvable to a hostname for SSL check.";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlsFailure {
    #[error("SSL Error: {0}")]
    Ssl(String),
    #[error("Connection timed out during SSL handshake.")]
    TimedOut,
    #[error("Connection refused. Port might be closed or service not running.")]
    Refused,
    #[error("Hostname could not be resolved for SSL check.")]
    Unresolvable,
    #[error("An unexpected error occurred during SSL check: {0}")]
    Unexpected(String),
}

/// The fields taken from the leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSnapshot {
    pub common_name: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateSnapshot {
    pub fn into_result(self, now: DateTime<Utc>) -> TlsResult {
        let (status, expires_in_days) = classify_validity(self.not_before, self.not_after, now);
        TlsResult {
            status,
            common_name: Some(self.common_name),
            issuer: Some(self.issuer),
            not_before: Some(self.not_before),
            not_after: Some(self.not_after),
            expires_in_days: Some(expires_in_days),
            error: None,
        }
    }
}

/// Status of a validity window at `now`, plus whole days until expiry (floored, negative once expired).
pub fn classify_validity(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> (TlsStatus, i64) {
    let status = if now < not_before {
        TlsStatus::NotYetValid
    } else if now > not_after {
        TlsStatus::Expired
    } else {
        TlsStatus::Valid
    };
    let days = (not_after - now).num_seconds().div_euclid(SECONDS_PER_DAY);
    (status, days)
}

/// Returns why the TLS probe must not run, or `None` when it should.
///
/// IP targets additionally need a nameserver-derived address, since the bare IP cannot be
/// validated as a server name.
pub fn tls_skip_reason(is_ip: bool, ports: &PortScanResults, nameservers: &NsRecords) -> Option<&'static str> {
    if !ports.is_open(Service::Https) {
        Some(SKIP_HTTPS_CLOSED)
    } else if is_ip && !nameservers.any_resolved() {
        Some(SKIP_IP_WITHOUT_HOSTNAME)
    } else {
        None
    }
}

pub async fn run_ssl_scan(host: &str, port: u16, timeout: Duration, cancel: &CancellationToken) -> TlsResult {
    info!(host, port, "Starting SSL/TLS scan.");
    let host_owned = host.to_string();

    debug!("Spawning blocking task for TLS connection.");
    let handshake = spawn_blocking(move || perform_tls_scan(&host_owned, port, timeout));

    // Connect, handshake read and write are each bounded by `timeout` inside the task.
    let result = match bounded(cancel, timeout * 3, handshake).await {
        Ok(Ok(Ok(snapshot))) => snapshot.into_result(Utc::now()),
        Ok(Ok(Err(failure))) => TlsResult::error(failure.to_string()),
        Ok(Err(e)) => {
            error!(panic = %e, "Blocking SSL scan task panicked!");
            TlsResult::error(TlsFailure::Unexpected(format!("Task panicked: {}", e)).to_string())
        }
        Err(Interrupted::TimedOut) | Err(Interrupted::Cancelled) => TlsResult::error(TlsFailure::TimedOut.to_string()),
    };

    info!(status = ?result.status, expires_in_days = ?result.expires_in_days, "SSL/TLS scan finished.");
    result
}

fn perform_tls_scan(host: &str, port: u16, timeout: Duration) -> Result<CertificateSnapshot, TlsFailure> {
    debug!(host, "Performing TLS connection and handshake.");

    let connector = TlsConnector::new().map_err(|e| {
        error!(error = %e, "Failed to create TlsConnector");
        TlsFailure::Ssl(e.to_string())
    })?;

    let addresses = (host, port).to_socket_addrs().map_err(|_| TlsFailure::Unresolvable)?;
    let address = prefer_ipv4(addresses).ok_or(TlsFailure::Unresolvable)?;

    debug!(host, %address, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&address, timeout).map_err(|e| match e.kind() {
        io::ErrorKind::ConnectionRefused => TlsFailure::Refused,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TlsFailure::TimedOut,
        _ => TlsFailure::Unexpected(e.to_string()),
    })?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| TlsFailure::Unexpected(e.to_string()))?;

    debug!(host, "Performing TLS handshake.");
    let stream = connector.connect(host, stream).map_err(|e| match e {
        HandshakeError::Failure(e) => {
            error!(error = %e, "TLS handshake failed");
            TlsFailure::Ssl(e.to_string())
        }
        HandshakeError::WouldBlock(_) => TlsFailure::TimedOut,
    })?;

    let cert = match stream.peer_certificate() {
        Ok(Some(cert)) => cert,
        Ok(None) => return Err(TlsFailure::Ssl("Server did not provide a certificate.".to_string())),
        Err(e) => return Err(TlsFailure::Ssl(format!("Could not get peer certificate: {}", e))),
    };

    let cert_der = cert
        .to_der()
        .map_err(|e| TlsFailure::Unexpected(format!("Could not convert certificate to DER: {}", e)))?;

    let (_, x509) = parse_x509_certificate(&cert_der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        TlsFailure::Unexpected(format!("X.509 Parse Error: {}", e))
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");

    let validity = x509.validity();
    Ok(CertificateSnapshot {
        common_name: first_common_name(x509.subject()),
        issuer: first_common_name(x509.issuer()),
        not_before: asn1_time_to_chrono_utc(&validity.not_before),
        not_after: asn1_time_to_chrono_utc(&validity.not_after),
    })
}

fn first_common_name(name: &X509Name) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or("N/A")
        .to_string()
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
