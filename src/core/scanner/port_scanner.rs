// src/core/scanner/port_scanner.rs

use tracing::{debug, info, warn};

use super::{bounded, Interrupted};
use crate::config::ProbeConfig;
use crate::core::models::{PortScanResults, PortStatus};
use futures::future::join_all;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{lookup_host, TcpStream};
use tokio_util::sync::CancellationToken;

/// Attempts a TCP connection to every configured service port.
///
/// The host is resolved once; if that fails every service reports `HostnameUnresolvable`.
/// Connections run concurrently, each bounded by the port timeout.
pub async fn run_port_scan(host: &str, config: &ProbeConfig, cancel: &CancellationToken) -> PortScanResults {
    info!(host, ports = config.ports.len(), "Starting port scan.");

    let address = match resolve_host(host, config, cancel).await {
        Some(address) => address,
        None => {
            warn!(host, "Hostname could not be resolved for port scan.");
            return PortScanResults(
                config.ports.iter().map(|(service, _)| (*service, PortStatus::HostnameUnresolvable)).collect(),
            );
        }
    };

    let checks = config.ports.iter().map(|(service, port)| async move {
        let outcome = bounded(cancel, config.port_timeout, TcpStream::connect(SocketAddr::new(address, *port))).await;
        let status = classify_connect(outcome.map(|connected| connected.map(drop)));
        debug!(%service, port, %status, "Port probed.");
        (*service, status)
    });

    let results = PortScanResults(join_all(checks).await);
    info!(host, %address, "Port scan finished.");
    results
}

/// Literal addresses are used as-is; names resolve with the DNS timeout, preferring IPv4.
async fn resolve_host(host: &str, config: &ProbeConfig, cancel: &CancellationToken) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    match bounded(cancel, config.dns_timeout, lookup_host((host, 0))).await {
        Ok(Ok(addresses)) => prefer_ipv4(addresses).map(|address| address.ip()),
        Ok(Err(e)) => {
            debug!(host, error = %e, "Host lookup failed.");
            None
        }
        Err(_) => None,
    }
}

/// The first IPv4 address, else the first address of any family.
pub fn prefer_ipv4(addresses: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let addresses: Vec<SocketAddr> = addresses.into_iter().collect();
    addresses.iter().find(|address| address.is_ipv4()).or_else(|| addresses.first()).copied()
}

/// Maps a bounded connect attempt onto a port status.
pub fn classify_connect(outcome: Result<io::Result<()>, Interrupted>) -> PortStatus {
    match outcome {
        Ok(Ok(())) => PortStatus::Open,
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => PortStatus::Closed,
        Ok(Err(e)) => match e.raw_os_error() {
            Some(code) => PortStatus::Filtered(Some(code)),
            None => PortStatus::SocketError(e.to_string()),
        },
        Err(Interrupted::TimedOut) | Err(Interrupted::Cancelled) => PortStatus::Filtered(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Service;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn config_for(ports: Vec<(Service, u16)>) -> ProbeConfig {
        ProbeConfig {
            ports,
            port_timeout: Duration::from_millis(500),
            dns_timeout: Duration::from_millis(500),
            ..ProbeConfig::default()
        }
    }

    #[test]
    fn ipv4_is_preferred_over_earlier_ipv6() {
        let v6: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        let v4: SocketAddr = "192.0.2.1:443".parse().unwrap();
        assert_eq!(prefer_ipv4(vec![v6, v4]), Some(v4));
        assert_eq!(prefer_ipv4(vec![v6]), Some(v6));
        assert_eq!(prefer_ipv4(Vec::new()), None);
    }

    #[test]
    fn connect_outcomes_map_to_statuses() {
        assert_eq!(classify_connect(Ok(Ok(()))), PortStatus::Open);
        assert_eq!(
            classify_connect(Ok(Err(io::Error::from(io::ErrorKind::ConnectionRefused)))),
            PortStatus::Closed
        );
        assert_eq!(classify_connect(Ok(Err(io::Error::from_raw_os_error(113)))), PortStatus::Filtered(Some(113)));
        assert_eq!(classify_connect(Err(Interrupted::TimedOut)), PortStatus::Filtered(None));
        assert!(matches!(
            classify_connect(Ok(Err(io::Error::new(io::ErrorKind::Other, "boom")))),
            PortStatus::SocketError(message) if message == "boom"
        ));
    }

    #[tokio::test]
    async fn listening_port_is_open_and_released_port_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let released = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = released.local_addr().unwrap().port();
        drop(released);

        let config = config_for(vec![(Service::Http, open_port), (Service::Https, closed_port)]);
        let results = run_port_scan("127.0.0.1", &config, &CancellationToken::new()).await;

        assert_eq!(results.status(Service::Http), Some(&PortStatus::Open));
        assert_eq!(results.status(Service::Https), Some(&PortStatus::Closed));
        drop(listener);
    }

    #[tokio::test]
    async fn unresolvable_host_marks_every_service() {
        let config = config_for(Service::default_table());
        let results = run_port_scan("no-such-host.invalid", &config, &CancellationToken::new()).await;
        assert_eq!(results.0.len(), 5);
        assert!(results.0.iter().all(|(_, status)| *status == PortStatus::HostnameUnresolvable));
    }
}
