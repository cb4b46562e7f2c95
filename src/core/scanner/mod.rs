// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares all probe modules and hosts the evaluation orchestrator.
pub mod blacklist_scanner;
pub mod dns_scanner;
pub mod port_scanner;
pub mod ssl_scanner;

use crate::config::ProbeConfig;
use crate::core::health::calculate_health_score;
use crate::core::models::{EvaluationResult, HealthScore, NsRecords, PortScanResults, Service, TlsResult};
use crate::core::target::{Target, TargetKind};
use hickory_resolver::TokioAsyncResolver;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use self::blacklist_scanner::run_blacklist_scan;
use self::dns_scanner::{
    build_resolver, check_reverse_dns, get_all_dns_records, get_email_config_records, get_mx_records,
    get_ns_records_with_ips, DnsProbe,
};
use self::port_scanner::run_port_scan;
use self::ssl_scanner::{run_ssl_scan, tls_skip_reason};

/// Why a bounded operation produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    TimedOut,
    Cancelled,
}

/// Runs `future` until it completes, `limit` elapses, or `cancel` fires, whichever comes first.
pub async fn bounded<F: Future>(
    cancel: &CancellationToken,
    limit: Duration,
    future: F,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        outcome = tokio::time::timeout(limit, future) => outcome.map_err(|_| Interrupted::TimedOut),
    }
}

/// Evaluates targets. Cheap to share: holds only the configuration and a resolver handle.
pub struct Scanner {
    config: ProbeConfig,
    resolver: TokioAsyncResolver,
}

impl Scanner {
    pub fn new(config: ProbeConfig) -> Self {
        let resolver = build_resolver(config.dns_timeout);
        Self { config, resolver }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Runs every applicable probe concurrently, then gates the TLS probe on the port results
    /// and scores the joined result. Always returns a complete result; probe failures are data.
    ///
    /// # Arguments
    /// * `target` - A validated domain or IP address.
    /// * `cancel` - Cancelling it turns every in-flight probe into a timeout marker.
    pub async fn evaluate(&self, target: &Target, cancel: &CancellationToken) -> EvaluationResult {
        let cfg = &self.config;
        let query = target.as_str();
        info!(target = %query, is_ip = target.is_ip(), "Starting evaluation.");

        let dns = DnsProbe::new(self.resolver.clone(), cfg.dns_timeout, cancel.clone());
        let port_scan = run_port_scan(query, cfg, cancel);

        let mut result = EvaluationResult {
            query: query.to_string(),
            is_ip: target.is_ip(),
            blacklist_results: Default::default(),
            mx_records: Vec::new(),
            ns_records: NsRecords::default(),
            all_dns_records: None,
            email_config: None,
            ptr_records: None,
            port_scan_results: PortScanResults::default(),
            ssl_cert_results: TlsResult::skipped(ssl_scanner::SKIP_HTTPS_CLOSED),
            health_score: HealthScore::default(),
            message: String::new(),
        };

        match target.kind() {
            TargetKind::Ip(ip) => {
                let rbl = dns.with_timeout(cfg.rbl_timeout);
                let (blacklist, ptr, ports) = tokio::join!(
                    run_blacklist_scan(&rbl, ip, &cfg.rbl_servers),
                    check_reverse_dns(&dns, ip),
                    port_scan,
                );
                result.blacklist_results = blacklist;
                result.ptr_records = Some(ptr);
                result.port_scan_results = ports;
                result.message =
                    format!("'{}' is an IP address. Blacklist, PTR and port checks were performed.", query);
            }
            TargetKind::Domain => {
                let (mx, ns, all, email, ports) = tokio::join!(
                    get_mx_records(&dns, query),
                    get_ns_records_with_ips(&dns, query),
                    get_all_dns_records(&dns, query),
                    get_email_config_records(&dns, query, &cfg.dkim_selectors),
                    port_scan,
                );
                result.mx_records = mx;
                result.ns_records = ns;
                result.all_dns_records = Some(all);
                result.email_config = Some(email);
                result.port_scan_results = ports;
                result.message =
                    format!("'{}' is a domain. All relevant records and services were checked.", query);
            }
        }

        result.ssl_cert_results =
            match tls_skip_reason(result.is_ip, &result.port_scan_results, &result.ns_records) {
                Some(reason) => {
                    info!(reason, "Skipping SSL/TLS scan.");
                    TlsResult::skipped(reason)
                }
                None => run_ssl_scan(query, https_port(cfg), cfg.tls_timeout, cancel).await,
            };

        result.health_score = calculate_health_score(&result);
        info!(
            target = %query,
            score = result.health_score.score,
            issues = result.health_score.findings.len(),
            "Evaluation finished."
        );
        result
    }
}

fn https_port(config: &ProbeConfig) -> u16 {
    config
        .ports
        .iter()
        .find(|(service, _)| *service == Service::Https)
        .map(|(_, port)| *port)
        .unwrap_or_else(|| Service::Https.default_port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_through_completed_work() {
        let cancel = CancellationToken::new();
        let outcome = bounded(&cancel, Duration::from_secs(1), async { 7 }).await;
        assert_eq!(outcome, Ok(7));
    }

    #[tokio::test]
    async fn bounded_reports_timeouts() {
        let cancel = CancellationToken::new();
        let outcome = bounded(&cancel, Duration::from_millis(10), std::future::pending::<()>()).await;
        assert_eq!(outcome, Err(Interrupted::TimedOut));
    }

    #[tokio::test]
    async fn bounded_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = bounded(&cancel, Duration::from_secs(5), async { 1 }).await;
        assert_eq!(outcome, Err(Interrupted::Cancelled));
    }

    #[test]
    fn https_port_follows_the_port_table() {
        let mut config = ProbeConfig::default();
        assert_eq!(https_port(&config), 443);
        config.ports = vec![(Service::Https, 8443)];
        assert_eq!(https_port(&config), 8443);
        config.ports.clear();
        assert_eq!(https_port(&config), 443);
    }

    #[tokio::test]
    async fn cancelled_ip_evaluation_still_yields_a_full_result() {
        let config = ProbeConfig {
            rbl_servers: vec!["rbl.invalid".to_string()],
            dkim_selectors: Vec::new(),
            ..ProbeConfig::default()
        };
        let scanner = Scanner::new(config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let target = Target::parse("192.0.2.1").unwrap();
        let result = scanner.evaluate(&target, &cancel).await;

        assert!(result.is_ip);
        let entry = result.blacklist_results.get("rbl.invalid").unwrap();
        assert_eq!(entry.listed, crate::core::models::Listing::Error);
        assert!(result.ptr_records.as_ref().unwrap().records.failure().is_some());
        assert!(!result.port_scan_results.is_open(Service::Https));
        assert_eq!(result.ssl_cert_results.status, crate::core::models::TlsStatus::Skipped);
        assert!(result.health_score.score <= 100);
        let findings: Vec<_> = result.health_score.findings.iter().map(|f| f.code).collect();
        assert_eq!(findings, vec!["PTR_MISSING", "PORTS_MAIL_CLOSED"]);
    }
}
