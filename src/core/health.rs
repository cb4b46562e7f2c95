// src/core/health.rs

use crate::core::knowledge_base::{self as kb, penalty};
use crate::core::models::{
    AuthStatus, EvaluationResult, Finding, HealthScore, RecordSet, Service, TlsStatus,
};
use tracing::debug;

const MAX_SCORE: i32 = 100;
const EXPIRY_WARNING_DAYS: i64 = 30;

/// Running total while the rules are applied.
struct ScoreSheet {
    score: i32,
    findings: Vec<Finding>,
}

impl ScoreSheet {
    fn deduct(&mut self, code: &'static str, times: usize, message: String) {
        let points = penalty(code) * times as i32;
        debug!(code, points, "Applying scoring rule.");
        self.score -= points;
        self.findings.push(Finding::new(code, message));
    }

    fn finish(self) -> HealthScore {
        HealthScore { score: self.score.clamp(0, MAX_SCORE) as u8, findings: self.findings }
    }
}

/// Scores a joined evaluation. Starts at 100; each triggered rule deducts its knowledge-base
/// penalty and appends one finding, in rule order. The result is clamped to `0..=100`.
pub fn calculate_health_score(result: &EvaluationResult) -> HealthScore {
    let mut sheet = ScoreSheet { score: MAX_SCORE, findings: Vec::new() };

    // Blacklists (IP targets). Inconclusive lookups do not count.
    if result.is_ip {
        let listed = result.blacklist_results.listed_count();
        if listed > 0 {
            sheet.deduct(kb::RBL_LISTED, listed, format!("{} RBL listings found.", listed));
        }
    }

    // Email authentication (domain targets).
    if let (false, Some(email)) = (result.is_ip, &result.email_config) {
        if email.spf.status == AuthStatus::Missing {
            sheet.deduct(kb::EMAIL_SPF_MISSING, 1, "Missing or invalid SPF record.".to_string());
        }
        if email.dkim.status == AuthStatus::Missing {
            sheet.deduct(kb::EMAIL_DKIM_MISSING, 1, "Missing or invalid DKIM record.".to_string());
        }
        if email.dmarc.status == AuthStatus::Missing {
            sheet.deduct(kb::EMAIL_DMARC_MISSING, 1, "Missing or invalid DMARC record.".to_string());
        } else if email.dmarc.is_found() && email.dmarc.policy.as_deref() == Some("none") {
            sheet.deduct(
                kb::EMAIL_DMARC_POLICY_NONE,
                1,
                "DMARC policy is set to 'p=none', which is weak.".to_string(),
            );
        }
    }

    // Reverse DNS (IP targets).
    if let (true, Some(ptr)) = (result.is_ip, &result.ptr_records) {
        match &ptr.records {
            RecordSet::Failed(_) => {
                sheet.deduct(kb::PTR_MISSING, 1, "Missing or invalid Reverse DNS (PTR) record.".to_string());
            }
            RecordSet::Found(names) => {
                if let (Some(name), Some(false)) = (names.first(), ptr.forward_confirmed) {
                    sheet.deduct(
                        kb::PTR_MISMATCH,
                        1,
                        format!("PTR record '{}' does not directly match original host.", name),
                    );
                }
            }
        }
    }

    // Ports.
    let ports = &result.port_scan_results;
    if !ports.0.is_empty() {
        if !(ports.is_open(Service::Smtp) || ports.is_open(Service::Submission)) {
            sheet.deduct(
                kb::PORTS_MAIL_CLOSED,
                1,
                "Common SMTP/Submission ports (25/587) are not open.".to_string(),
            );
        }
        if !result.is_ip && !ports.is_open(Service::Https) {
            sheet.deduct(kb::PORTS_HTTPS_CLOSED, 1, "HTTPS port (443) is not open for web services.".to_string());
        }
    }

    // TLS certificate. At most one of these applies.
    let tls = &result.ssl_cert_results;
    match (tls.status, tls.expires_in_days) {
        (TlsStatus::Expired, _) => {
            sheet.deduct(kb::TLS_EXPIRED, 1, "SSL/TLS certificate is expired.".to_string());
        }
        (TlsStatus::Error, _) => {
            sheet.deduct(
                kb::TLS_CHECK_FAILED,
                1,
                format!("SSL/TLS certificate check failed: {}", tls.error.as_deref().unwrap_or_default()),
            );
        }
        (_, Some(days)) if days < EXPIRY_WARNING_DAYS => {
            sheet.deduct(
                kb::TLS_EXPIRING_SOON,
                1,
                format!("SSL/TLS certificate expires in less than 30 days ({} days).", days),
            );
        }
        _ => {}
    }

    sheet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        AllDnsRecords, AuthRecords, BlacklistResults, DnsFailure, DnsFailureKind, EmailConfig, Listing,
        NsRecords, PortScanResults, PortStatus, PtrRecords, RblEntry, TlsResult,
    };
    use crate::core::scanner::dns_scanner::{dmarc_from_txt, spf_from_txt, NO_DKIM_RECORD};

    fn ports(smtp: PortStatus, submission: PortStatus, https: PortStatus) -> PortScanResults {
        PortScanResults(vec![
            (Service::Smtp, smtp),
            (Service::Smtps, PortStatus::Closed),
            (Service::Submission, submission),
            (Service::Http, PortStatus::Open),
            (Service::Https, https),
        ])
    }

    fn valid_tls(days: i64) -> TlsResult {
        TlsResult {
            status: TlsStatus::Valid,
            common_name: Some("example.com".into()),
            issuer: Some("R11".into()),
            not_before: None,
            not_after: None,
            expires_in_days: Some(days),
            error: None,
        }
    }

    fn healthy_email() -> EmailConfig {
        EmailConfig {
            spf: AuthRecords::found(vec!["v=spf1 -all".into()]),
            dkim: AuthRecords::found(vec!["Selector 'default': v=DKIM1; p=MIIB".into()]),
            dmarc: dmarc_from_txt(&RecordSet::Found(vec!["v=DMARC1; p=reject".into()])),
        }
    }

    fn domain_result() -> EvaluationResult {
        let empty = RecordSet::Found(Vec::new());
        EvaluationResult {
            query: "example.com".into(),
            is_ip: false,
            blacklist_results: BlacklistResults::default(),
            mx_records: Vec::new(),
            ns_records: NsRecords::default(),
            all_dns_records: Some(AllDnsRecords {
                a: empty.clone(),
                aaaa: empty.clone(),
                cname: empty.clone(),
                txt: empty.clone(),
                ns: empty.clone(),
                soa: empty,
            }),
            email_config: Some(healthy_email()),
            ptr_records: None,
            port_scan_results: ports(PortStatus::Open, PortStatus::Open, PortStatus::Open),
            ssl_cert_results: valid_tls(90),
            health_score: HealthScore::default(),
            message: String::new(),
        }
    }

    fn ip_result() -> EvaluationResult {
        EvaluationResult {
            query: "192.0.2.25".into(),
            is_ip: true,
            email_config: None,
            all_dns_records: None,
            ptr_records: Some(PtrRecords {
                records: RecordSet::Found(vec!["mail.example.com".into()]),
                forward_confirmed: Some(true),
            }),
            ssl_cert_results: TlsResult::skipped("HTTPS port not open or not applicable."),
            ..domain_result()
        }
    }

    fn rbl(server: &str, listed: Listing) -> RblEntry {
        RblEntry { server: server.into(), listed, details: Vec::new() }
    }

    fn codes(score: &HealthScore) -> Vec<&'static str> {
        score.findings.iter().map(|f| f.code).collect()
    }

    #[test]
    fn healthy_domain_scores_full_marks() {
        let score = calculate_health_score(&domain_result());
        assert_eq!(score.score, 100);
        assert!(score.findings.is_empty());
    }

    #[test]
    fn spf_record_present_means_no_spf_issue() {
        let mut result = domain_result();
        let txt = RecordSet::Found(vec!["v=spf1 include:_spf.example.com ~all".into()]);
        result.email_config.as_mut().unwrap().spf = spf_from_txt(&txt);
        let score = calculate_health_score(&result);
        assert_eq!(result.email_config.as_ref().unwrap().spf.entries, vec!["v=spf1 include:_spf.example.com ~all"]);
        assert!(!codes(&score).contains(&kb::EMAIL_SPF_MISSING));
        assert_eq!(score.score, 100);
    }

    #[test]
    fn missing_dmarc_costs_ten() {
        let mut result = domain_result();
        let no_answer = RecordSet::Failed(DnsFailure::new("TXT", "_dmarc.example.com", DnsFailureKind::NoAnswer));
        result.email_config.as_mut().unwrap().dmarc = dmarc_from_txt(&no_answer);
        let score = calculate_health_score(&result);
        assert_eq!(result.email_config.as_ref().unwrap().dmarc.entries, vec!["No DMARC record found."]);
        assert_eq!(score.score, 90);
        assert_eq!(score.issues().collect::<Vec<_>>(), vec!["Missing or invalid DMARC record."]);
    }

    #[test]
    fn weak_dmarc_policy_costs_five() {
        let mut result = domain_result();
        result.email_config.as_mut().unwrap().dmarc =
            dmarc_from_txt(&RecordSet::Found(vec!["v=DMARC1; p=none".into()]));
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 95);
        assert_eq!(codes(&score), vec![kb::EMAIL_DMARC_POLICY_NONE]);
    }

    #[test]
    fn inconclusive_email_lookups_are_not_penalised() {
        let mut result = domain_result();
        let email = result.email_config.as_mut().unwrap();
        email.spf = AuthRecords::lookup_failed(vec!["Error fetching TXT record".into()]);
        email.dkim = AuthRecords::lookup_failed(vec!["Selector 'default': timed out".into()]);
        assert_eq!(calculate_health_score(&result).score, 100);
    }

    #[test]
    fn mail_ports_rule_counts_once() {
        let mut result = domain_result();
        result.port_scan_results = ports(PortStatus::Closed, PortStatus::Closed, PortStatus::Open);
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 95);
        assert_eq!(codes(&score), vec![kb::PORTS_MAIL_CLOSED]);
    }

    #[test]
    fn submission_alone_satisfies_the_mail_rule() {
        let mut result = domain_result();
        result.port_scan_results = ports(PortStatus::Filtered(None), PortStatus::Open, PortStatus::Open);
        assert_eq!(calculate_health_score(&result).score, 100);
    }

    #[test]
    fn https_rule_only_for_domains() {
        let mut result = domain_result();
        result.port_scan_results = ports(PortStatus::Open, PortStatus::Open, PortStatus::Closed);
        result.ssl_cert_results = TlsResult::skipped("HTTPS port not open or not applicable.");
        assert_eq!(codes(&calculate_health_score(&result)), vec![kb::PORTS_HTTPS_CLOSED]);

        let mut ip = ip_result();
        ip.port_scan_results = ports(PortStatus::Open, PortStatus::Open, PortStatus::Closed);
        assert!(calculate_health_score(&ip).findings.is_empty());
    }

    #[test]
    fn expired_certificate_costs_exactly_ten() {
        let mut result = domain_result();
        result.ssl_cert_results = TlsResult { status: TlsStatus::Expired, ..valid_tls(-3) };
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 90);
        assert_eq!(codes(&score), vec![kb::TLS_EXPIRED]);
    }

    #[test]
    fn tls_error_and_expiring_soon() {
        let mut result = domain_result();
        result.ssl_cert_results = TlsResult::error("SSL Error: certificate verify failed".into());
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 95);
        assert_eq!(
            score.findings[0].message,
            "SSL/TLS certificate check failed: SSL Error: certificate verify failed"
        );

        result.ssl_cert_results = valid_tls(12);
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 95);
        assert_eq!(score.findings[0].message, "SSL/TLS certificate expires in less than 30 days (12 days).");

        result.ssl_cert_results = valid_tls(30);
        assert_eq!(calculate_health_score(&result).score, 100);
    }

    #[test]
    fn rbl_penalty_counts_listings_not_errors() {
        let mut result = ip_result();
        result.blacklist_results = BlacklistResults(vec![
            rbl("zen.spamhaus.org", Listing::Listed),
            rbl("bl.spamcop.net", Listing::Error),
            rbl("cbl.abuseat.org", Listing::Listed),
            rbl("b.barracudacentral.org", Listing::NotListed),
        ]);
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 80);
        assert_eq!(score.issues().collect::<Vec<_>>(), vec!["2 RBL listings found."]);

        result.blacklist_results = BlacklistResults(vec![rbl("bl.spamcop.net", Listing::Error)]);
        assert_eq!(calculate_health_score(&result).score, 100);
    }

    #[test]
    fn ptr_rules() {
        let mut result = ip_result();
        result.ptr_records = Some(PtrRecords {
            records: RecordSet::Failed(DnsFailure::new("PTR", "192.0.2.25", DnsFailureKind::NxDomain)),
            forward_confirmed: None,
        });
        assert_eq!(codes(&calculate_health_score(&result)), vec![kb::PTR_MISSING]);

        result.ptr_records = Some(PtrRecords {
            records: RecordSet::Found(vec!["host.example.net".into()]),
            forward_confirmed: Some(false),
        });
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 95);
        assert_eq!(score.findings[0].message, "PTR record 'host.example.net' does not directly match original host.");
    }

    #[test]
    fn issue_order_follows_rule_order() {
        let mut result = domain_result();
        let email = result.email_config.as_mut().unwrap();
        email.spf = AuthRecords::missing("No SPF record found.");
        email.dkim = AuthRecords::missing(NO_DKIM_RECORD);
        result.port_scan_results = ports(PortStatus::Closed, PortStatus::Closed, PortStatus::Open);
        result.ssl_cert_results = valid_tls(5);
        let score = calculate_health_score(&result);
        assert_eq!(
            codes(&score),
            vec![kb::EMAIL_SPF_MISSING, kb::EMAIL_DKIM_MISSING, kb::PORTS_MAIL_CLOSED, kb::TLS_EXPIRING_SOON]
        );
        assert_eq!(score.score, 100 - 15 - 15 - 5 - 5);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        let mut result = ip_result();
        result.blacklist_results =
            BlacklistResults((0..12).map(|i| rbl(&format!("rbl{}.example", i), Listing::Listed)).collect());
        result.ptr_records = Some(PtrRecords {
            records: RecordSet::Failed(DnsFailure::new("PTR", "192.0.2.25", DnsFailureKind::TimedOut)),
            forward_confirmed: None,
        });
        result.port_scan_results = ports(PortStatus::Closed, PortStatus::Closed, PortStatus::Closed);
        result.ssl_cert_results = TlsResult::error("Connection timed out during SSL handshake.".into());
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 0);
        assert_eq!(score.findings.len(), 4);
    }

    #[test]
    fn all_failure_domain_stays_in_range() {
        let mut result = domain_result();
        result.email_config = Some(EmailConfig {
            spf: AuthRecords::missing("No SPF record found."),
            dkim: AuthRecords::missing(NO_DKIM_RECORD),
            dmarc: AuthRecords::missing("No DMARC record found."),
        });
        result.port_scan_results = ports(
            PortStatus::HostnameUnresolvable,
            PortStatus::HostnameUnresolvable,
            PortStatus::HostnameUnresolvable,
        );
        result.ssl_cert_results = TlsResult::skipped("HTTPS port not open or not applicable.");
        let score = calculate_health_score(&result);
        assert_eq!(score.score, 100 - 15 - 15 - 10 - 5 - 3);
    }
}
