// src/core/scanner/dns_scanner.rs

use tracing::{debug, info, warn};

use super::{bounded, Interrupted};
use crate::core::models::{
    AllDnsRecords, AuthRecords, AuthStatus, DnsFailure, DnsFailureKind, EmailConfig, MxPreference,
    MxRecord, NsAddresses, NsRecord, NsRecords, PtrRecords, RecordSet,
};
use futures::future::join_all;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const NO_SPF_RECORD: &str = "No SPF record found (v=spf1 not present in TXT records).";
pub const NO_DKIM_RECORD: &str = "No DKIM record found using common selectors.";
pub const NO_DMARC_RECORD: &str = "No DMARC record found.";

/// Builds the shared asynchronous resolver. Each query is additionally bounded by [`DnsProbe`].
pub fn build_resolver(timeout: Duration) -> TokioAsyncResolver {
    build_resolver_with(ResolverConfig::default(), timeout)
}

/// Same as [`build_resolver`], against explicit upstream servers.
pub fn build_resolver_with(config: ResolverConfig, timeout: Duration) -> TokioAsyncResolver {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    TokioAsyncResolver::tokio(config, opts)
}

/// A resolver handle bound to one evaluation: a per-query timeout and the caller's cancellation.
#[derive(Clone)]
pub struct DnsProbe {
    resolver: TokioAsyncResolver,
    timeout: Duration,
    cancel: CancellationToken,
}

impl DnsProbe {
    pub fn new(resolver: TokioAsyncResolver, timeout: Duration, cancel: CancellationToken) -> Self {
        Self { resolver, timeout, cancel }
    }

    /// Same resolver and cancellation, different per-query timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self { timeout, ..self.clone() }
    }

    /// Performs one DNS query. Failures never escape: they come back as `RecordSet::Failed`.
    pub async fn resolve_record(&self, name: &str, record_type: RecordType) -> RecordSet {
        debug!(name, %record_type, "Resolving record.");
        let type_label = record_type.to_string();
        match bounded(&self.cancel, self.timeout, self.resolver.lookup(name, record_type)).await {
            Ok(Ok(lookup)) => {
                let values: Vec<String> = lookup
                    .iter()
                    .filter(|rdata| rdata.record_type() == record_type)
                    .map(rdata_to_string)
                    .collect();
                if values.is_empty() {
                    RecordSet::Failed(DnsFailure::new(type_label, name, DnsFailureKind::NoAnswer))
                } else {
                    RecordSet::Found(values)
                }
            }
            Ok(Err(e)) => {
                let kind = classify_resolve_error(&e);
                debug!(name, %record_type, error = %e, "Lookup failed.");
                RecordSet::Failed(DnsFailure::new(type_label, name, kind))
            }
            Err(Interrupted::TimedOut) => {
                warn!(name, %record_type, "Lookup timed out.");
                RecordSet::Failed(DnsFailure::new(type_label, name, DnsFailureKind::TimedOut))
            }
            Err(Interrupted::Cancelled) => {
                RecordSet::Failed(DnsFailure::new(type_label, name, DnsFailureKind::Cancelled))
            }
        }
    }
}

fn classify_resolve_error(error: &ResolveError) -> DnsFailureKind {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } if *response_code == ResponseCode::NXDomain => {
            DnsFailureKind::NxDomain
        }
        ResolveErrorKind::NoRecordsFound { .. } => DnsFailureKind::NoAnswer,
        ResolveErrorKind::Timeout => DnsFailureKind::TimedOut,
        ResolveErrorKind::NoConnections => DnsFailureKind::NoNameservers,
        _ => DnsFailureKind::Other(error.to_string()),
    }
}

/// TXT character-strings are joined without quotes; everything else uses the presentation format.
fn rdata_to_string(rdata: &RData) -> String {
    match rdata {
        RData::TXT(txt) => txt.iter().map(|bytes| String::from_utf8_lossy(bytes)).collect(),
        other => other.to_string(),
    }
}

/// The address labels in reverse order: `d.c.b.a` for IPv4, reversed nibbles for IPv6.
pub fn reversed_address_labels(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            format!("{}.{}.{}.{}", octets[3], octets[2], octets[1], octets[0])
        }
        IpAddr::V6(v6) => v6
            .octets()
            .iter()
            .rev()
            .flat_map(|byte| [byte & 0x0f, byte >> 4])
            .map(|nibble| format!("{:x}", nibble))
            .collect::<Vec<_>>()
            .join("."),
    }
}

/// The PTR query name for an address (`in-addr.arpa` / `ip6.arpa`).
pub fn reverse_pointer_name(ip: IpAddr) -> String {
    let zone = if ip.is_ipv4() { "in-addr.arpa." } else { "ip6.arpa." };
    format!("{}.{}", reversed_address_labels(ip), zone)
}

// --- MX ---

pub async fn get_mx_records(dns: &DnsProbe, domain: &str) -> Vec<MxRecord> {
    let records = parse_mx_records(&dns.resolve_record(domain, RecordType::MX).await);
    info!(domain, count = records.len(), "MX lookup finished.");
    records
}

/// Parses `"<preference> <exchange>."` lines. Malformed lines stay visible with a parse-error
/// preference; sorting happens only when the first line parsed.
pub fn parse_mx_records(answer: &RecordSet) -> Vec<MxRecord> {
    let lines = match answer {
        RecordSet::Found(lines) => lines,
        RecordSet::Failed(failure) => {
            return vec![MxRecord { preference: MxPreference::NotAvailable, exchange: failure.to_string() }];
        }
    };

    let mut records: Vec<MxRecord> = lines
        .iter()
        .map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next().map(str::parse::<u16>), parts.next()) {
                (Some(Ok(preference)), Some(exchange)) => MxRecord {
                    preference: MxPreference::Value(preference),
                    exchange: exchange.trim_matches('.').to_string(),
                },
                _ => MxRecord { preference: MxPreference::ParseError, exchange: line.clone() },
            }
        })
        .collect();

    if matches!(records.first(), Some(MxRecord { preference: MxPreference::Value(_), .. })) {
        // Stable sort; entries that failed to parse go last.
        records.sort_by_key(|record| match record.preference {
            MxPreference::Value(preference) => (0, preference),
            _ => (1, 0),
        });
    }
    records
}

// --- Record overview ---

pub async fn get_all_dns_records(dns: &DnsProbe, domain: &str) -> AllDnsRecords {
    let (a, aaaa, cname, txt, ns, soa) = tokio::join!(
        dns.resolve_record(domain, RecordType::A),
        dns.resolve_record(domain, RecordType::AAAA),
        dns.resolve_record(domain, RecordType::CNAME),
        dns.resolve_record(domain, RecordType::TXT),
        dns.resolve_record(domain, RecordType::NS),
        dns.resolve_record(domain, RecordType::SOA),
    );
    AllDnsRecords { a, aaaa, cname, txt, ns, soa }
}

// --- NS ---

pub async fn get_ns_records_with_ips(dns: &DnsProbe, domain: &str) -> NsRecords {
    let names = match dns.resolve_record(domain, RecordType::NS).await {
        RecordSet::Found(names) => names,
        RecordSet::Failed(failure) => {
            warn!(domain, error = %failure, "NS lookup failed.");
            return NsRecords::Failed(failure);
        }
    };

    let records = join_all(names.iter().map(|raw_name| async move {
        let name = raw_name.trim_matches('.').to_string();
        let (a, aaaa) = tokio::join!(
            dns.resolve_record(&name, RecordType::A),
            dns.resolve_record(&name, RecordType::AAAA),
        );
        ns_record_from_lookups(name, &a, &aaaa)
    }))
    .await;

    info!(domain, nameservers = records.len(), "NS lookup finished.");
    NsRecords::Found(records)
}

/// One nameserver entry from its own A and AAAA answers. A failed family only drops its
/// addresses; `NotFound` means neither family produced one.
pub fn ns_record_from_lookups(name: String, a: &RecordSet, aaaa: &RecordSet) -> NsRecord {
    let ips: Vec<String> = a.values().iter().chain(aaaa.values()).cloned().collect();
    let ips = if ips.is_empty() { NsAddresses::NotFound } else { NsAddresses::Resolved(ips) };
    NsRecord { name, ips }
}

// --- Email authentication ---

pub async fn get_email_config_records(dns: &DnsProbe, domain: &str, selectors: &[String]) -> EmailConfig {
    let dmarc_name = format!("_dmarc.{}", domain);
    let dkim_lookups = join_all(selectors.iter().map(|selector| async move {
        let name = format!("{}._domainkey.{}", selector, domain);
        (selector.clone(), dns.resolve_record(&name, RecordType::TXT).await)
    }));

    let (txt, dkim, dmarc) = tokio::join!(
        dns.resolve_record(domain, RecordType::TXT),
        dkim_lookups,
        dns.resolve_record(&dmarc_name, RecordType::TXT),
    );

    let config = EmailConfig {
        spf: spf_from_txt(&txt),
        dkim: dkim_from_selectors(&dkim),
        dmarc: dmarc_from_txt(&dmarc),
    };
    info!(
        domain,
        spf = ?config.spf.status,
        dkim = ?config.dkim.status,
        dmarc = ?config.dmarc.status,
        "Email configuration lookup finished."
    );
    config
}

/// Shared handling for a TXT answer filtered by `marker` (matched case-insensitively).
fn filter_txt(answer: &RecordSet, marker: &str, not_found: &str) -> AuthRecords {
    match answer {
        RecordSet::Found(values) => {
            let matching: Vec<String> = values
                .iter()
                .filter(|value| value.to_lowercase().contains(marker))
                .cloned()
                .collect();
            if matching.is_empty() {
                AuthRecords::missing(not_found)
            } else {
                AuthRecords::found(matching)
            }
        }
        RecordSet::Failed(failure) if failure.is_negative_answer() => AuthRecords::missing(not_found),
        RecordSet::Failed(failure) => AuthRecords::lookup_failed(vec![failure.to_string()]),
    }
}

pub fn spf_from_txt(answer: &RecordSet) -> AuthRecords {
    filter_txt(answer, "v=spf1", NO_SPF_RECORD)
}

pub fn dmarc_from_txt(answer: &RecordSet) -> AuthRecords {
    let mut records = filter_txt(answer, "v=dmarc1", NO_DMARC_RECORD);
    if records.is_found() {
        records.policy = records.entries.first().and_then(|record| parse_dmarc_policy(record));
    }
    records
}

/// Extracts the `p=` tag of a DMARC record, lowercased.
pub fn parse_dmarc_policy(record: &str) -> Option<String> {
    record
        .split(';')
        .find(|tag| tag.trim().to_lowercase().starts_with("p="))
        .and_then(|tag| tag.trim().split('=').nth(1))
        .map(|policy| policy.trim().to_lowercase())
}

/// Combines per-selector DKIM answers. Records containing `p=` are evidence; other answers are
/// listed but do not count; failed lookups only matter when nothing conclusive came back.
pub fn dkim_from_selectors(lookups: &[(String, RecordSet)]) -> AuthRecords {
    let mut details = Vec::new();
    let mut failures = Vec::new();
    let mut found = false;
    let mut conclusive = false;

    for (selector, answer) in lookups {
        match answer {
            RecordSet::Found(values) => {
                conclusive = true;
                let valid: Vec<&String> = values.iter().filter(|v| v.to_lowercase().contains("p=")).collect();
                if valid.is_empty() {
                    if let Some(first) = values.first() {
                        details.push(format!("Selector '{}': {}", selector, first));
                    }
                } else {
                    found = true;
                    details.extend(valid.iter().map(|record| format!("Selector '{}': {}", selector, record)));
                }
            }
            RecordSet::Failed(failure) if failure.is_negative_answer() => conclusive = true,
            RecordSet::Failed(failure) => failures.push(format!("Selector '{}': {}", selector, failure)),
        }
    }

    if found {
        AuthRecords::found(details)
    } else if !conclusive && !failures.is_empty() {
        AuthRecords::lookup_failed(failures)
    } else if details.is_empty() {
        AuthRecords::missing(NO_DKIM_RECORD)
    } else {
        AuthRecords { status: AuthStatus::Missing, entries: details, policy: None }
    }
}

// --- Reverse DNS ---

pub async fn check_reverse_dns(dns: &DnsProbe, ip: IpAddr) -> PtrRecords {
    let records = match dns.resolve_record(&reverse_pointer_name(ip), RecordType::PTR).await {
        RecordSet::Found(names) => {
            RecordSet::Found(names.iter().map(|name| name.trim_end_matches('.').to_string()).collect())
        }
        RecordSet::Failed(failure) => {
            RecordSet::Failed(DnsFailure { query: ip.to_string(), ..failure })
        }
    };

    let forward_confirmed = match records.values().first() {
        Some(hostname) => {
            let (a, aaaa) = tokio::join!(
                dns.resolve_record(hostname, RecordType::A),
                dns.resolve_record(hostname, RecordType::AAAA),
            );
            forward_confirmation(ip, &a, &aaaa)
        }
        None => None,
    };

    info!(%ip, ptr = ?records.values(), ?forward_confirmed, "Reverse DNS lookup finished.");
    PtrRecords { records, forward_confirmed }
}

/// Whether the forward answers for a PTR hostname contain `ip`.
///
/// `Some(false)` needs a conclusive answer (records, NXDOMAIN or an empty answer) for the
/// address family of `ip`; a timed-out or failed lookup leaves the question open (`None`).
pub fn forward_confirmation(ip: IpAddr, a: &RecordSet, aaaa: &RecordSet) -> Option<bool> {
    let confirmed = a
        .values()
        .iter()
        .chain(aaaa.values())
        .any(|value| value.parse::<IpAddr>().is_ok_and(|resolved| resolved == ip));
    if confirmed {
        return Some(true);
    }
    let same_family = if ip.is_ipv4() { a } else { aaaa };
    match same_family {
        RecordSet::Found(_) => Some(false),
        RecordSet::Failed(failure) if failure.is_negative_answer() => Some(false),
        RecordSet::Failed(_) => None,
    }
}
