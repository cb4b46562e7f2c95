// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;
use strum::{Display, EnumIter, IntoEnumIterator};

// --- Core models ---

/// How serious a scoring finding is; drives presentation only, not the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

// --- Probe failure models ---

/// Why a single DNS query did not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsFailureKind {
    NxDomain,
    NoAnswer,
    NoNameservers,
    TimedOut,
    Cancelled,
    Other(String),
}

impl fmt::Display for DnsFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsFailureKind::NxDomain => write!(f, "The DNS query name does not exist."),
            DnsFailureKind::NoAnswer => write!(f, "The DNS response does not contain an answer."),
            DnsFailureKind::NoNameservers => write!(f, "All nameservers failed to answer the query."),
            DnsFailureKind::TimedOut => write!(f, "The DNS operation timed out."),
            DnsFailureKind::Cancelled => write!(f, "The DNS query was cancelled."),
            DnsFailureKind::Other(message) => write!(f, "{}", message),
        }
    }
}

/// A failed lookup, kept as data so it can be shown next to the successful ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsFailure {
    pub record_type: String,
    pub query: String,
    pub kind: DnsFailureKind,
}

impl DnsFailure {
    pub fn new(record_type: impl Into<String>, query: impl Into<String>, kind: DnsFailureKind) -> Self {
        Self { record_type: record_type.into(), query: query.into(), kind }
    }

    /// NXDOMAIN or an empty answer: the server answered, there is just nothing there.
    pub fn is_negative_answer(&self) -> bool {
        matches!(self.kind, DnsFailureKind::NxDomain | DnsFailureKind::NoAnswer)
    }
}

impl fmt::Display for DnsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error fetching {} record for {}: {}", self.record_type, self.query, self.kind)
    }
}

/// The outcome of one `resolve_record` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSet {
    Found(Vec<String>),
    Failed(DnsFailure),
}

impl RecordSet {
    /// Record values, empty when the lookup failed.
    pub fn values(&self) -> &[String] {
        match self {
            RecordSet::Found(values) => values,
            RecordSet::Failed(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&DnsFailure> {
        match self {
            RecordSet::Found(_) => None,
            RecordSet::Failed(failure) => Some(failure),
        }
    }

    /// Values as shown to the user: the records, or the single error marker.
    pub fn display_values(&self) -> Vec<String> {
        match self {
            RecordSet::Found(values) => values.clone(),
            RecordSet::Failed(failure) => vec![failure.to_string()],
        }
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.display_values())
    }
}

// --- DNS models ---

/// The fixed set of record types collected for a domain.
#[derive(Debug, Clone, Serialize)]
pub struct AllDnsRecords {
    pub a: RecordSet,
    pub aaaa: RecordSet,
    pub cname: RecordSet,
    pub txt: RecordSet,
    pub ns: RecordSet,
    pub soa: RecordSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxPreference {
    Value(u16),
    ParseError,
    /// The MX lookup itself failed.
    NotAvailable,
}

impl Serialize for MxPreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MxPreference::Value(preference) => serializer.serialize_u16(*preference),
            MxPreference::ParseError => serializer.serialize_str("Parse Error"),
            MxPreference::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MxRecord {
    pub preference: MxPreference,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsAddresses {
    Resolved(Vec<String>),
    NotFound,
}

impl Serialize for NsAddresses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NsAddresses::Resolved(ips) => serializer.collect_seq(ips),
            NsAddresses::NotFound => serializer.collect_seq(["No IP found"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NsRecord {
    pub name: String,
    pub ips: NsAddresses,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsRecords {
    Found(Vec<NsRecord>),
    Failed(DnsFailure),
}

impl NsRecords {
    /// True when at least one nameserver resolved to a real address.
    pub fn any_resolved(&self) -> bool {
        match self {
            NsRecords::Found(records) => records
                .iter()
                .any(|record| matches!(&record.ips, NsAddresses::Resolved(ips) if !ips.is_empty())),
            NsRecords::Failed(_) => false,
        }
    }
}

impl Default for NsRecords {
    fn default() -> Self {
        NsRecords::Found(Vec::new())
    }
}

impl Serialize for NsRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NsRecords::Found(records) => serializer.collect_seq(records),
            NsRecords::Failed(failure) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&NsRecord {
                    name: failure.to_string(),
                    ips: NsAddresses::Resolved(Vec::new()),
                })?;
                seq.end()
            }
        }
    }
}

// --- Email authentication models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Found,
    /// The lookup succeeded (or the name does not exist) but no matching record was published.
    Missing,
    /// The lookup itself failed, so nothing can be said about the record.
    LookupFailed,
}

/// One email-authentication mechanism (SPF, DKIM or DMARC) as seen in DNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRecords {
    pub status: AuthStatus,
    pub entries: Vec<String>,
    /// The DMARC `p=` tag; always `None` for SPF and DKIM.
    pub policy: Option<String>,
}

impl AuthRecords {
    pub fn found(entries: Vec<String>) -> Self {
        Self { status: AuthStatus::Found, entries, policy: None }
    }

    pub fn missing(marker: &str) -> Self {
        Self { status: AuthStatus::Missing, entries: vec![marker.to_string()], policy: None }
    }

    pub fn lookup_failed(entries: Vec<String>) -> Self {
        Self { status: AuthStatus::LookupFailed, entries, policy: None }
    }

    pub fn is_found(&self) -> bool {
        self.status == AuthStatus::Found
    }
}

impl Serialize for AuthRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailConfig {
    pub spf: AuthRecords,
    pub dkim: AuthRecords,
    pub dmarc: AuthRecords,
}

/// Reverse DNS for an IP target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrRecords {
    pub records: RecordSet,
    /// Whether the first PTR hostname resolves back to the queried address.
    /// `None` when there was no hostname to check or its forward lookup did not answer.
    pub forward_confirmed: Option<bool>,
}

impl Serialize for PtrRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

// --- Blacklist models ---

/// Tri-state RBL answer; `Error` is inconclusive, never a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Listed,
    NotListed,
    Error,
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Listing::Listed => serializer.serialize_bool(true),
            Listing::NotListed => serializer.serialize_bool(false),
            Listing::Error => serializer.serialize_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RblEntry {
    #[serde(skip)]
    pub server: String,
    pub listed: Listing,
    pub details: Vec<String>,
}

/// RBL answers in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlacklistResults(pub Vec<RblEntry>);

impl BlacklistResults {
    pub fn listed_count(&self) -> usize {
        self.0.iter().filter(|entry| entry.listed == Listing::Listed).count()
    }

    pub fn get(&self, server: &str) -> Option<&RblEntry> {
        self.0.iter().find(|entry| entry.server == server)
    }
}

impl Serialize for BlacklistResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.server, entry)?;
        }
        map.end()
    }
}

// --- Port models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Service {
    #[strum(serialize = "SMTP")]
    Smtp,
    #[strum(serialize = "SMTPS")]
    Smtps,
    #[strum(serialize = "Submission")]
    Submission,
    #[strum(serialize = "HTTP")]
    Http,
    #[strum(serialize = "HTTPS")]
    Https,
}

impl Service {
    pub fn default_port(self) -> u16 {
        match self {
            Service::Smtp => 25,
            Service::Smtps => 465,
            Service::Submission => 587,
            Service::Http => 80,
            Service::Https => 443,
        }
    }

    /// The well-known service table, in probing order.
    pub fn default_table() -> Vec<(Service, u16)> {
        Service::iter().map(|service| (service, service.default_port())).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortStatus {
    Open,
    Closed,
    /// Any other connect failure; the OS error code when one was reported, `None` on timeout.
    Filtered(Option<i32>),
    HostnameUnresolvable,
    SocketError(String),
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Open => write!(f, "Open"),
            PortStatus::Closed => write!(f, "Closed"),
            PortStatus::Filtered(Some(code)) => write!(f, "Filtered (Error Code: {})", code),
            PortStatus::Filtered(None) => write!(f, "Filtered (timed out)"),
            PortStatus::HostnameUnresolvable => write!(f, "Hostname could not be resolved"),
            PortStatus::SocketError(message) => write!(f, "Socket error: {}", message),
        }
    }
}

impl Serialize for PortStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortScanResults(pub Vec<(Service, PortStatus)>);

impl PortScanResults {
    pub fn status(&self, service: Service) -> Option<&PortStatus> {
        self.0.iter().find(|(s, _)| *s == service).map(|(_, status)| status)
    }

    pub fn is_open(&self, service: Service) -> bool {
        matches!(self.status(service), Some(PortStatus::Open))
    }
}

impl Serialize for PortScanResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (service, status) in &self.0 {
            map.serialize_entry(&service.to_string(), status)?;
        }
        map.end()
    }
}

// --- SSL/TLS models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TlsStatus {
    Valid,
    #[serde(rename = "Not Yet Valid")]
    NotYetValid,
    Expired,
    Error,
    Skipped,
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(time) => serializer.collect_str(&time.format("%Y-%m-%d %H:%M:%S")),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsResult {
    pub status: TlsStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_timestamp")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_timestamp")]
    pub not_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<i64>,
    pub error: Option<String>,
}

impl TlsResult {
    pub fn skipped(reason: &str) -> Self {
        Self::without_certificate(TlsStatus::Skipped, reason.to_string())
    }

    pub fn error(message: String) -> Self {
        Self::without_certificate(TlsStatus::Error, message)
    }

    fn without_certificate(status: TlsStatus, message: String) -> Self {
        Self {
            status,
            common_name: None,
            issuer: None,
            not_before: None,
            not_after: None,
            expires_in_days: None,
            error: Some(message),
        }
    }
}

// --- Health score ---

/// One triggered scoring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Knowledge-base code, e.g. `EMAIL_SPF_MISSING`.
    pub code: &'static str,
    pub message: String,
}

impl Finding {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthScore {
    pub score: u8,
    pub findings: Vec<Finding>,
}

impl HealthScore {
    pub fn issues(&self) -> impl Iterator<Item = &str> {
        self.findings.iter().map(|finding| finding.message.as_str())
    }
}

impl Default for HealthScore {
    fn default() -> Self {
        Self { score: 0, findings: Vec::new() }
    }
}

impl Serialize for HealthScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HealthScore", 2)?;
        state.serialize_field("score", &self.score)?;
        state.serialize_field("issues", &self.issues().collect::<Vec<_>>())?;
        state.end()
    }
}

// --- Main report ---

fn serialize_or_empty_map<T: Serialize, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

fn serialize_or_empty_seq<T: Serialize, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_seq(Some(0))?.end(),
    }
}

/// Everything learned about one target in a single evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub query: String,
    pub is_ip: bool,
    pub blacklist_results: BlacklistResults,
    pub mx_records: Vec<MxRecord>,
    pub ns_records: NsRecords,
    #[serde(serialize_with = "serialize_or_empty_map")]
    pub all_dns_records: Option<AllDnsRecords>,
    #[serde(serialize_with = "serialize_or_empty_map")]
    pub email_config: Option<EmailConfig>,
    #[serde(serialize_with = "serialize_or_empty_seq")]
    pub ptr_records: Option<PtrRecords>,
    pub port_scan_results: PortScanResults,
    pub ssl_cert_results: TlsResult,
    pub health_score: HealthScore,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ip_result() -> EvaluationResult {
        EvaluationResult {
            query: "192.0.2.1".into(),
            is_ip: true,
            blacklist_results: BlacklistResults(vec![
                RblEntry { server: "zen.spamhaus.org".into(), listed: Listing::Listed, details: vec!["127.0.0.2".into()] },
                RblEntry {
                    server: "bl.spamcop.net".into(),
                    listed: Listing::Error,
                    details: vec!["Query timed out or error: The DNS operation timed out.".into()],
                },
            ]),
            mx_records: Vec::new(),
            ns_records: NsRecords::default(),
            all_dns_records: None,
            email_config: None,
            ptr_records: Some(PtrRecords {
                records: RecordSet::Found(vec!["mail.example.com".into()]),
                forward_confirmed: Some(true),
            }),
            port_scan_results: PortScanResults(vec![
                (Service::Smtp, PortStatus::Open),
                (Service::Https, PortStatus::Filtered(Some(113))),
            ]),
            ssl_cert_results: TlsResult::skipped("HTTPS port not open or not applicable."),
            health_score: HealthScore { score: 90, findings: vec![Finding::new("RBL_LISTED", "1 RBL listings found.")] },
            message: "'192.0.2.1' is an IP address.".into(),
        }
    }

    #[test]
    fn ip_result_keeps_the_wire_layout() {
        let value = serde_json::to_value(ip_result()).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "192.0.2.1",
                "is_ip": true,
                "blacklist_results": {
                    "zen.spamhaus.org": { "listed": true, "details": ["127.0.0.2"] },
                    "bl.spamcop.net": {
                        "listed": "error",
                        "details": ["Query timed out or error: The DNS operation timed out."]
                    }
                },
                "mx_records": [],
                "ns_records": [],
                "all_dns_records": {},
                "email_config": {},
                "ptr_records": ["mail.example.com"],
                "port_scan_results": { "SMTP": "Open", "HTTPS": "Filtered (Error Code: 113)" },
                "ssl_cert_results": { "status": "Skipped", "error": "HTTPS port not open or not applicable." },
                "health_score": { "score": 90, "issues": ["1 RBL listings found."] },
                "message": "'192.0.2.1' is an IP address."
            })
        );
    }

    #[test]
    fn domain_sections_serialize_markers() {
        let failure = DnsFailure::new("NS", "example.invalid", DnsFailureKind::NxDomain);
        let mut result = ip_result();
        result.is_ip = false;
        result.ptr_records = None;
        result.ns_records = NsRecords::Failed(failure);
        result.mx_records = vec![
            MxRecord { preference: MxPreference::Value(10), exchange: "mx.example.com".into() },
            MxRecord { preference: MxPreference::NotAvailable, exchange: "Error fetching MX record".into() },
        ];
        result.email_config = Some(EmailConfig {
            spf: AuthRecords::found(vec!["v=spf1 -all".into()]),
            dkim: AuthRecords::missing("No DKIM record found using common selectors."),
            dmarc: AuthRecords { policy: Some("reject".into()), ..AuthRecords::found(vec!["v=DMARC1; p=reject".into()]) },
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ptr_records"], json!([]));
        assert_eq!(
            value["ns_records"],
            json!([{ "name": "Error fetching NS record for example.invalid: The DNS query name does not exist.", "ips": [] }])
        );
        assert_eq!(value["mx_records"][0], json!({ "preference": 10, "exchange": "mx.example.com" }));
        assert_eq!(value["mx_records"][1]["preference"], json!("N/A"));
        assert_eq!(
            value["email_config"],
            json!({
                "spf": ["v=spf1 -all"],
                "dkim": ["No DKIM record found using common selectors."],
                "dmarc": ["v=DMARC1; p=reject"]
            })
        );
    }

    #[test]
    fn nameserver_without_address_gets_marker() {
        let records = NsRecords::Found(vec![NsRecord { name: "ns1.example.com".into(), ips: NsAddresses::NotFound }]);
        assert_eq!(serde_json::to_value(&records).unwrap(), json!([{ "name": "ns1.example.com", "ips": ["No IP found"] }]));
        assert!(!records.any_resolved());
    }

    #[test]
    fn certificate_fields_are_formatted() {
        let tls = TlsResult {
            status: TlsStatus::NotYetValid,
            common_name: Some("example.com".into()),
            issuer: Some("R11".into()),
            not_before: Some(Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap()),
            not_after: Some(Utc.with_ymd_and_hms(2026, 8, 1, 8, 30, 0).unwrap()),
            expires_in_days: Some(104),
            error: None,
        };
        let value = serde_json::to_value(&tls).unwrap();
        assert_eq!(value["status"], json!("Not Yet Valid"));
        assert_eq!(value["not_before"], json!("2026-05-01 08:30:00"));
        assert_eq!(value["expires_in_days"], json!(104));
        assert_eq!(value["error"], json!(null));
    }

    #[test]
    fn record_set_failure_renders_one_marker() {
        let failed = RecordSet::Failed(DnsFailure::new("TXT", "example.com", DnsFailureKind::TimedOut));
        assert_eq!(failed.values(), &[] as &[String]);
        assert_eq!(
            failed.display_values(),
            vec!["Error fetching TXT record for example.com: The DNS operation timed out."]
        );
        assert!(!failed.failure().unwrap().is_negative_answer());
    }

    #[test]
    fn port_status_wording() {
        assert_eq!(PortStatus::Filtered(None).to_string(), "Filtered (timed out)");
        assert_eq!(PortStatus::HostnameUnresolvable.to_string(), "Hostname could not be resolved");
        assert_eq!(
            Service::default_table(),
            vec![
                (Service::Smtp, 25),
                (Service::Smtps, 465),
                (Service::Submission, 587),
                (Service::Http, 80),
                (Service::Https, 443)
            ]
        );
    }
}
