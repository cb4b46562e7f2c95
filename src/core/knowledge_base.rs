//! This module is the catalog of every finding the health scorer can produce.
//! Each entry carries the score penalty together with human-readable explanations and
//! remediation steps, so scoring and presentation read from the same table.

use crate::core::models::Severity;
use std::fmt;

pub const RBL_LISTED: &str = "RBL_LISTED";
pub const EMAIL_SPF_MISSING: &str = "EMAIL_SPF_MISSING";
pub const EMAIL_DKIM_MISSING: &str = "EMAIL_DKIM_MISSING";
pub const EMAIL_DMARC_MISSING: &str = "EMAIL_DMARC_MISSING";
pub const EMAIL_DMARC_POLICY_NONE: &str = "EMAIL_DMARC_POLICY_NONE";
pub const PTR_MISSING: &str = "PTR_MISSING";
pub const PTR_MISMATCH: &str = "PTR_MISMATCH";
pub const PORTS_MAIL_CLOSED: &str = "PORTS_MAIL_CLOSED";
pub const PORTS_HTTPS_CLOSED: &str = "PORTS_HTTPS_CLOSED";
pub const TLS_EXPIRED: &str = "TLS_EXPIRED";
pub const TLS_CHECK_FAILED: &str = "TLS_CHECK_FAILED";
pub const TLS_EXPIRING_SOON: &str = "TLS_EXPIRING_SOON";

/// Defines the high-level categories for findings.
/// This is used to group related issues together in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    Blacklist,
    Email,
    ReverseDns,
    Ports,
    Tls,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Blacklist => write!(f, "Blacklists"),
            FindingCategory::Email => write!(f, "Email Authentication"),
            FindingCategory::ReverseDns => write!(f, "Reverse DNS"),
            FindingCategory::Ports => write!(f, "Service Ports"),
            FindingCategory::Tls => write!(f, "SSL/TLS Certificate"),
        }
    }
}

/// Everything known about one finding code.
pub struct FindingDetail {
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// Points deducted from the health score. `RBL_LISTED` is deducted once per listing.
    pub penalty: u8,
    pub description: &'static str,
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Blacklists ---
    FindingDetail {
        code: RBL_LISTED,
        title: "Listed on DNS Blacklists",
        category: FindingCategory::Blacklist,
        severity: Severity::Critical,
        penalty: 10,
        description: "The address appears on one or more DNS-based real-time blacklists. Receiving mail servers that consult these lists will reject or junk mail sent from it.",
        remediation: "Find and stop the source of abuse (open relay, compromised account, infected host), then request delisting through each blacklist's removal form."
    },

    // --- Email authentication ---
    FindingDetail {
        code: EMAIL_SPF_MISSING,
        title: "SPF Record Missing",
        category: FindingCategory::Email,
        severity: Severity::Warning,
        penalty: 15,
        description: "Sender Policy Framework (SPF) lists the servers allowed to send mail for the domain. Without it, receivers cannot tell legitimate mail from spoofed mail.",
        remediation: "Publish a TXT record on the domain such as 'v=spf1 include:_spf.example.com ~all' that names every legitimate sending service."
    },
    FindingDetail {
        code: EMAIL_DKIM_MISSING,
        title: "DKIM Record Missing",
        category: FindingCategory::Email,
        severity: Severity::Warning,
        penalty: 15,
        description: "No DKIM public key was found under the common selectors. DKIM signatures prove a message came from the domain and was not altered in transit.",
        remediation: "Enable DKIM signing at your mail provider and publish the public key as a TXT record at '<selector>._domainkey.<domain>'."
    },
    FindingDetail {
        code: EMAIL_DMARC_MISSING,
        title: "DMARC Record Missing",
        category: FindingCategory::Email,
        severity: Severity::Critical,
        penalty: 10,
        description: "DMARC tells receivers what to do with mail that fails SPF and DKIM and where to send reports. Without it the domain is easy to spoof.",
        remediation: "Publish a TXT record at '_dmarc.<domain>', starting with 'v=DMARC1; p=none; rua=mailto:...' and tightening the policy once reports look clean."
    },
    FindingDetail {
        code: EMAIL_DMARC_POLICY_NONE,
        title: "DMARC Policy is 'none'",
        category: FindingCategory::Email,
        severity: Severity::Warning,
        penalty: 5,
        description: "The DMARC policy only monitors. Failing mail is still delivered, so it offers no active protection against spoofing.",
        remediation: "Once legitimate mail passes SPF and DKIM, move the policy to 'p=quarantine' or 'p=reject'."
    },

    // --- Reverse DNS ---
    FindingDetail {
        code: PTR_MISSING,
        title: "Reverse DNS Missing",
        category: FindingCategory::ReverseDns,
        severity: Severity::Warning,
        penalty: 10,
        description: "The address has no usable PTR record. Many mail servers refuse connections from hosts without reverse DNS.",
        remediation: "Ask the owner of the address block (usually the hosting provider) to set a PTR record pointing at the mail server's hostname."
    },
    FindingDetail {
        code: PTR_MISMATCH,
        title: "Reverse DNS Not Confirmed",
        category: FindingCategory::ReverseDns,
        severity: Severity::Info,
        penalty: 5,
        description: "The PTR hostname does not resolve back to the same address. Receivers that perform forward-confirmed reverse DNS treat this as suspicious.",
        remediation: "Add an A/AAAA record for the PTR hostname that points back to this address."
    },

    // --- Ports ---
    FindingDetail {
        code: PORTS_MAIL_CLOSED,
        title: "Mail Ports Not Reachable",
        category: FindingCategory::Ports,
        severity: Severity::Warning,
        penalty: 5,
        description: "Neither SMTP (25) nor Submission (587) accepted a connection, so the host cannot receive or relay mail.",
        remediation: "If the host should handle mail, make sure the MTA is running and that firewalls allow ports 25 and 587."
    },
    FindingDetail {
        code: PORTS_HTTPS_CLOSED,
        title: "HTTPS Port Not Reachable",
        category: FindingCategory::Ports,
        severity: Severity::Info,
        penalty: 3,
        description: "Port 443 did not accept a connection, so the domain serves no secure web content.",
        remediation: "Serve the site over HTTPS and open port 443 in the firewall."
    },

    // --- SSL/TLS ---
    FindingDetail {
        code: TLS_EXPIRED,
        title: "SSL Certificate Expired",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        penalty: 10,
        description: "The certificate is past its expiry date. Browsers and mail clients will show errors or refuse to connect.",
        remediation: "Renew the certificate immediately and automate renewals (for example with an ACME client)."
    },
    FindingDetail {
        code: TLS_CHECK_FAILED,
        title: "TLS Handshake Failed",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        penalty: 5,
        description: "A secure connection to port 443 could not be established. Causes include an untrusted or mismatched certificate, a protocol mismatch, or a service that does not speak TLS.",
        remediation: "Install a trusted certificate covering the domain name and check the server's TLS configuration with an external tester."
    },
    FindingDetail {
        code: TLS_EXPIRING_SOON,
        title: "SSL Certificate Expiring Soon",
        category: FindingCategory::Tls,
        severity: Severity::Warning,
        penalty: 5,
        description: "The certificate expires in less than 30 days.",
        remediation: "Renew the certificate now, or confirm that automated renewal is working."
    },
];

/// Retrieves the full detail for a given finding code, or `None` for an unknown code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

/// The score penalty for `code`; unknown codes cost nothing.
pub fn penalty(code: &str) -> i32 {
    get_finding_detail(code).map_or(0, |detail| i32::from(detail.penalty))
}
