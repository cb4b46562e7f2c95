// src/core/scanner/blacklist_scanner.rs

use tracing::{debug, info, warn};

use super::dns_scanner::{reversed_address_labels, DnsProbe};
use crate::core::models::{BlacklistResults, DnsFailureKind, Listing, RblEntry, RecordSet};
use futures::future::join_all;
use hickory_resolver::proto::rr::RecordType;
use std::net::IpAddr;

/// `d.c.b.a.<rbl>` for IPv4, reversed nibbles for IPv6.
pub fn rbl_query_name(ip: IpAddr, rbl: &str) -> String {
    format!("{}.{}", reversed_address_labels(ip), rbl)
}

/// Queries every configured RBL concurrently. Results keep the configured order.
///
/// # Arguments
/// * `dns` - A probe configured with the (short) RBL timeout.
/// * `ip` - The address to look up.
/// * `servers` - RBL zones, e.g. `zen.spamhaus.org`.
pub async fn run_blacklist_scan(dns: &DnsProbe, ip: IpAddr, servers: &[String]) -> BlacklistResults {
    info!(%ip, servers = servers.len(), "Starting blacklist scan.");
    let entries = join_all(servers.iter().map(|server| async move {
        let query = rbl_query_name(ip, server);
        debug!(%query, "Querying RBL.");
        entry_from_answer(server, dns.resolve_record(&query, RecordType::A).await)
    }))
    .await;

    let results = BlacklistResults(entries);
    info!(%ip, listed = results.listed_count(), "Blacklist scan finished.");
    results
}

/// NXDOMAIN means "not listed"; an answer means "listed" (the addresses encode the reason);
/// anything else is inconclusive.
pub fn entry_from_answer(server: &str, answer: RecordSet) -> RblEntry {
    let (listed, details) = match answer {
        RecordSet::Found(addresses) => {
            warn!(server, ?addresses, "Address is listed.");
            (Listing::Listed, addresses)
        }
        RecordSet::Failed(failure) if failure.kind == DnsFailureKind::NxDomain => (Listing::NotListed, Vec::new()),
        RecordSet::Failed(failure) => {
            debug!(server, error = %failure, "RBL query inconclusive.");
            (Listing::Error, vec![format!("Query timed out or error: {}", failure.kind)])
        }
    };
    RblEntry { server: server.to_string(), listed, details }
}
