// src/ui/widgets/results.rs

use crate::app::App;
use mailguard_rs::core::models::{
    AuthRecords, AuthStatus, EvaluationResult, Listing, MxPreference, NsAddresses, NsRecords, PortStatus,
    RecordSet, TlsStatus,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the raw probe outcomes of the finished evaluation.
pub fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let results_block = Block::default().borders(Borders::ALL).title("Probe Results (PgUp/PgDn)");
    if let Some(report) = &app.report {
        let results_paragraph = Paragraph::new(build_results_text(report))
            .block(results_block)
            .wrap(Wrap { trim: false })
            .scroll((app.results_scroll, 0));
        frame.render_widget(results_paragraph, area);
    }
}

fn heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), Style::default().bold().underlined()))
}

fn ok_style() -> Style {
    Style::default().fg(Color::Green)
}

fn bad_style() -> Style {
    Style::default().fg(Color::Red)
}

fn muted_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn status_line(label: &str, status: String, style: Style) -> Line<'static> {
    Line::from(vec![Span::raw(format!("  {}: ", label)), Span::styled(status, style)])
}

fn detail_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("    {}", text), muted_style()))
}

/// Transforms an evaluation into styled lines, one section per probe family that ran.
pub fn build_results_text(report: &EvaluationResult) -> Text<'static> {
    let mut lines = vec![Line::from(report.message.clone()), Line::from("")];

    // --- Ports ---
    lines.push(heading("Ports"));
    for (service, status) in &report.port_scan_results.0 {
        let style = match status {
            PortStatus::Open => ok_style(),
            PortStatus::Closed => bad_style(),
            _ => Style::default().fg(Color::Yellow),
        };
        lines.push(status_line(&service.to_string(), status.to_string(), style));
    }
    lines.push(Line::from(""));

    // --- SSL/TLS ---
    lines.push(heading("SSL/TLS Certificate"));
    let tls = &report.ssl_cert_results;
    let tls_style = match tls.status {
        TlsStatus::Valid => ok_style(),
        TlsStatus::Skipped => muted_style(),
        _ => bad_style(),
    };
    lines.push(status_line("Status", format!("{:?}", tls.status), tls_style));
    if let Some(common_name) = &tls.common_name {
        lines.push(detail_line(&format!("Common name: {}", common_name)));
    }
    if let Some(issuer) = &tls.issuer {
        lines.push(detail_line(&format!("Issuer: {}", issuer)));
    }
    if let Some(not_after) = &tls.not_after {
        lines.push(detail_line(&format!("Valid until: {}", not_after.format("%Y-%m-%d %H:%M:%S"))));
    }
    if let Some(days) = tls.expires_in_days {
        lines.push(detail_line(&format!("Expires in: {} days", days)));
    }
    if let Some(error) = &tls.error {
        lines.push(detail_line(error));
    }
    lines.push(Line::from(""));

    if report.is_ip {
        // --- Blacklists ---
        lines.push(heading("Blacklists"));
        for entry in &report.blacklist_results.0 {
            let (status, style) = match entry.listed {
                Listing::Listed => ("LISTED", bad_style()),
                Listing::NotListed => ("Not listed", ok_style()),
                Listing::Error => ("Inconclusive", Style::default().fg(Color::Yellow)),
            };
            lines.push(status_line(&entry.server, status.to_string(), style));
            for detail in &entry.details {
                lines.push(detail_line(detail));
            }
        }
        lines.push(Line::from(""));

        // --- Reverse DNS ---
        lines.push(heading("Reverse DNS"));
        if let Some(ptr) = &report.ptr_records {
            match &ptr.records {
                RecordSet::Found(names) => {
                    for name in names {
                        lines.push(status_line("PTR", name.clone(), ok_style()));
                    }
                    match ptr.forward_confirmed {
                        Some(true) => lines.push(detail_line("Forward lookup confirms the address.")),
                        Some(false) => lines.push(detail_line("Forward lookup does not return the address.")),
                        None => {}
                    }
                }
                RecordSet::Failed(failure) => lines.push(status_line("PTR", failure.to_string(), bad_style())),
            }
        }
    } else {
        // --- Email authentication ---
        lines.push(heading("Email Authentication"));
        if let Some(email) = &report.email_config {
            push_auth(&mut lines, "SPF", &email.spf);
            push_auth(&mut lines, "DKIM", &email.dkim);
            push_auth(&mut lines, "DMARC", &email.dmarc);
            if let Some(policy) = &email.dmarc.policy {
                lines.push(detail_line(&format!("Policy: p={}", policy)));
            }
        }
        lines.push(Line::from(""));

        // --- MX ---
        lines.push(heading("MX Records"));
        for mx in &report.mx_records {
            let preference = match mx.preference {
                MxPreference::Value(value) => value.to_string(),
                MxPreference::ParseError => "Parse Error".to_string(),
                MxPreference::NotAvailable => "N/A".to_string(),
            };
            lines.push(Line::from(format!("  {:>5}  {}", preference, mx.exchange)));
        }
        lines.push(Line::from(""));

        // --- NS ---
        lines.push(heading("Nameservers"));
        match &report.ns_records {
            NsRecords::Found(records) => {
                for record in records {
                    let ips = match &record.ips {
                        NsAddresses::Resolved(ips) => ips.join(", "),
                        NsAddresses::NotFound => "No IP found".to_string(),
                    };
                    lines.push(Line::from(format!("  {} ({})", record.name, ips)));
                }
            }
            NsRecords::Failed(failure) => lines.push(Line::from(Span::styled(format!("  {}", failure), bad_style()))),
        }
        lines.push(Line::from(""));

        // --- Other records ---
        if let Some(all) = &report.all_dns_records {
            lines.push(heading("DNS Records"));
            for (label, records) in [
                ("A", &all.a),
                ("AAAA", &all.aaaa),
                ("CNAME", &all.cname),
                ("TXT", &all.txt),
                ("NS", &all.ns),
                ("SOA", &all.soa),
            ] {
                match records {
                    RecordSet::Found(values) => {
                        for value in values {
                            lines.push(Line::from(format!("  {:<6}{}", label, value)));
                        }
                    }
                    RecordSet::Failed(failure) => {
                        lines.push(Line::from(Span::styled(format!("  {:<6}{}", label, failure.kind), muted_style())));
                    }
                }
            }
        }
    }

    Text::from(lines)
}

fn push_auth(lines: &mut Vec<Line<'static>>, label: &str, records: &AuthRecords) {
    let (status, style) = match records.status {
        AuthStatus::Found => ("Found", ok_style()),
        AuthStatus::Missing => ("Not Found", bad_style()),
        AuthStatus::LookupFailed => ("Lookup failed", Style::default().fg(Color::Yellow)),
    };
    lines.push(status_line(label, status.to_string(), style));
    for entry in &records.entries {
        lines.push(detail_line(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailguard_rs::core::models::{
        BlacklistResults, DnsFailure, DnsFailureKind, HealthScore, PortScanResults, PtrRecords, RblEntry,
        Service, TlsResult,
    };

    fn plain(text: &Text) -> Vec<String> {
        text.lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn ip_report_lists_blacklists_and_ptr() {
        let report = EvaluationResult {
            query: "192.0.2.1".into(),
            is_ip: true,
            blacklist_results: BlacklistResults(vec![RblEntry {
                server: "zen.spamhaus.org".into(),
                listed: Listing::Listed,
                details: vec!["127.0.0.2".into()],
            }]),
            mx_records: Vec::new(),
            ns_records: NsRecords::default(),
            all_dns_records: None,
            email_config: None,
            ptr_records: Some(PtrRecords {
                records: RecordSet::Failed(DnsFailure::new("PTR", "192.0.2.1", DnsFailureKind::NxDomain)),
                forward_confirmed: None,
            }),
            port_scan_results: PortScanResults(vec![(Service::Smtp, PortStatus::Closed)]),
            ssl_cert_results: TlsResult::skipped("HTTPS port not open or not applicable."),
            health_score: HealthScore::default(),
            message: "msg".into(),
        };
        let lines = plain(&build_results_text(&report));
        assert!(lines.contains(&"  SMTP: Closed".to_string()));
        assert!(lines.contains(&"  zen.spamhaus.org: LISTED".to_string()));
        assert!(lines.contains(&"    127.0.0.2".to_string()));
        assert!(lines.iter().any(|line| line.starts_with("  PTR: Error fetching PTR record for 192.0.2.1")));
        assert!(!lines.iter().any(|line| line == "Email Authentication"));
    }
}
