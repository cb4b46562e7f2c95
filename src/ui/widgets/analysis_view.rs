// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use mailguard_rs::core::knowledge_base::{self, FindingCategory};
use mailguard_rs::core::models::Severity;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn category_prefix(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::Blacklist => "[RBL] ",
        FindingCategory::Email => "[EMAIL] ",
        FindingCategory::ReverseDns => "[PTR] ",
        FindingCategory::Ports => "[PORTS] ",
        FindingCategory::Tls => "[SSL/TLS] ",
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Info => Style::default().fg(Color::Cyan),
    }
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Findings (Navigate with ↑ ↓)");

    if app.state != AppState::Finished {
        let content = match app.state {
            AppState::Scanning => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame];
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                    Span::raw("Running DNS, blacklist, port and certificate checks..."),
                ]))
                .alignment(Alignment::Center)
            }
            _ => Paragraph::new("Results will appear here...").alignment(Alignment::Center),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    // Each row shows the scorer's own message, tagged and colored from the knowledge base.
    let items: Vec<ListItem> = app
        .findings()
        .iter()
        .map(|finding| {
            let line = match knowledge_base::get_finding_detail(finding.code) {
                Some(detail) => Line::from(vec![
                    Span::styled(category_prefix(detail.category), Style::default().fg(Color::DarkGray)),
                    Span::styled(finding.message.clone(), severity_style(detail.severity)),
                ]),
                None => Line::from(finding.message.clone()),
            };
            ListItem::new(line)
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app
        .analysis_list_state
        .selected()
        .and_then(|index| app.findings().get(index))
        .and_then(|finding| knowledge_base::get_finding_detail(finding.code));

    match selected {
        Some(detail) => {
            let text = vec![
                Line::from(Span::styled(detail.title, severity_style(detail.severity).bold())),
                Line::from(""),
                Line::from("WHAT IT IS:".yellow().bold()),
                Line::from(detail.description),
                Line::from(""),
                Line::from("HOW TO FIX:".yellow().bold()),
                Line::from(detail.remediation),
                Line::from(""),
                Line::from(format!("Score impact: -{} points", detail.penalty)).dark_gray(),
            ];
            let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let placeholder_text = if app.findings().is_empty() {
        Text::from(vec![
            Line::from(""),
            Line::from("✓ HEALTHY CONFIGURATION".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("No issues were found during the checks."),
        ])
    } else {
        Text::from("Select an item above to see details.")
    };

    let p = Paragraph::new(placeholder_text).alignment(Alignment::Center).block(block);
    frame.render_widget(p, area);
}
