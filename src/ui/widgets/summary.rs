// src/ui/widgets/summary.rs

use crate::app::{App, AppState, CheckState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Renders the summary widget: overall score, a gauge, the state of each check
/// family and the issue counts by severity. Only drawn once an evaluation has finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating section
            Constraint::Length(1), // Gauge chart
            Constraint::Length(1), // Spacer
            Constraint::Length(5), // Checks section
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // Issues Found section
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Target section
        ])
        .split(area);

    if app.state != AppState::Finished {
        return;
    }

    // --- Score & Rating Section ---
    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Health Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    // --- Gauge Chart (Animated) ---
    let score_gauge = Gauge::default()
        .percent(u16::from(app.displayed_score))
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Checks Section ---
    let checks_lines: Vec<Line> = app
        .summary
        .checks
        .iter()
        .map(|(family, state)| {
            let (icon, style) = match state {
                CheckState::Passed => ("✓", Style::default().fg(Color::Green)),
                CheckState::Failed => ("✗", Style::default().fg(Color::Red)),
                CheckState::Inconclusive => ("?", Style::default().fg(Color::Yellow)),
            };
            Line::from(vec![Span::styled(format!("{} ", icon), style), Span::raw(family.to_string())])
        })
        .collect();
    let checks_block = Block::default().title("CHECKS".bold());
    frame.render_widget(Paragraph::new(checks_lines).block(checks_block), summary_chunks[3]);

    // --- Issue Details Section ---
    let issues_block = Block::default().title("ISSUES FOUND".bold());
    let details_text = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(app.summary.critical_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(app.summary.warning_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Info: "),
            Span::styled(app.summary.info_issues.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(details_text).block(issues_block), summary_chunks[5]);

    // --- Target Section ---
    if let Some(report) = &app.report {
        let kind = if report.is_ip { "IP address" } else { "Domain" };
        let target_lines = vec![
            Line::from(vec![Span::raw("Type: "), Span::styled(kind, Style::default().fg(Color::Cyan))]),
            Line::from(report.query.as_str()),
        ];
        let target_block = Block::default().title("TARGET".bold());
        frame.render_widget(Paragraph::new(target_lines).block(target_block), summary_chunks[7]);
    }
}
