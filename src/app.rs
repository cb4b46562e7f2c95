// src/app.rs

use color_eyre::eyre::Result;
use mailguard_rs::core::knowledge_base::{self, FindingCategory};
use mailguard_rs::core::models::{AuthStatus, EvaluationResult, Finding, Listing, Severity};
use mailguard_rs::logging;
use ratatui::widgets::{ListState, ScrollbarState};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// How many trailing log lines the log panel keeps.
const LOG_TAIL_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Disclaimer,
    Idle,
    Scanning,
    Finished,
}

/// Outcome of one check family in the summary panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Passed,
    Failed,
    /// No finding, but some lookup behind it did not answer.
    Inconclusive,
}

/// Derived figures for the summary panel.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    /// One line per check family that applies to the target.
    pub checks: Vec<(FindingCategory, CheckState)>,
}

impl ScanSummary {
    pub fn from_report(report: &EvaluationResult) -> Self {
        let details: Vec<_> = report
            .health_score
            .findings
            .iter()
            .filter_map(|f| knowledge_base::get_finding_detail(f.code))
            .collect();
        let count = |severity: Severity| details.iter().filter(|d| d.severity == severity).count();

        let families: &[FindingCategory] = if report.is_ip {
            &[FindingCategory::Blacklist, FindingCategory::ReverseDns, FindingCategory::Ports, FindingCategory::Tls]
        } else {
            &[FindingCategory::Email, FindingCategory::Ports, FindingCategory::Tls]
        };
        let checks = families
            .iter()
            .map(|family| {
                let state = if details.iter().any(|d| d.category == *family) {
                    CheckState::Failed
                } else if has_unanswered_lookups(report, *family) {
                    CheckState::Inconclusive
                } else {
                    CheckState::Passed
                };
                (*family, state)
            })
            .collect();

        Self {
            score: report.health_score.score,
            critical_issues: count(Severity::Critical),
            warning_issues: count(Severity::Warning),
            info_issues: count(Severity::Info),
            checks,
        }
    }
}

/// Whether a family's clean result rests on lookups that timed out or failed.
fn has_unanswered_lookups(report: &EvaluationResult, family: FindingCategory) -> bool {
    match family {
        FindingCategory::Email => report.email_config.as_ref().is_some_and(|email| {
            [&email.spf, &email.dkim, &email.dmarc].iter().any(|auth| auth.status == AuthStatus::LookupFailed)
        }),
        FindingCategory::Blacklist => report.blacklist_results.0.iter().any(|entry| entry.listed == Listing::Error),
        FindingCategory::ReverseDns => report
            .ptr_records
            .as_ref()
            .is_some_and(|ptr| !ptr.records.values().is_empty() && ptr.forward_confirmed.is_none()),
        _ => false,
    }
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub report: Option<EvaluationResult>,
    pub summary: ScanSummary,
    /// One-line message for the footer: validation errors, rate-limit refusals, export results.
    pub notice: Option<String>,
    pub analysis_list_state: ListState,
    pub spinner_frame: usize,
    /// Animated towards `summary.score` on each tick.
    pub displayed_score: u8,
    pub results_scroll: u16,
    pub show_logs: bool,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    pub scan_cancel: Option<CancellationToken>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            input: String::new(),
            report: None,
            summary: ScanSummary::default(),
            notice: None,
            analysis_list_state: ListState::default(),
            spinner_frame: 0,
            displayed_score: 0,
            results_scroll: 0,
            show_logs: false,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            scan_cancel: None,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        match &self.report {
            Some(report) => &report.health_score.findings,
            None => &[],
        }
    }

    pub fn start_scan(&mut self, cancel: CancellationToken) {
        self.state = AppState::Scanning;
        self.notice = None;
        self.scan_cancel = Some(cancel);
    }

    /// Stops the running evaluation; unfinished probes report as timed out.
    pub fn cancel_scan(&mut self) {
        if let Some(cancel) = self.scan_cancel.take() {
            cancel.cancel();
            self.notice = Some("Scan cancelled. Unfinished checks are reported as timed out.".to_string());
        }
    }

    pub fn finish_scan(&mut self, report: EvaluationResult) {
        self.summary = ScanSummary::from_report(&report);
        self.analysis_list_state = ListState::default();
        if !report.health_score.findings.is_empty() {
            self.analysis_list_state.select(Some(0));
        }
        self.report = Some(report);
        self.displayed_score = 0;
        self.results_scroll = 0;
        self.scan_cancel = None;
        self.state = AppState::Finished;
    }

    pub fn select_next(&mut self) {
        let len = self.findings().len();
        if len == 0 {
            return;
        }
        let next = self.analysis_list_state.selected().map_or(0, |i| (i + 1) % len);
        self.analysis_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let len = self.findings().len();
        if len == 0 {
            return;
        }
        let previous = self.analysis_list_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.analysis_list_state.select(Some(previous));
    }

    pub fn scroll_results_up(&mut self) {
        self.results_scroll = self.results_scroll.saturating_sub(1);
    }

    pub fn scroll_results_down(&mut self) {
        self.results_scroll = self.results_scroll.saturating_add(1);
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.refresh_logs();
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    fn refresh_logs(&mut self) {
        if let Ok(content) = std::fs::read_to_string(logging::log_file_path()) {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(LOG_TAIL_LINES);
            self.log_content = lines[start..].iter().map(|line| line.to_string()).collect();
        }
    }

    pub fn on_tick(&mut self) {
        match self.state {
            AppState::Scanning => self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len(),
            AppState::Finished if self.displayed_score < self.summary.score => {
                self.displayed_score = (self.displayed_score + 2).min(self.summary.score);
            }
            _ => {}
        }
        if self.show_logs {
            self.refresh_logs();
        }
    }

    /// Writes the current report as pretty JSON into the data directory.
    pub fn export_report(&self) -> Result<Option<PathBuf>> {
        let Some(report) = &self.report else {
            return Ok(None);
        };
        let directory = logging::get_data_dir();
        std::fs::create_dir_all(&directory)?;
        let file_name: String = report
            .query
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let path = directory.join(format!("report-{}.json", file_name));
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        Ok(Some(path))
    }

    pub fn quit(&mut self) {
        self.cancel_scan();
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.report = None;
        self.summary = ScanSummary::default();
        self.notice = None;
        self.analysis_list_state = ListState::default();
        self.displayed_score = 0;
        self.results_scroll = 0;
        self.scan_cancel = None;
    }
}
