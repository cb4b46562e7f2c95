// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Defines the areas of the application's user interface.
///
/// Areas that are hidden in the current state are left as `Rect::default()`.
pub struct AppLayout {
    pub input: Rect,
    pub report: Rect,
    pub results: Rect,
    pub summary: Rect,
    pub footer: Rect,
    pub log_panel: Rect,
}

/// Creates the complete application layout.
///
/// The frame is split vertically into the input box, the content area and a one-line footer.
/// The content area holds the report and the summary side by side, plus the log panel when
/// `show_logs` is set. With `show_results` the report column is split again so the raw probe
/// results sit under the findings list.
pub fn create_layout(frame_size: Rect, show_logs: bool, show_results: bool) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame_size);

    let content_constraints = if show_logs {
        vec![Constraint::Percentage(45), Constraint::Percentage(20), Constraint::Percentage(35)]
    } else {
        vec![Constraint::Percentage(70), Constraint::Percentage(30)]
    };

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(content_constraints)
        .split(main_chunks[1]);

    let (report, results) = if show_results {
        let report_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(content_chunks[0]);
        (report_chunks[0], report_chunks[1])
    } else {
        (content_chunks[0], Rect::default())
    };

    AppLayout {
        input: main_chunks[0],
        report,
        results,
        summary: content_chunks[1],
        log_panel: if show_logs { content_chunks[2] } else { Rect::default() },
        footer: main_chunks[2],
    }
}
