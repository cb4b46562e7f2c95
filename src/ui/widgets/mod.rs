// src/ui/widgets/mod.rs

pub mod analysis_view; // Findings list with knowledge-base details.
pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod log_view;
pub mod results; // Raw probe outcomes.
pub mod summary;
