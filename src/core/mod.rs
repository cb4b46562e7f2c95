// src/core/mod.rs

// The `core` module holds everything that does not touch the terminal:
// input classification, the probes, scoring and the request gate.

/// Data structures shared by the probes, the scorer and the UI, such as
/// `EvaluationResult`, `RecordSet` and the tagged probe outcomes.
pub mod models;

/// Turns user input into a validated IP or domain target.
pub mod target;

/// The probe orchestrator and the individual DNS, blacklist, port and TLS probes.
pub mod scanner;

/// Catalog of every finding with its penalty, explanation and remediation.
pub mod knowledge_base;

/// Applies the scoring rules to a finished evaluation.
pub mod health;

pub mod rate_limit;
