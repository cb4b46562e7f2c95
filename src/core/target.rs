// src/core/target.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Minimal hostname shape: at least one dot, no whitespace, no path separators.
static RE_HOST_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s/]+\.[^\s/]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter an IP address or a domain.")]
    Empty,
    #[error("'{0}' is not a valid IP address or domain.")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Ip(IpAddr),
    Domain,
}

/// Decides whether `input` is an IP address or a domain. Nothing else is checked here.
pub fn classify(input: &str) -> TargetKind {
    match input.trim().parse::<IpAddr>() {
        Ok(ip) => TargetKind::Ip(ip),
        Err(_) => TargetKind::Domain,
    }
}

/// A validated evaluation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    raw: String,
    kind: TargetKind,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InputError::Empty);
        }
        let kind = classify(trimmed);
        if kind == TargetKind::Domain && !RE_HOST_SHAPE.is_match(trimmed) {
            return Err(InputError::Malformed(trimmed.to_string()));
        }
        Ok(Self { raw: trimmed.to_string(), kind })
    }

    /// Accepts a bare host or a URL (`https://example.com/path`) and parses its host.
    pub fn from_user_input(input: &str) -> Result<Self, InputError> {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Some(host) = Url::parse(trimmed).ok().and_then(|url| url.host_str().map(String::from)) {
                return Self::parse(host.trim_start_matches('[').trim_end_matches(']'));
            }
        }
        Self::parse(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self.kind {
            TargetKind::Ip(ip) => Some(ip),
            TargetKind::Domain => None,
        }
    }

    pub fn is_ip(&self) -> bool {
        self.ip().is_some()
    }
}
