// src/config.rs

//! Runtime settings, read once from the environment at startup.
//!
//! A `.env` file, when present, is merged into the environment first. Every value has a default, so an empty environment yields a working
//! configuration. Unparseable values are logged and replaced by the default.

use crate::core::models::Service;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_RBL_SERVERS: &str =
    "zen.spamhaus.org,bl.spamcop.net,cbl.abuseat.org,b.barracudacentral.org";
pub const DEFAULT_DKIM_SELECTORS: &str = "default,20200519,google,k1,selector1,mail,m1";

const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_RBL_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_TLS_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_RATE_LIMIT_COUNT: usize = 10;
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Everything the probes need that is not derived from the target itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub rbl_servers: Vec<String>,
    pub dkim_selectors: Vec<String>,
    pub dns_timeout: Duration,
    pub rbl_timeout: Duration,
    pub port_timeout: Duration,
    pub tls_timeout: Duration,
    pub ports: Vec<(Service, u16)>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rbl_servers: split_list(DEFAULT_RBL_SERVERS),
            dkim_selectors: split_list(DEFAULT_DKIM_SELECTORS),
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            rbl_timeout: DEFAULT_RBL_TIMEOUT,
            port_timeout: DEFAULT_PORT_TIMEOUT,
            tls_timeout: DEFAULT_TLS_TIMEOUT,
            ports: Service::default_table(),
        }
    }
}

/// Sliding-window limits for the evaluation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: DEFAULT_RATE_LIMIT_COUNT, window: DEFAULT_RATE_LIMIT_WINDOW }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub probes: ProbeConfig,
    pub rate_limit: RateLimitConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let list = |key: &str, default: Vec<String>| lookup(key).map(|raw| split_list(&raw)).unwrap_or(default);
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(parse_or_default(key, lookup(key), default.as_millis() as u64))
        };

        let probes = ProbeConfig {
            rbl_servers: list("RBL_SERVERS", defaults.probes.rbl_servers),
            dkim_selectors: list("COMMON_DKIM_SELECTORS", defaults.probes.dkim_selectors),
            dns_timeout: millis("MAILGUARD_DNS_TIMEOUT_MS", DEFAULT_DNS_TIMEOUT),
            rbl_timeout: millis("MAILGUARD_RBL_TIMEOUT_MS", DEFAULT_RBL_TIMEOUT),
            port_timeout: millis("MAILGUARD_PORT_TIMEOUT_MS", DEFAULT_PORT_TIMEOUT),
            tls_timeout: millis("MAILGUARD_TLS_TIMEOUT_MS", DEFAULT_TLS_TIMEOUT),
            ports: defaults.probes.ports,
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or_default("RATE_LIMIT_COUNT", lookup("RATE_LIMIT_COUNT"), DEFAULT_RATE_LIMIT_COUNT),
            window: Duration::from_secs(parse_or_default(
                "RATE_LIMIT_WINDOW",
                lookup("RATE_LIMIT_WINDOW"),
                DEFAULT_RATE_LIMIT_WINDOW.as_secs(),
            )),
        };

        Self { probes, rate_limit }
    }
}

/// Loads `.env` from the working directory, else from next to the executable.
///
/// Variables already set in the process environment win. Returns the file that was read,
/// `Ok(None)` when there is none.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => return Ok(Some(path)),
        Err(e) if !e.not_found() => return Err(e),
        Err(_) => {}
    }
    let Some(beside_exe) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
    else {
        return Ok(None);
    };
    load_dotenv_from(&beside_exe).map(|loaded| loaded.then_some(beside_exe))
}

/// Merges one env file into the process environment. `Ok(false)` when the file does not exist.
pub fn load_dotenv_from(path: &Path) -> Result<bool, dotenvy::Error> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path)?;
    Ok(true)
}

/// Splits a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %value, "Ignoring unparseable setting, using default.");
            default
        }),
    }
}
