//! Per-client sliding-window rate limiting for evaluation requests.
//!
//! Each client keeps the instants of its recent accepted requests. A request is denied when
//! the window already holds `max_requests` entries; the caller is told how long until the
//! oldest one falls out. Denied requests are not recorded.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    /// The user-facing refusal, or `None` when allowed.
    pub fn message(&self) -> Option<String> {
        match self {
            RateDecision::Allowed => None,
            RateDecision::Denied { retry_after } => Some(format!(
                "Too many requests. Please try again in {} seconds.",
                retry_after.as_secs()
            )),
        }
    }
}

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock().await;
        let requests = clients.entry(client.to_string()).or_default();

        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.max_requests {
            let retry_after = requests
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            if !retry_after.is_zero() {
                warn!(client, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded.");
                return RateDecision::Denied { retry_after };
            }
        }

        requests.push_back(now);
        debug!(client, in_window = requests.len(), "Request admitted.");
        RateDecision::Allowed
    }

    /// Drops expired instants and forgets clients with nothing left in their window.
    pub async fn prune(&self) -> usize {
        self.prune_at(Instant::now()).await
    }

    async fn prune_at(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, requests| {
            requests.retain(|at| now.duration_since(*at) < self.window);
            !requests.is_empty()
        });
        before - clients.len()
    }

    /// Prunes on a fixed interval until `cancel` fires.
    pub fn spawn_pruner(self: &Arc<Self>, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Rate limiter pruner stopped.");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.prune().await;
                        if removed > 0 {
                            debug!(removed, "Pruned idle rate-limit clients.");
                        }
                    }
                }
            }
        })
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
