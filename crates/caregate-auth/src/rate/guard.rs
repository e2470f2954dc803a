//! Per-token sliding-window rate guard.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use caregate_core::config::rate_limit::RateLimitConfig;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::RateLimitExceeded;

use super::RateToken;

/// Bounds how many requests each token may make per interval.
///
/// Every token owns a window of request instants. Windows live in a
/// `DashMap`, so checks for different tokens only contend when they land
/// on the same shard.
#[derive(Debug)]
pub struct RateGuard {
    /// Token → instants of admitted requests, oldest first.
    windows: DashMap<String, VecDeque<Instant>>,
    /// Window length.
    interval: Duration,
    /// Soft cap on tracked tokens.
    capacity: usize,
}

impl RateGuard {
    /// Creates a guard. Zero values are raised to the smallest usable value.
    pub fn new(interval: Duration, capacity: usize) -> Self {
        Self {
            windows: DashMap::new(),
            interval: interval.max(Duration::from_millis(1)),
            capacity: capacity.max(1),
        }
    }

    /// Creates a guard from the `rate_limit` configuration section.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            config.unique_token_capacity,
        )
    }

    /// The window length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admits the request if `token` made fewer than `limit` requests in the
    /// last interval. Rejected requests are not counted.
    pub fn check(&self, limit: NonZeroU32, token: &RateToken) -> Result<(), RateLimitExceeded> {
        let now = Instant::now();
        let key = token.as_str();

        if !self.windows.contains_key(key) && self.windows.len() >= self.capacity {
            self.make_room(now);
        }

        let mut window = self.windows.entry(key.to_owned()).or_default();
        prune(&mut window, now, self.interval);

        if window.len() >= limit.get() as usize {
            let oldest = window.front().copied().unwrap_or(now);
            let retry_after = (oldest + self.interval).saturating_duration_since(now);
            debug!(token = %token, limit = limit.get(), "Rate limit reached");
            return Err(RateLimitExceeded { retry_after });
        }

        window.push_back(now);
        Ok(())
    }

    /// Drops tokens whose window is empty. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Number of tokens currently tracked.
    pub fn tracked_tokens(&self) -> usize {
        self.windows.len()
    }

    /// Runs [`sweep`](Self::sweep) once per interval until shutdown.
    pub fn spawn_sweeper(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Rate guard sweeper shutting down");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            debug!(removed, remaining = self.tracked_tokens(), "Swept idle rate windows");
                        }
                    }
                }
            }
        })
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            prune(window, now, self.interval);
            !window.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Frees a slot for a new token: idle windows first, then the token
    /// whose latest request is the oldest.
    fn make_room(&self, now: Instant) {
        self.sweep_at(now);
        if self.windows.len() < self.capacity {
            return;
        }

        let victim = self
            .windows
            .iter()
            .filter_map(|entry| entry.value().back().map(|last| (*last, entry.key().clone())))
            .min_by_key(|(last, _)| *last)
            .map(|(_, key)| key);

        if let Some(key) = victim {
            warn!(capacity = self.capacity, "Rate guard at capacity, evicting least recently used token");
            self.windows.remove(&key);
        }
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, interval: Duration) {
    while let Some(front) = window.front() {
        if now.duration_since(*front) >= interval {
            window.pop_front();
        } else {
            break;
        }
    }
}
