//! # Pack-Open Rate Limiter
//!
//! A sliding-window guard in front of pack opening. Recorded opens are kept
//! as timestamps and pruned to `[window_start, window_start + window_ms)` on
//! every check. Once that range has fully elapsed, the window slides forward
//! to start at the next request. Up to `max_requests + burst_allowed` opens
//! fit in one window.
//!
//! The window is persisted as JSON under [`RATE_LIMIT_KEY`] next to the
//! collection, so restarts do not reset it.

use dadddeck_storage::{StorageBackend, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;

/// Storage key of the rate-limit window.
pub const RATE_LIMIT_KEY: &str = "dadddeck_rate_limit";

/// Rate limit settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window before burst.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_ms: i64,
    /// Extra requests tolerated on top of `max_requests`.
    pub burst_allowed: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
            burst_allowed: 2,
        }
    }
}

impl RateLimitConfig {
    /// Total requests allowed per window.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.max_requests.saturating_add(self.burst_allowed)
    }
}

/// The persisted window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Request times, epoch milliseconds.
    pub timestamps: Vec<i64>,
    /// Window start, epoch milliseconds.
    pub window_start: i64,
}

impl RateLimitWindow {
    fn count(&self) -> u32 {
        u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX)
    }
}

/// Snapshot of the limiter for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    /// Requests counted in the current window.
    pub count: u32,
    /// Requests left before blocking.
    pub remaining: u32,
    /// When the current window ends, epoch milliseconds.
    pub reset_at: i64,
    /// Whether the next request would be refused.
    pub is_blocked: bool,
}

/// A refused request.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct RateLimitExceeded {
    /// Human-readable explanation.
    pub message: String,
    /// Seconds until requests are accepted again (at least 1).
    pub retry_after_secs: u64,
    /// When the window resets, epoch milliseconds.
    pub reset_at: i64,
}

/// Rate limiter over a shared storage backend.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter.
    #[must_use]
    pub fn new(
        config: RateLimitConfig,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            backend,
            clock,
        }
    }

    /// The active settings.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn load_window(&self) -> RateLimitWindow {
        let raw = match self.backend.get(RATE_LIMIT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RateLimitWindow::default(),
            Err(error) => {
                warn!(%error, "cannot read rate limit window");
                return RateLimitWindow::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!(%error, "discarding unreadable rate limit window");
            RateLimitWindow::default()
        })
    }

    fn save_window(&self, window: &RateLimitWindow) -> StorageResult<()> {
        let raw = serde_json::to_string(window)?;
        self.backend.set(RATE_LIMIT_KEY, &raw)
    }

    fn is_expired(&self, window: &RateLimitWindow, now: i64) -> bool {
        now >= window.window_start.saturating_add(self.config.window_ms)
    }

    /// Resets an expired window or prunes timestamps outside the current one.
    fn refresh(&self, mut window: RateLimitWindow, now: i64) -> RateLimitWindow {
        if self.is_expired(&window, now) {
            return RateLimitWindow {
                timestamps: Vec::new(),
                window_start: now,
            };
        }
        let end = window.window_start.saturating_add(self.config.window_ms);
        let start = window.window_start;
        window.timestamps.retain(|&t| t >= start && t < end);
        window
    }

    fn status_of(&self, window: &RateLimitWindow) -> RateLimitStatus {
        let count = window.count();
        let limit = self.config.limit();
        RateLimitStatus {
            count,
            remaining: limit.saturating_sub(count),
            reset_at: window.window_start.saturating_add(self.config.window_ms),
            is_blocked: count >= limit,
        }
    }

    /// Loads, refreshes and persists the window, then reports on it.
    #[must_use]
    pub fn get_rate_limit_status(&self) -> RateLimitStatus {
        let now = self.clock.now_millis();
        let stored = self.load_window();
        let window = self.refresh(stored.clone(), now);
        if window != stored {
            if let Err(error) = self.save_window(&window) {
                warn!(%error, "cannot persist refreshed rate limit window");
            }
        }
        self.status_of(&window)
    }

    /// Whether another pack may be opened now.
    ///
    /// # Errors
    ///
    /// [`RateLimitExceeded`] when the window is full.
    pub fn check_rate_limit(&self) -> Result<RateLimitStatus, RateLimitExceeded> {
        let now = self.clock.now_millis();
        let stored = self.load_window();
        let stored_count = stored.count();
        let live = !self.is_expired(&stored, now);

        let status = self.get_rate_limit_status();
        let limit = self.config.limit();
        if status.is_blocked || (live && stored_count > limit) {
            let wait_ms = status.reset_at.saturating_sub(now).max(0);
            let retry_after_secs = u64::try_from((wait_ms + 999) / 1000).unwrap_or(1).max(1);
            debug!(count = status.count, limit, retry_after_secs, "pack open rate limited");
            return Err(RateLimitExceeded {
                message: format!(
                    "Too many packs opened: {limit} per {}s allowed. Try again in {retry_after_secs}s.",
                    self.config.window_ms / 1000
                ),
                retry_after_secs,
                reset_at: status.reset_at,
            });
        }
        Ok(status)
    }

    /// Records a pack open at the current time.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn record_pack_open(&self) -> StorageResult<()> {
        let now = self.clock.now_millis();
        let mut window = self.refresh(self.load_window(), now);
        window.timestamps.push(now);
        self.save_window(&window)
    }

    /// Forgets the persisted window.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn reset(&self) -> StorageResult<()> {
        self.backend.remove(RATE_LIMIT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use dadddeck_storage::MemoryStorage;

    const T0: i64 = 1_700_000_000_000;

    fn limiter(config: RateLimitConfig) -> (RateLimiter, ManualClock, Arc<MemoryStorage>) {
        let clock = ManualClock::at_millis(T0);
        let backend = Arc::new(MemoryStorage::new());
        let limiter = RateLimiter::new(config, backend.clone(), Arc::new(clock.clone()));
        (limiter, clock, backend)
    }

    #[test]
    fn test_fresh_status() {
        let (limiter, _, _) = limiter(RateLimitConfig::default());
        let status = limiter.get_rate_limit_status();
        assert_eq!(status.count, 0);
        assert_eq!(status.remaining, 12);
        assert_eq!(status.reset_at, T0 + 60_000);
        assert!(!status.is_blocked);
    }

    #[test]
    fn test_remaining_counts_down() {
        let (limiter, clock, _) = limiter(RateLimitConfig::default());
        for expected in (0..12).rev() {
            limiter.check_rate_limit().unwrap();
            limiter.record_pack_open().unwrap();
            clock.advance(Duration::milliseconds(100));
            assert_eq!(limiter.get_rate_limit_status().remaining, expected);
        }
        assert!(limiter.get_rate_limit_status().is_blocked);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let config = RateLimitConfig {
            max_requests: 1,
            window_ms: 10_000,
            burst_allowed: 0,
        };
        let (limiter, clock, _) = limiter(config);
        limiter.record_pack_open().unwrap();
        clock.advance(Duration::milliseconds(8_500));

        let rejection = limiter.check_rate_limit().unwrap_err();
        assert_eq!(rejection.retry_after_secs, 2);
        assert_eq!(rejection.reset_at, T0 + 10_000);
        assert!(rejection.message.contains("Try again in 2s"));

        clock.advance(Duration::milliseconds(1_499));
        assert_eq!(limiter.check_rate_limit().unwrap_err().retry_after_secs, 1);
    }

    #[test]
    fn test_stale_timestamps_pruned() {
        let (limiter, _, backend) = limiter(RateLimitConfig::default());
        let window = RateLimitWindow {
            timestamps: vec![T0 - 5_000, T0 - 1, T0, T0 + 10],
            window_start: T0,
        };
        backend
            .set(RATE_LIMIT_KEY, &serde_json::to_string(&window).unwrap())
            .unwrap();

        assert_eq!(limiter.get_rate_limit_status().count, 2);
        let stored: RateLimitWindow =
            serde_json::from_str(&backend.get(RATE_LIMIT_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.timestamps, vec![T0, T0 + 10]);
    }

    #[test]
    fn test_overfull_stored_window_rejected() {
        let config = RateLimitConfig {
            max_requests: 2,
            window_ms: 60_000,
            burst_allowed: 0,
        };
        let (limiter, _, backend) = limiter(config);
        // Four stored requests, only one inside the window after pruning.
        let window = RateLimitWindow {
            timestamps: vec![T0 - 3, T0 - 2, T0 - 1, T0],
            window_start: T0,
        };
        backend
            .set(RATE_LIMIT_KEY, &serde_json::to_string(&window).unwrap())
            .unwrap();

        assert!(limiter.check_rate_limit().is_err());
    }

    #[test]
    fn test_corrupt_window_treated_as_empty() {
        let (limiter, _, backend) = limiter(RateLimitConfig::default());
        backend.set(RATE_LIMIT_KEY, "]]]").unwrap();
        assert_eq!(limiter.get_rate_limit_status().count, 0);
        assert!(limiter.check_rate_limit().is_ok());
    }

    #[test]
    fn test_reset_forgets_window() {
        let (limiter, _, backend) = limiter(RateLimitConfig::default());
        limiter.record_pack_open().unwrap();
        limiter.reset().unwrap();
        assert!(backend.get(RATE_LIMIT_KEY).unwrap().is_none());
    }
}
