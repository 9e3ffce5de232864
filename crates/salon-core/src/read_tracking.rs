use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use salon_types::ClientUpdate;

/// Fraction of the update's rendered area that must be on screen.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// How long the update must stay visible before it counts as read.
pub const READ_DEBOUNCE: Duration = Duration::from_secs(1);

/// Persisted read state, derived from `client_updates.client_read_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum ReadState {
    Unread,
    Read(DateTime<Utc>),
}

impl From<Option<DateTime<Utc>>> for ReadState {
    fn from(read_at: Option<DateTime<Utc>>) -> Self {
        match read_at {
            Some(at) => Self::Read(at),
            None => Self::Unread,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unobserved,
    Pending { since: Instant },
    Committed,
}

/// One-shot read latch for a single rendered update.
///
/// Feed it visibility reports with [`observe`](Self::observe) and call
/// [`poll`](Self::poll) on a timer. `poll` returns `true` at most once per
/// tracker, after the update stayed at least half visible for
/// [`READ_DEBOUNCE`]. The caller then issues the read mutation.
#[derive(Debug, Clone)]
pub struct ReadTracker {
    phase: Phase,
    debounce: Duration,
}

impl ReadTracker {
    pub fn new() -> Self {
        Self::with_debounce(READ_DEBOUNCE)
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            phase: Phase::Unobserved,
            debounce,
        }
    }

    /// Trackers for updates that are already read start latched.
    pub fn for_update(update: &ClientUpdate) -> Self {
        let mut tracker = Self::new();
        if update.is_read() {
            tracker.phase = Phase::Committed;
        }
        tracker
    }

    pub fn observe(&mut self, visible_ratio: f64, at: Instant) {
        let visible = visible_ratio >= VISIBILITY_THRESHOLD;
        self.phase = match (self.phase, visible) {
            (Phase::Unobserved, true) => Phase::Pending { since: at },
            (Phase::Pending { .. }, false) => Phase::Unobserved,
            (phase, _) => phase,
        };
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Pending { since } if now.saturating_duration_since(since) >= self.debounce => {
                self.phase = Phase::Committed;
                debug!("Update visible for {:?}, committing read", self.debounce);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    pub fn is_committed(&self) -> bool {
        self.phase == Phase::Committed
    }
}

impl Default for ReadTracker {
    fn default() -> Self {
        Self::new()
    }
}
