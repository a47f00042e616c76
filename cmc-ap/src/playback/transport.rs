//! Transport clock
//!
//! Maps schedule time (seconds at the tempo the run started with) to
//! wall-clock instants. A tempo change only alters the clock rate:
//!
//! ```text
//! position(now) = anchor_position + (now - anchor_instant) × rate
//! rate          = current_bpm / run_bpm
//! ```
//!
//! Changing the rate re-anchors at the current position, so notes already
//! behind the playhead stay put and the remaining ones stretch or shrink.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TransportClock {
    anchor_instant: Instant,
    anchor_position: f64,
    rate: f64,
}

impl TransportClock {
    /// Clock at position 0, running at normal speed from `now`
    pub fn start(now: Instant) -> Self {
        Self {
            anchor_instant: now,
            anchor_position: 0.0,
            rate: 1.0,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Schedule position (seconds) at `now`
    pub fn position_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.anchor_instant);
        self.anchor_position + elapsed.as_secs_f64() * self.rate
    }

    /// Change speed from `now` on
    ///
    /// Non-positive or non-finite rates are ignored.
    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        if !(rate.is_finite() && rate > 0.0) {
            return;
        }
        self.anchor_position = self.position_at(now);
        self.anchor_instant = now;
        self.rate = rate;
    }

    /// Wall-clock instant at which the clock reaches `position`
    ///
    /// Positions already passed map to the anchor instant (fire immediately).
    pub fn instant_for(&self, position: f64) -> Instant {
        let ahead = position - self.anchor_position;
        if ahead <= 0.0 {
            return self.anchor_instant;
        }
        self.anchor_instant + Duration::from_secs_f64(ahead / self.rate)
    }
}
