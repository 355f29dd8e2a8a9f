//! Press-and-hold challenge.
//!
//! The hold has to last the full duration in one go. Letting go early
//! throws away the partial hold.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOLD_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldChallenge {
    required_ms: i64,
    #[serde(default)]
    pressed_since: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: bool,
}

impl Default for HoldChallenge {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_HOLD_SECS))
    }
}

impl HoldChallenge {
    pub fn new(required: Duration) -> Self {
        Self {
            required_ms: required.num_milliseconds().max(1),
            pressed_since: None,
            completed: false,
        }
    }

    pub fn required(&self) -> Duration {
        Duration::milliseconds(self.required_ms)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_since.is_some()
    }

    pub fn press(&mut self, now: DateTime<Utc>) {
        if self.completed || self.pressed_since.is_some() {
            return;
        }
        self.pressed_since = Some(now);
    }

    /// Let go. Returns whether the hold was long enough.
    pub fn release(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(since) = self.pressed_since.take() {
            if (now - since).num_milliseconds() >= self.required_ms {
                self.completed = true;
            }
        }
        self.completed
    }

    /// Fraction of the required hold reached so far, 0.0 ..= 1.0.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.completed {
            return 1.0;
        }
        match self.pressed_since {
            Some(since) => {
                let held = (now - since).num_milliseconds().max(0) as f64;
                (held / self.required_ms as f64).min(1.0)
            }
            None => 0.0,
        }
    }

    /// Latches once the full duration was reached while still pressed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if !self.completed && self.progress(now) >= 1.0 {
            self.completed = true;
            self.pressed_since = None;
        }
        self.completed
    }

    pub fn is_satisfied(&self) -> bool {
        self.completed
    }
}
