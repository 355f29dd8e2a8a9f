//! Streak ledger.
//!
//! A streak counts consecutive calendar days with at least one completed
//! session. Quitting a session early wipes the current streak on the spot;
//! the longest streak is a high-water mark and never goes down.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakLedger {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: u64,
    pub total_quit: u64,
    #[serde(default)]
    pub last_completion: Option<NaiveDate>,
}

impl StreakLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(&mut self, day: NaiveDate) {
        self.current_streak = match self.last_completion {
            None => 1,
            Some(last) => match (day - last).num_days() {
                1 => self.current_streak + 1,
                // Same day, or a clock that went backwards.
                d if d <= 0 => self.current_streak.max(1),
                _ => 1,
            },
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_completed += 1;
        if self.last_completion.map_or(true, |last| day > last) {
            self.last_completion = Some(day);
        }
    }

    pub fn record_quit(&mut self) {
        self.current_streak = 0;
        self.total_quit += 1;
    }

    /// Streak as it should be displayed on `today`. A streak whose last
    /// completion is older than yesterday is already broken.
    pub fn current_streak_on(&self, today: NaiveDate) -> u32 {
        match self.last_completion {
            Some(last) if (today - last).num_days() <= 1 => self.current_streak,
            _ => 0,
        }
    }
}
