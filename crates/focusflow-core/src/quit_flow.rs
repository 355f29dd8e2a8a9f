//! Strict Mode quit flow.
//!
//! Friction between "I want to quit" and the session actually stopping:
//!
//! ```text
//! Delay (10 s) -> Challenge -> StreakWarning -> confirmed
//!    | cancel        | go back     | keep going
//!    v               v             v
//!  aborted         aborted       aborted
//! ```
//!
//! The flow never touches the timer. The session keeps running (and keeps
//! counting down) the whole time; only a confirmed quit has any effect, and
//! that effect is applied by the owner of the flow.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;
use crate::strict_mode::{ChallengeType, StrictModeSettings, Tone};

pub const DELAY_SECS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuitStage {
    Delay,
    Challenge,
    StreakWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "stage", rename_all = "snake_case")]
pub enum QuitStep {
    Advanced(QuitStage),
    Aborted(QuitStage),
    Confirmed,
}

/// Copy for the last stage, built from the streak captured at flow start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakWarning {
    pub streak: u32,
    pub tone: Tone,
}

impl StreakWarning {
    /// With no streak there is nothing to lose, so the copy is low stakes.
    pub fn has_streak(&self) -> bool {
        self.streak > 0
    }

    pub fn headline(&self) -> String {
        if !self.has_streak() {
            return match self.tone {
                Tone::Gentle => "That's okay".to_string(),
                Tone::Strict => "Quitting already?".to_string(),
                Tone::Neutral | Tone::Custom => "End this session?".to_string(),
            };
        }
        let days = format!("{}-day", self.streak);
        match self.tone {
            Tone::Gentle => format!("You're on a {days} streak"),
            Tone::Strict => format!("You will lose your {days} streak"),
            Tone::Neutral | Tone::Custom => format!("Your {days} streak will reset"),
        }
    }

    pub fn body(&self) -> &'static str {
        match (self.has_streak(), self.tone) {
            (false, Tone::Gentle) => {
                "Every session is practice. You can start again whenever you're ready."
            }
            (false, Tone::Strict) => {
                "You haven't built a streak yet, and quitting won't help you start one."
            }
            (false, _) => "This session will be recorded as quit early.",
            (true, Tone::Gentle) => {
                "It would be a shame to let it go. A few more minutes might be all you need."
            }
            (true, Tone::Strict) => {
                "Every day of work behind that number goes back to zero. Is this worth it?"
            }
            (true, _) => "Quitting now sets your current streak back to zero.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuitFlow {
    stage: QuitStage,
    started_at: DateTime<Utc>,
    delay_until: DateTime<Utc>,
    challenge: Challenge,
    tone: Tone,
    streak: u32,
    #[serde(default)]
    finished: bool,
}

impl QuitFlow {
    /// Start a flow. The challenge type, tone and streak are captured now and
    /// do not follow later changes.
    pub fn begin<R: Rng + ?Sized>(
        settings: &StrictModeSettings,
        streak: u32,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        let challenge =
            Challenge::generate(settings.challenge_type, &settings.challenge_phrase(), rng);
        Self {
            stage: QuitStage::Delay,
            started_at: now,
            delay_until: now + Duration::seconds(DELAY_SECS),
            challenge,
            tone: settings.tone,
            streak,
            finished: false,
        }
    }

    pub fn stage(&self) -> QuitStage {
        self.stage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn challenge_type(&self) -> ChallengeType {
        self.challenge.kind()
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// Mutable access for user input, only while the challenge is on screen.
    pub fn challenge_mut(&mut self) -> Option<&mut Challenge> {
        (self.is_at(QuitStage::Challenge)).then_some(&mut self.challenge)
    }

    pub fn delay_remaining(&self, now: DateTime<Utc>) -> Duration {
        if !self.is_at(QuitStage::Delay) {
            return Duration::zero();
        }
        (self.delay_until - now).max(Duration::zero())
    }

    /// The text the user typed to get through, when the phrase challenge
    /// was used and passed.
    pub fn phrase_used(&self) -> Option<&str> {
        self.challenge
            .as_phrase()
            .filter(|p| p.is_satisfied())
            .map(|p| p.typed().trim())
    }

    pub fn streak_warning(&self) -> Option<StreakWarning> {
        self.is_at(QuitStage::StreakWarning).then(|| StreakWarning {
            streak: self.streak,
            tone: self.tone,
        })
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Time-driven progress: ends the delay once it expires.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<QuitStep> {
        if self.is_at(QuitStage::Challenge) {
            self.challenge.poll(now);
            return None;
        }
        if self.is_at(QuitStage::Delay) && now >= self.delay_until {
            self.stage = QuitStage::Challenge;
            tracing::debug!("quit delay elapsed");
            return Some(QuitStep::Advanced(QuitStage::Challenge));
        }
        None
    }

    /// Cancel during the delay.
    pub fn cancel(&mut self) -> Option<QuitStep> {
        self.abort_from(QuitStage::Delay)
    }

    /// Back out of the challenge.
    pub fn go_back(&mut self) -> Option<QuitStep> {
        self.abort_from(QuitStage::Challenge)
    }

    /// Continue past a satisfied challenge.
    pub fn continue_past_challenge(&mut self, now: DateTime<Utc>) -> Option<QuitStep> {
        if !self.is_at(QuitStage::Challenge) {
            return None;
        }
        self.challenge.poll(now);
        if !self.challenge.is_satisfied() {
            return None;
        }
        self.stage = QuitStage::StreakWarning;
        Some(QuitStep::Advanced(QuitStage::StreakWarning))
    }

    /// Decide not to quit at the warning.
    pub fn keep_going(&mut self) -> Option<QuitStep> {
        self.abort_from(QuitStage::StreakWarning)
    }

    pub fn confirm_quit(&mut self) -> Option<QuitStep> {
        if !self.is_at(QuitStage::StreakWarning) {
            return None;
        }
        self.finished = true;
        tracing::info!(streak = self.streak, "quit confirmed");
        Some(QuitStep::Confirmed)
    }

    fn abort_from(&mut self, stage: QuitStage) -> Option<QuitStep> {
        if !self.is_at(stage) {
            return None;
        }
        self.finished = true;
        tracing::info!(?stage, "quit flow aborted");
        Some(QuitStep::Aborted(stage))
    }

    fn is_at(&self, stage: QuitStage) -> bool {
        !self.finished && self.stage == stage
    }
}
