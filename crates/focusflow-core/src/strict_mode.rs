//! Strict Mode settings.
//!
//! Enabling is instant. Disabling is instant only inside the 15 minute
//! window right after enabling; after that it schedules a disable 24 hours
//! out, which can be cancelled while pending. A scheduled disable takes
//! effect on its own once its time passes: [`StrictModeSettings::is_active`]
//! already reports it as off, no event required.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Window after enabling during which disabling is instant.
pub const GRACE_WINDOW_MINUTES: i64 = 15;
/// Delay applied to a disable requested outside the grace window.
pub const DISABLE_DELAY_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Gentle,
    #[default]
    Neutral,
    Strict,
    Custom,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Gentle => "gentle",
            Tone::Neutral => "neutral",
            Tone::Strict => "strict",
            Tone::Custom => "custom",
        }
    }

    /// Built-in phrase for this tone. `Custom` falls back to the neutral one.
    pub fn default_phrase(self) -> &'static str {
        match self {
            Tone::Gentle => "I'm choosing to take a break from my focus",
            Tone::Neutral | Tone::Custom => "I am choosing distraction over my goals",
            Tone::Strict => "I am giving up on what I said mattered to me",
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gentle" => Ok(Tone::Gentle),
            "neutral" => Ok(Tone::Neutral),
            "strict" => Ok(Tone::Strict),
            "custom" => Ok(Tone::Custom),
            other => Err(ValidationError::UnknownVariant {
                kind: "tone",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChallengeType {
    #[default]
    Phrase,
    Math,
    Pattern,
    HoldButton,
}

impl ChallengeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Phrase => "phrase",
            ChallengeType::Math => "math",
            ChallengeType::Pattern => "pattern",
            ChallengeType::HoldButton => "holdButton",
        }
    }
}

impl std::str::FromStr for ChallengeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phrase" => Ok(ChallengeType::Phrase),
            "math" => Ok(ChallengeType::Math),
            "pattern" => Ok(ChallengeType::Pattern),
            "holdButton" | "hold" => Ok(ChallengeType::HoldButton),
            other => Err(ValidationError::UnknownVariant {
                kind: "challenge type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EnableOutcome {
    Enabled,
    /// Already on with nothing scheduled.
    AlreadyEnabled,
    /// Already on; the scheduled disable was dropped.
    DisableCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisableOutcome {
    /// Inside the grace window; strict mode is off now.
    DisabledNow,
    /// Outside the grace window; strict mode turns off at `at`.
    Scheduled { at: DateTime<Utc> },
    /// A disable was already scheduled; nothing changed.
    AlreadyPending { at: DateTime<Utc> },
    NotEnabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrictModeSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub challenge_type: ChallengeType,
    #[serde(default)]
    pub custom_phrase: Option<String>,
    #[serde(default)]
    pub enabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_disable: bool,
    #[serde(default)]
    pub disable_at: Option<DateTime<Utc>>,
}

impl StrictModeSettings {
    /// Effective state: enabled and not past a scheduled disable.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match (self.pending_disable, self.disable_at) {
            (true, Some(at)) => now < at,
            _ => true,
        }
    }

    /// Turn strict mode on. When it is already on, a scheduled disable is
    /// cancelled and the original enable time (and so the grace window) is
    /// left alone.
    pub fn enable(&mut self, now: DateTime<Utc>) -> EnableOutcome {
        if self.is_active(now) {
            return if self.cancel_pending_disable(now) {
                tracing::info!("scheduled disable cancelled by enable");
                EnableOutcome::DisableCancelled
            } else {
                EnableOutcome::AlreadyEnabled
            };
        }
        self.enabled = true;
        self.enabled_at = Some(now);
        self.pending_disable = false;
        self.disable_at = None;
        tracing::info!(%now, "strict mode enabled");
        EnableOutcome::Enabled
    }

    /// Time left in the instant-disable window, if still inside it.
    pub fn grace_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_active(now) {
            return None;
        }
        let ends = self.enabled_at? + Duration::minutes(GRACE_WINDOW_MINUTES);
        (now < ends).then(|| ends - now)
    }

    pub fn request_disable(&mut self, now: DateTime<Utc>) -> DisableOutcome {
        if !self.is_active(now) {
            self.settle(now);
            return DisableOutcome::NotEnabled;
        }
        if self.grace_remaining(now).is_some() {
            self.enabled = false;
            self.pending_disable = false;
            self.disable_at = None;
            tracing::info!("strict mode disabled inside grace window");
            return DisableOutcome::DisabledNow;
        }
        if let (true, Some(at)) = (self.pending_disable, self.disable_at) {
            return DisableOutcome::AlreadyPending { at };
        }
        let at = now + Duration::hours(DISABLE_DELAY_HOURS);
        self.pending_disable = true;
        self.disable_at = Some(at);
        tracing::info!(%at, "strict mode disable scheduled");
        DisableOutcome::Scheduled { at }
    }

    /// Cancel a scheduled disable. Returns false when nothing was pending
    /// or the disable already took effect.
    pub fn cancel_pending_disable(&mut self, now: DateTime<Utc>) -> bool {
        if !self.pending_disable || !self.is_active(now) {
            return false;
        }
        self.pending_disable = false;
        self.disable_at = None;
        true
    }

    /// Fold an elapsed scheduled disable into the stored flags.
    pub fn settle(&mut self, now: DateTime<Utc>) {
        if self.enabled && !self.is_active(now) {
            self.enabled = false;
            self.pending_disable = false;
            self.disable_at = None;
        }
    }

    /// Phrase the user must type for the phrase challenge.
    pub fn challenge_phrase(&self) -> String {
        match (self.tone, self.custom_phrase.as_deref().map(str::trim)) {
            (Tone::Custom, Some(p)) if !p.is_empty() => p.to_string(),
            (tone, _) => tone.default_phrase().to_string(),
        }
    }
}
