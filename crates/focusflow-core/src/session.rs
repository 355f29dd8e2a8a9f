//! Focus and rest session values.
//!
//! A [`Session`] is never mutated in place by the timer. Every transition
//! (resume, stop, complete) derives a new value from the previous one, so a
//! reader holding an older copy never observes a half-applied change.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Work,
    Rest,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::Rest => "rest",
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(SessionKind::Work),
            "rest" => Ok(SessionKind::Rest),
            other => Err(ValidationError::UnknownVariant {
                kind: "session kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    InProgress,
    Completed,
    QuitEarly,
    /// Reserved for sessions cut short by the host (not produced by the timer).
    Interrupted,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::Completed => "completed",
            CompletionStatus::QuitEarly => "quit_early",
            CompletionStatus::Interrupted => "interrupted",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, CompletionStatus::InProgress)
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(CompletionStatus::InProgress),
            "completed" => Ok(CompletionStatus::Completed),
            "quit_early" => Ok(CompletionStatus::QuitEarly),
            "interrupted" => Ok(CompletionStatus::Interrupted),
            other => Err(ValidationError::UnknownVariant {
                kind: "completion status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Planned length in seconds, always > 0.
    pub planned_secs: u64,
    /// Set exactly once, at the terminal transition.
    #[serde(default)]
    pub actual_secs: Option<u64>,
    pub kind: SessionKind,
    pub status: CompletionStatus,
    /// Fixed when the session starts.
    pub strict_mode: bool,
    /// Present iff `status == QuitEarly`.
    #[serde(default)]
    pub quit_at: Option<DateTime<Utc>>,
    /// Only for quits that went through the phrase challenge.
    #[serde(default)]
    pub challenge_phrase: Option<String>,
}

impl Session {
    pub fn new(
        started_at: DateTime<Utc>,
        planned_secs: u64,
        kind: SessionKind,
        strict_mode: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            planned_secs,
            actual_secs: None,
            kind,
            status: CompletionStatus::InProgress,
            strict_mode,
            quit_at: None,
            challenge_phrase: None,
        }
    }

    pub fn planned(&self) -> Duration {
        Duration::seconds(self.planned_secs as i64)
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.started_at + self.planned()
    }

    /// Same session with its effective start moved (used on resume).
    pub fn restarted_at(&self, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ..self.clone()
        }
    }

    /// Terminal copy for an early quit.
    pub fn quit_early(&self, at: DateTime<Utc>) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self {
            status: CompletionStatus::QuitEarly,
            quit_at: Some(at),
            ..self.clone()
        }
    }

    /// Terminal copy for a natural completion. The full plan elapsed, so
    /// the actual duration is the planned one.
    pub fn completed(&self) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        Self {
            status: CompletionStatus::Completed,
            actual_secs: Some(self.planned_secs),
            ..self.clone()
        }
    }

    /// Copy with `actual_secs` filled in, unless it was already set.
    pub fn with_actual_secs(&self, secs: u64) -> Self {
        if self.actual_secs.is_some() {
            return self.clone();
        }
        Self {
            actual_secs: Some(secs),
            ..self.clone()
        }
    }

    pub fn with_challenge_phrase(&self, phrase: impl Into<String>) -> Self {
        Self {
            challenge_phrase: Some(phrase.into()),
            ..self.clone()
        }
    }
}
