use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quit_flow::QuitStage;
use crate::session::{Session, SessionKind};
use crate::strict_mode::ChallengeType;
use crate::timer::TimerState;

/// Every state change in the core produces an Event.
/// Front-ends render from these; nothing in the core observes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session: Session,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        end_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The timer was stopped early. The session carries `quit_early`.
    TimerStopped {
        session: Session,
        at: DateTime<Utc>,
    },
    /// Fired exactly once per session, when its planned time ran out.
    SessionCompleted {
        session: Session,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    QuitFlowStarted {
        challenge: ChallengeType,
        streak: u32,
        at: DateTime<Utc>,
    },
    QuitFlowAdvanced {
        stage: QuitStage,
        at: DateTime<Utc>,
    },
    /// The user backed out; the session keeps running untouched.
    QuitFlowAborted {
        stage: QuitStage,
        at: DateTime<Utc>,
    },
    /// The session ended through a confirmed quit (strict or not).
    SessionQuit {
        session: Session,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        kind: Option<SessionKind>,
        remaining_ms: u64,
        total_ms: u64,
        progress: f64,
        paused_ms: u64,
        end_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
