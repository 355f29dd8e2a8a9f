//! Session timer state machine.
//!
//! The timer is wall-clock based. Remaining time is always derived from the
//! session's absolute end time, never accumulated tick by tick, so a process
//! that was suspended for ten minutes sees the right value on its next read.
//! It owns no thread: the caller (see [`crate::driver`]) calls `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed          (planned time ran out)
//! Running | Paused -> Idle      (stop)
//! any -> Idle                   (reset)
//! ```
//!
//! Every command is a guarded no-op when called from the wrong state and
//! returns `None`. Taps racing against tick-driven completion therefore
//! need no synchronisation on the caller's side.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::Event;
use crate::services::NotificationService;
use crate::session::{Session, SessionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// Serializable form of a [`TimerService`], without its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub state: TimerState,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub remaining_ms: u64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub remaining_at_pause_ms: Option<u64>,
    #[serde(default)]
    pub pause_started_at: Option<DateTime<Utc>>,
    /// Total time spent paused in the current session.
    #[serde(default)]
    pub paused_ms: u64,
}

pub struct TimerService {
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationService>,
    state: TimerState,
    session: Option<Session>,
    remaining_ms: u64,
    progress: f64,
    remaining_at_pause_ms: Option<u64>,
    pause_started_at: Option<DateTime<Utc>>,
    paused_ms: u64,
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("remaining_ms", &self.remaining_ms)
            .field("paused_ms", &self.paused_ms)
            .finish_non_exhaustive()
    }
}

impl TimerService {
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn NotificationService>) -> Self {
        Self::restore(TimerRecord::default(), clock, notifier)
    }

    /// Rebuild a timer from a persisted record.
    ///
    /// A running timer picks up where the wall clock says it should be; the
    /// next `tick()` or `on_foreground()` completes it if it ran out meanwhile.
    pub fn restore(
        record: TimerRecord,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let mut timer = Self {
            clock,
            notifier,
            state: record.state,
            session: record.session,
            remaining_ms: record.remaining_ms,
            progress: record.progress,
            remaining_at_pause_ms: record.remaining_at_pause_ms,
            pause_started_at: record.pause_started_at,
            paused_ms: record.paused_ms,
        };
        if timer.session.is_none() && timer.state != TimerState::Idle {
            timer.clear();
        }
        if timer.state == TimerState::Running {
            timer.refresh(timer.clock.now());
        }
        timer
    }

    pub fn record(&self) -> TimerRecord {
        TimerRecord {
            state: self.state,
            session: self.session.clone(),
            remaining_ms: self.remaining_ms,
            progress: self.progress,
            remaining_at_pause_ms: self.remaining_at_pause_ms,
            pause_started_at: self.pause_started_at,
            paused_ms: self.paused_ms,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// 0.0 .. 1.0 progress through the planned duration.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Time spent paused so far in this session. Not stored on the session.
    pub fn paused_duration(&self) -> Duration {
        let mut ms = self.paused_ms as i64;
        if let (TimerState::Paused, Some(since)) = (self.state, self.pause_started_at) {
            ms += (self.clock.now() - since).num_milliseconds().max(0);
        }
        Duration::milliseconds(ms)
    }

    /// Effective end time. While paused this is where the session would end
    /// if resumed right now.
    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        let session = self.session.as_ref()?;
        match self.state {
            TimerState::Paused => {
                let remaining = self.remaining_at_pause_ms.unwrap_or(self.remaining_ms);
                Some(self.clock.now() + Duration::milliseconds(remaining as i64))
            }
            _ => Some(session.end_at()),
        }
    }

    /// Whether the periodic driver should be delivering ticks.
    pub fn is_ticking(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn snapshot(&self) -> Event {
        let session = self.session.as_ref();
        Event::StateSnapshot {
            state: self.state,
            kind: session.map(|s| s.kind),
            remaining_ms: self.remaining_ms,
            total_ms: session.map(|s| s.planned_secs.saturating_mul(1000)).unwrap_or(0),
            progress: self.progress,
            paused_ms: self.paused_duration().num_milliseconds().max(0) as u64,
            end_at: self.end_at(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(
        &mut self,
        duration_secs: u64,
        kind: SessionKind,
        strict_mode: bool,
    ) -> Option<Event> {
        if self.state != TimerState::Idle || duration_secs == 0 {
            return None;
        }
        let now = self.clock.now();
        let session = Session::new(now, duration_secs, kind, strict_mode);
        self.clear();
        self.remaining_ms = duration_secs.saturating_mul(1000);
        self.progress = 0.0;
        self.state = TimerState::Running;
        self.session = Some(session.clone());
        tracing::debug!(
            id = %session.id,
            duration_secs,
            kind = kind.as_str(),
            strict_mode,
            "timer started"
        );
        Some(Event::TimerStarted { session, at: now })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let now = self.clock.now();
        self.refresh(now);
        if self.remaining_ms == 0 {
            // The plan ran out before the tap landed.
            return self.complete();
        }
        self.remaining_at_pause_ms = Some(self.remaining_ms);
        self.pause_started_at = Some(now);
        self.state = TimerState::Paused;
        tracing::debug!(remaining_ms = self.remaining_ms, "timer paused");
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        if self.session.is_none() {
            return None;
        }
        let now = self.clock.now();
        if let Some(since) = self.pause_started_at.take() {
            let paused = (now - since).num_milliseconds().max(0) as u64;
            self.paused_ms = self.paused_ms.saturating_add(paused);
        }
        let remaining = self.remaining_at_pause_ms.take().unwrap_or(self.remaining_ms);
        let session = self.session.as_ref()?;
        let planned_ms = session.planned_secs.saturating_mul(1000);
        let elapsed_ms = planned_ms.saturating_sub(remaining);
        // Shift the start so the end moves forward by exactly the pause.
        let new_start = now - Duration::milliseconds(elapsed_ms as i64);
        let resumed = session.restarted_at(new_start);
        let end_at = resumed.end_at();
        self.session = Some(resumed);
        self.state = TimerState::Running;
        self.refresh(now);
        tracing::debug!(remaining_ms = self.remaining_ms, %end_at, "timer resumed");
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            end_at,
            at: now,
        })
    }

    /// Stop early. The returned session is `quit_early`; the caller fills in
    /// the actual duration when it records the quit.
    pub fn stop(&mut self) -> Option<Event> {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return None;
        }
        let now = self.clock.now();
        let session = self.session.as_ref()?.quit_early(now);
        self.clear();
        tracing::debug!(id = %session.id, "timer stopped early");
        Some(Event::TimerStopped { session, at: now })
    }

    /// Call periodically. Returns `Some(Event::SessionCompleted)` when the
    /// planned time has run out.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.refresh(self.clock.now());
        if self.remaining_ms == 0 {
            return self.complete();
        }
        None
    }

    /// The host is about to suspend us. Ask for an alert at the end time so
    /// the user hears about completion even if we never wake up in time.
    pub fn on_background(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if let Err(e) =
            self.notifier
                .schedule_completion_alert(session.end_at(), session.planned_secs, session.kind)
        {
            tracing::warn!(error = %e, "failed to schedule completion alert");
        }
    }

    /// Back in front. Completes retroactively if the session ended while we
    /// were suspended.
    pub fn on_foreground(&mut self) -> Option<Event> {
        if let Err(e) = self.notifier.cancel_pending() {
            tracing::warn!(error = %e, "failed to cancel pending alerts");
        }
        self.tick()
    }

    pub fn reset(&mut self) -> Event {
        self.clear();
        tracing::debug!("timer reset");
        Event::TimerReset {
            at: self.clock.now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_ref()?.completed();
        self.session = Some(session.clone());
        self.state = TimerState::Completed;
        self.remaining_ms = 0;
        self.progress = 1.0;
        tracing::info!(id = %session.id, kind = session.kind.as_str(), "session completed");
        Some(Event::SessionCompleted {
            session,
            at: self.clock.now(),
        })
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let remaining = (session.end_at() - now).num_milliseconds().max(0) as u64;
        let planned_ms = session.planned_secs.saturating_mul(1000);
        self.remaining_ms = remaining.min(planned_ms);
        self.progress = if planned_ms == 0 {
            0.0
        } else {
            ((planned_ms - self.remaining_ms) as f64 / planned_ms as f64).clamp(0.0, 1.0)
        };
    }

    fn clear(&mut self) {
        self.state = TimerState::Idle;
        self.session = None;
        self.remaining_ms = 0;
        self.progress = 0.0;
        self.remaining_at_pause_ms = None;
        self.pause_started_at = None;
        self.paused_ms = 0;
    }
}
