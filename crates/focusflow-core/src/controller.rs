//! Session controller.
//!
//! Owns the [`TimerService`], the quit flow while one is running, the streak
//! ledger and the collaborators. Front-ends talk to this type only.
//!
//! Two ways out of a session:
//! - the timer runs out: the completion is recorded in the ledger;
//! - the user quits: immediately for non-strict sessions, otherwise only
//!   after the whole [`QuitFlow`] is confirmed. The quit is recorded.

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::ledger::StreakLedger;
use crate::quit_flow::{QuitFlow, QuitStage, QuitStep};
use crate::services::{BlockingService, NotificationService, SessionStore};
use crate::session::{Session, SessionKind};
use crate::strict_mode::StrictModeSettings;
use crate::timer::{TimerRecord, TimerService, TimerState};

/// Everything the controller talks to but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub blocker: Arc<dyn BlockingService>,
    pub notifier: Arc<dyn NotificationService>,
    pub store: Arc<dyn SessionStore>,
}

/// Serializable controller state, for hosts that do not stay resident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerRecord {
    #[serde(default)]
    pub timer: TimerRecord,
    #[serde(default)]
    pub ledger: StreakLedger,
}

pub struct FocusController {
    clock: Arc<dyn Clock>,
    blocker: Arc<dyn BlockingService>,
    store: Arc<dyn SessionStore>,
    timer: TimerService,
    quit_flow: Option<QuitFlow>,
    ledger: StreakLedger,
    settings: StrictModeSettings,
    rng: Mcg128Xsl64,
}

impl FocusController {
    pub fn new(
        collaborators: Collaborators,
        settings: StrictModeSettings,
        ledger: StreakLedger,
        rng_seed: Option<u64>,
    ) -> Self {
        let record = ControllerRecord {
            timer: TimerRecord::default(),
            ledger,
        };
        Self::restore(record, collaborators, settings, rng_seed)
    }

    pub fn restore(
        record: ControllerRecord,
        collaborators: Collaborators,
        settings: StrictModeSettings,
        rng_seed: Option<u64>,
    ) -> Self {
        let Collaborators {
            clock,
            blocker,
            notifier,
            store,
        } = collaborators;
        let timer = TimerService::restore(record.timer, clock.clone(), notifier);
        let rng = match rng_seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            clock,
            blocker,
            store,
            timer,
            quit_flow: None,
            ledger: record.ledger,
            settings,
            rng,
        }
    }

    pub fn record(&self) -> ControllerRecord {
        ControllerRecord {
            timer: self.timer.record(),
            ledger: self.ledger.clone(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &TimerService {
        &self.timer
    }

    pub fn ledger(&self) -> &StreakLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &StrictModeSettings {
        &self.settings
    }

    pub fn quit_flow(&self) -> Option<&QuitFlow> {
        self.quit_flow.as_ref()
    }

    pub fn quit_flow_mut(&mut self) -> Option<&mut QuitFlow> {
        self.quit_flow.as_mut()
    }

    /// Streak as shown to the user today.
    pub fn displayed_streak(&self) -> u32 {
        self.ledger.current_streak_on(self.clock.today())
    }

    /// Whether the periodic driver has anything to do.
    pub fn is_ticking(&self) -> bool {
        self.timer.is_ticking() || self.quit_flow.is_some()
    }

    pub fn snapshot(&self) -> Event {
        self.timer.snapshot()
    }

    // ── Session commands ─────────────────────────────────────────────

    /// Takes effect for the next session or quit flow, never the current one.
    pub fn update_settings(&mut self, settings: StrictModeSettings) {
        self.settings = settings;
    }

    pub fn start_session(
        &mut self,
        duration_secs: u64,
        kind: SessionKind,
    ) -> Result<Option<Event>> {
        if duration_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: "must be greater than zero".into(),
            }
            .into());
        }
        if self.timer.state() == TimerState::Completed {
            // Starting the next session dismisses the finished one.
            self.timer.reset();
        }
        let strict = self.settings.is_active(self.clock.now());
        let event = self.timer.start(duration_secs, kind, strict);
        if event.is_some() && kind == SessionKind::Work {
            self.blocker.start_blocking();
        }
        Ok(event)
    }

    /// Ignored while a quit flow is open: the clock keeps running against
    /// the session during the flow.
    pub fn pause(&mut self) -> Vec<Event> {
        if self.quit_flow.is_some() {
            return Vec::new();
        }
        match self.timer.pause() {
            Some(Event::SessionCompleted { session, at }) => self.on_completed(session, at),
            Some(event) => vec![event],
            None => Vec::new(),
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.timer.resume()
    }

    /// Drop the current session without recording it. Refused while a
    /// strict session is active, since that would sidestep the quit flow.
    pub fn reset(&mut self) -> Option<Event> {
        let active = matches!(self.timer.state(), TimerState::Running | TimerState::Paused);
        if active && self.timer.session().is_some_and(|s| s.strict_mode) {
            return None;
        }
        if active {
            self.blocker.stop_blocking();
        }
        self.quit_flow = None;
        Some(self.timer.reset())
    }

    /// Periodic driver entry point.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = Vec::new();
        if let Some(flow) = self.quit_flow.as_mut() {
            if let Some(QuitStep::Advanced(stage)) = flow.poll(now) {
                events.push(Event::QuitFlowAdvanced { stage, at: now });
            }
        }
        if let Some(Event::SessionCompleted { session, at }) = self.timer.tick() {
            events.extend(self.on_completed(session, at));
        }
        events
    }

    pub fn on_background(&mut self) {
        self.timer.on_background();
    }

    pub fn on_foreground(&mut self) -> Vec<Event> {
        match self.timer.on_foreground() {
            Some(Event::SessionCompleted { session, at }) => self.on_completed(session, at),
            _ => Vec::new(),
        }
    }

    // ── Quit flow ────────────────────────────────────────────────────

    /// The user asked to end the session early.
    pub fn request_quit(&mut self) -> Vec<Event> {
        if self.quit_flow.is_some() {
            return Vec::new();
        }
        let Some(session) = self.active_session() else {
            return Vec::new();
        };
        if !session.strict_mode {
            return self.finalize_quit(None);
        }
        let now = self.clock.now();
        let streak = self.displayed_streak();
        let flow = QuitFlow::begin(&self.settings, streak, now, &mut self.rng);
        let challenge = flow.challenge_type();
        self.quit_flow = Some(flow);
        tracing::info!(challenge = challenge.as_str(), streak, "quit flow started");
        vec![Event::QuitFlowStarted {
            challenge,
            streak,
            at: now,
        }]
    }

    pub fn cancel_quit(&mut self) -> Vec<Event> {
        self.step_flow(QuitFlow::cancel)
    }

    pub fn go_back(&mut self) -> Vec<Event> {
        self.step_flow(QuitFlow::go_back)
    }

    pub fn continue_quit(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        self.step_flow(|flow| flow.continue_past_challenge(now))
    }

    pub fn keep_going(&mut self) -> Vec<Event> {
        self.step_flow(QuitFlow::keep_going)
    }

    pub fn confirm_quit(&mut self) -> Vec<Event> {
        self.step_flow(QuitFlow::confirm_quit)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn active_session(&self) -> Option<&Session> {
        match self.timer.state() {
            TimerState::Running | TimerState::Paused => self.timer.session(),
            _ => None,
        }
    }

    fn step_flow<F>(&mut self, step: F) -> Vec<Event>
    where
        F: FnOnce(&mut QuitFlow) -> Option<QuitStep>,
    {
        let now = self.clock.now();
        let Some(flow) = self.quit_flow.as_mut() else {
            return Vec::new();
        };
        match step(flow) {
            Some(QuitStep::Advanced(stage)) => vec![Event::QuitFlowAdvanced { stage, at: now }],
            Some(QuitStep::Aborted(stage)) => {
                self.quit_flow = None;
                vec![Event::QuitFlowAborted { stage, at: now }]
            }
            Some(QuitStep::Confirmed) => {
                let phrase = self
                    .quit_flow
                    .take()
                    .and_then(|f| f.phrase_used().map(str::to_string));
                self.finalize_quit(phrase)
            }
            None => Vec::new(),
        }
    }

    fn finalize_quit(&mut self, phrase: Option<String>) -> Vec<Event> {
        let Some(Event::TimerStopped { session, at }) = self.timer.stop() else {
            return Vec::new();
        };
        let quit_at = session.quit_at.unwrap_or(at);
        let elapsed = (quit_at - session.started_at).num_seconds().max(0) as u64;
        let mut session = session.with_actual_secs(elapsed.min(session.planned_secs));
        if let Some(phrase) = phrase {
            session = session.with_challenge_phrase(phrase);
        }

        if session.kind == SessionKind::Work {
            self.ledger.record_quit();
            self.blocker.stop_blocking();
        }
        self.persist(&session);
        tracing::info!(id = %session.id, actual_secs = ?session.actual_secs, "session quit early");

        vec![
            Event::TimerStopped {
                session: session.clone(),
                at,
            },
            Event::SessionQuit { session, at },
        ]
    }

    fn on_completed(&mut self, session: Session, at: chrono::DateTime<chrono::Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(flow) = self.quit_flow.take() {
            // Nothing left to quit.
            events.push(Event::QuitFlowAborted {
                stage: flow.stage(),
                at,
            });
        }
        if session.kind == SessionKind::Work {
            self.ledger.record_completion(self.clock.today());
            self.blocker.stop_blocking();
        }
        self.persist(&session);
        events.push(Event::SessionCompleted { session, at });
        events
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save_session(session) {
            tracing::warn!(error = %e, id = %session.id, "failed to persist session");
        }
        if session.kind == SessionKind::Work {
            if let Err(e) = self.store.save_ledger(&self.ledger) {
                tracing::warn!(error = %e, "failed to persist streak ledger");
            }
        }
    }
}

impl std::fmt::Debug for FocusController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusController")
            .field("timer", &self.timer)
            .field("quit_flow", &self.quit_flow.as_ref().map(QuitFlow::stage))
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
