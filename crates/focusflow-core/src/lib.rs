//! # FocusFlow Core Library
//!
//! Session timing and Strict Mode quit friction for the FocusFlow focus
//! timer. The library is front-end agnostic: it exposes state and accepts
//! commands, and every transition is reported as an [`Event`].
//!
//! ## Architecture
//!
//! - **Timer**: a wall-clock-based state machine; remaining time is derived
//!   from the absolute end time so suspension never skews it
//! - **Quit flow**: Delay, Challenge and Streak Warning stages standing
//!   between "quit" and an actual early stop when Strict Mode is on
//! - **Challenges**: phrase, arithmetic, tap pattern and press-and-hold
//! - **Ledger**: day streaks from completions and quits
//! - **Storage**: SQLite session storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusController`]: the entry point front-ends drive
//! - [`TimerService`]: core timer state machine
//! - [`QuitFlow`]: friction sequence for early termination
//! - [`driver::run`]: async single-owner tick loop

pub mod challenge;
pub mod clock;
pub mod controller;
pub mod driver;
pub mod error;
pub mod events;
pub mod ledger;
pub mod quit_flow;
pub mod services;
pub mod session;
pub mod storage;
pub mod strict_mode;
pub mod timer;

pub use challenge::Challenge;
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Collaborators, ControllerRecord, FocusController};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use ledger::StreakLedger;
pub use quit_flow::{QuitFlow, QuitStage, QuitStep, StreakWarning};
pub use services::{BlockingService, NotificationService, SessionStore};
pub use session::{CompletionStatus, Session, SessionKind};
pub use storage::{Config, Database, Stats};
pub use strict_mode::{ChallengeType, DisableOutcome, EnableOutcome, StrictModeSettings, Tone};
pub use timer::{TimerRecord, TimerService, TimerState};
