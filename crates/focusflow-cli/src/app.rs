//! Per-invocation state shared by the subcommands.
//!
//! Every CLI call is a short-lived host: it restores the controller from the
//! database, applies one command and writes the controller back.

use std::sync::Arc;

use chrono::Utc;
use focusflow_core::services::{LoggingBlocker, LoggingNotifier};
use focusflow_core::{
    BlockingService, Collaborators, Config, ControllerRecord, Database, FocusController,
    NotificationService, SessionKind, SystemClock,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Blocker used when blocking is switched off in the config.
struct NoBlocker;

impl BlockingService for NoBlocker {
    fn start_blocking(&self) {}
    fn stop_blocking(&self) {}
}

/// Notifier used when notifications are switched off in the config.
struct NoNotifier;

impl NotificationService for NoNotifier {
    fn schedule_completion_alert(
        &self,
        _at: chrono::DateTime<Utc>,
        _duration_secs: u64,
        _kind: SessionKind,
    ) -> focusflow_core::error::Result<()> {
        Ok(())
    }

    fn cancel_pending(&self) -> focusflow_core::error::Result<()> {
        Ok(())
    }
}

pub struct App {
    pub config: Config,
    pub db: Arc<Database>,
    pub controller: FocusController,
}

impl App {
    pub fn open() -> CliResult<Self> {
        let mut config = Config::load()?;
        let before = config.strict_mode.clone();
        config.strict_mode.settle(Utc::now());
        if config.strict_mode != before {
            tracing::info!("scheduled strict mode disable took effect");
            config.save()?;
        }

        let db = Arc::new(Database::open()?);
        let record = match db.load_controller()? {
            Some(record) => record,
            None => ControllerRecord {
                timer: Default::default(),
                ledger: db.load_ledger()?,
            },
        };

        let blocker: Arc<dyn BlockingService> = if config.blocking.enabled {
            Arc::new(LoggingBlocker)
        } else {
            Arc::new(NoBlocker)
        };
        let notifier: Arc<dyn NotificationService> = if config.notifications.enabled {
            Arc::new(LoggingNotifier)
        } else {
            Arc::new(NoNotifier)
        };

        let controller = FocusController::restore(
            record,
            Collaborators {
                clock: Arc::new(SystemClock),
                blocker,
                notifier,
                store: db.clone(),
            },
            config.strict_mode.clone(),
            config.rng_seed,
        );

        Ok(Self {
            config,
            db,
            controller,
        })
    }

    pub fn save(&self) -> CliResult<()> {
        self.db.save_controller(&self.controller.record())?;
        Ok(())
    }
}

/// Print a JSON value the way every subcommand does.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
