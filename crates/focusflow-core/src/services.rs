//! Collaborator contracts.
//!
//! The core never enforces app blocking, delivers notifications or owns a
//! database itself. It talks to these traits, supplied by whoever builds the
//! [`FocusController`](crate::controller::FocusController).

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ledger::StreakLedger;
use crate::session::{Session, SessionKind};

/// Screen/app blocking enforcement. Fire-and-forget.
pub trait BlockingService: Send + Sync {
    fn start_blocking(&self);
    fn stop_blocking(&self);
}

/// Local notification delivery, used only around background/foreground
/// transitions.
pub trait NotificationService: Send + Sync {
    fn schedule_completion_alert(
        &self,
        at: DateTime<Utc>,
        duration_secs: u64,
        kind: SessionKind,
    ) -> Result<()>;

    fn cancel_pending(&self) -> Result<()>;
}

/// Durable store for finished sessions and ledger snapshots.
pub trait SessionStore: Send + Sync {
    fn save_session(&self, session: &Session) -> Result<()>;
    fn save_ledger(&self, ledger: &StreakLedger) -> Result<()>;
}

/// Blocking stand-in that only records what it was asked to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBlocker;

impl BlockingService for LoggingBlocker {
    fn start_blocking(&self) {
        tracing::info!("blocking requested");
    }

    fn stop_blocking(&self) {
        tracing::info!("blocking released");
    }
}

/// Notification stand-in for hosts without a notification centre.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl NotificationService for LoggingNotifier {
    fn schedule_completion_alert(
        &self,
        at: DateTime<Utc>,
        duration_secs: u64,
        kind: SessionKind,
    ) -> Result<()> {
        tracing::info!(%at, duration_secs, kind = kind.as_str(), "completion alert scheduled");
        Ok(())
    }

    fn cancel_pending(&self) -> Result<()> {
        tracing::debug!("pending alerts cancelled");
        Ok(())
    }
}

/// Store that drops everything. Useful when persistence is handled elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl SessionStore for NullStore {
    fn save_session(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn save_ledger(&self, _ledger: &StreakLedger) -> Result<()> {
        Ok(())
    }
}
