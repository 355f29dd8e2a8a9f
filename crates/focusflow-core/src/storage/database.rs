//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Finished sessions (completed and quit early)
//! - Session statistics (daily and all-time)
//! - Key-value store for the streak ledger and timer state

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::controller::ControllerRecord;
use crate::error::{CoreError, DatabaseError, Result};
use crate::ledger::StreakLedger;
use crate::services::SessionStore;
use crate::session::Session;

const LEDGER_KEY: &str = "streak_ledger";
const CONTROLLER_KEY: &str = "controller_record";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_work: u64,
    pub quit_work: u64,
    pub completed_rest: u64,
    pub focus_min: u64,
}

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so one handle can be shared with the
/// controller as its [`SessionStore`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::from(DatabaseError::Locked))
    }

    /// Open the database at `<data_dir>/focusflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusflow.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id               TEXT PRIMARY KEY,
                    kind             TEXT NOT NULL,
                    status           TEXT NOT NULL,
                    started_at       TEXT NOT NULL,
                    planned_secs     INTEGER NOT NULL,
                    actual_secs      INTEGER,
                    strict_mode      INTEGER NOT NULL DEFAULT 0,
                    quit_at          TEXT,
                    challenge_phrase TEXT
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_kind_status ON sessions(kind, status);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Insert or replace a finished session.
    pub fn record_session(&self, session: &Session) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO sessions
                (id, kind, status, started_at, planned_secs, actual_secs,
                 strict_mode, quit_at, challenge_phrase)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.id.to_string(),
                session.kind.as_str(),
                session.status.as_str(),
                session.started_at.to_rfc3339(),
                session.planned_secs,
                session.actual_secs,
                session.strict_mode,
                session.quit_at.map(|t| t.to_rfc3339()),
                session.challenge_phrase,
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<Session>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, status, started_at, planned_secs, actual_secs,
                    strict_mode, quit_at, challenge_phrase
             FROM sessions
             ORDER BY started_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], raw_session)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    /// Stats for sessions started on or after `since`.
    pub fn stats_since(&self, since: Option<DateTime<Utc>>) -> Result<Stats> {
        let since = since
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "0000".to_string());
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT kind, status, COUNT(*), COALESCE(SUM(actual_secs), 0)
             FROM sessions
             WHERE started_at >= ?1
             GROUP BY kind, status",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (kind, status, count, secs) = row?;
            stats.total_sessions += count;
            match (kind.as_str(), status.as_str()) {
                ("work", "completed") => {
                    stats.completed_work += count;
                    stats.focus_min += secs / 60;
                }
                ("work", "quit_early") => {
                    stats.quit_work += count;
                    stats.focus_min += secs / 60;
                }
                ("rest", "completed") => stats.completed_rest += count,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Sessions started since local midnight, the same day boundary the
    /// streak ledger uses.
    pub fn stats_today(&self) -> Result<Stats> {
        self.stats_since(start_of_day(&Local::now()))
    }

    pub fn stats_all(&self) -> Result<Stats> {
        self.stats_since(None)
    }

    pub fn load_ledger(&self) -> Result<StreakLedger> {
        self.kv_get_json(LEDGER_KEY).map(Option::unwrap_or_default)
    }

    pub fn load_controller(&self) -> Result<Option<ControllerRecord>> {
        self.kv_get_json(CONTROLLER_KEY)
    }

    pub fn save_controller(&self, record: &ControllerRecord) -> Result<()> {
        self.kv_set(CONTROLLER_KEY, &serde_json::to_string(record)?)?;
        // Keep the standalone ledger in step for readers that only want stats.
        self.save_ledger(&record.ledger)
    }

    fn kv_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv_get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Midnight of `now`'s own calendar day, as a UTC instant. Falls forward an
/// hour at a time when a DST jump skips midnight.
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let day = now.date_naive();
    let tz = now.timezone();
    (0..3)
        .find_map(|hour| tz.from_local_datetime(&day.and_hms_opt(hour, 0, 0)?).earliest())
        .map(|t| t.with_timezone(&Utc))
}

impl SessionStore for Database {
    fn save_session(&self, session: &Session) -> Result<()> {
        self.record_session(session)
    }

    fn save_ledger(&self, ledger: &StreakLedger) -> Result<()> {
        self.kv_set(LEDGER_KEY, &serde_json::to_string(ledger)?)
    }
}

/// Column values as stored, decoded into a [`Session`] outside the row
/// callback so decode failures keep their own error type.
struct RawSession {
    id: String,
    kind: String,
    status: String,
    started_at: String,
    planned_secs: u64,
    actual_secs: Option<u64>,
    strict_mode: bool,
    quit_at: Option<String>,
    challenge_phrase: Option<String>,
}

fn raw_session(row: &Row<'_>) -> rusqlite::Result<RawSession> {
    Ok(RawSession {
        id: row.get(0)?,
        kind: row.get(1)?,
        status: row.get(2)?,
        started_at: row.get(3)?,
        planned_secs: row.get(4)?,
        actual_secs: row.get(5)?,
        strict_mode: row.get(6)?,
        quit_at: row.get(7)?,
        challenge_phrase: row.get(8)?,
    })
}

impl RawSession {
    fn decode(self) -> Result<Session> {
        let corrupt = |message: String| {
            CoreError::from(DatabaseError::CorruptRow {
                table: "sessions".into(),
                message,
            })
        };
        let parse_time = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| corrupt(e.to_string()))
        };
        Ok(Session {
            id: Uuid::parse_str(&self.id).map_err(|e| corrupt(e.to_string()))?,
            kind: self
                .kind
                .parse()
                .map_err(|e: crate::error::ValidationError| corrupt(e.to_string()))?,
            status: self
                .status
                .parse()
                .map_err(|e: crate::error::ValidationError| corrupt(e.to_string()))?,
            started_at: parse_time(&self.started_at)?,
            planned_secs: self.planned_secs,
            actual_secs: self.actual_secs,
            strict_mode: self.strict_mode,
            quit_at: self.quit_at.as_deref().map(parse_time).transpose()?,
            challenge_phrase: self.challenge_phrase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let done = Session::new(now, 1500, SessionKind::Work, false).completed();
        let quit = Session::new(now + Duration::hours(1), 1500, SessionKind::Work, true)
            .quit_early(now + Duration::minutes(70))
            .with_actual_secs(600)
            .with_challenge_phrase("I give up");
        db.record_session(&done).unwrap();
        db.record_session(&quit).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_work, 1);
        assert_eq!(stats.quit_work, 1);
        assert_eq!(stats.focus_min, 35);

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, quit.id);
        assert_eq!(recent[0].challenge_phrase.as_deref(), Some("I give up"));
        assert_eq!(recent[1], done);
    }

    #[test]
    fn day_starts_at_local_midnight() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 01:30 on June 3rd in Tokyo is still June 2nd in UTC.
        let now = tokyo.with_ymd_and_hms(2024, 6, 3, 1, 30, 0).unwrap();
        let start = start_of_day(&now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 2, 15, 0, 0).unwrap());

        let db = Database::open_memory().unwrap();
        let yesterday = Session::new(start - Duration::minutes(30), 60, SessionKind::Work, false)
            .completed()
            .with_actual_secs(60);
        let today = Session::new(start + Duration::minutes(30), 60, SessionKind::Work, false)
            .completed()
            .with_actual_secs(60);
        db.record_session(&yesterday).unwrap();
        db.record_session(&today).unwrap();
        assert_eq!(db.stats_since(Some(start)).unwrap().completed_work, 1);
        assert_eq!(db.stats_all().unwrap().completed_work, 2);
    }

    #[test]
    fn rerecording_replaces() {
        let db = Database::open_memory().unwrap();
        let s = Session::new(Utc::now(), 60, SessionKind::Rest, false).completed();
        db.record_session(&s).unwrap();
        db.record_session(&s).unwrap();
        assert_eq!(db.stats_all().unwrap().total_sessions, 1);
    }

    #[test]
    fn ledger_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load_ledger().unwrap(), StreakLedger::default());
        let mut ledger = StreakLedger::default();
        ledger.record_completion(Utc::now().date_naive());
        db.save_ledger(&ledger).unwrap();
        assert_eq!(db.load_ledger().unwrap(), ledger);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }
}
