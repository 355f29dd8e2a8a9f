use clap::Subcommand;
use focusflow_core::storage::Database;
use focusflow_core::{Clock, SystemClock};
use serde_json::json;

use crate::app::print_json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Current and longest streak
    Streak,
    /// Most recent sessions
    History {
        /// How many sessions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => print_json(&db.stats_today()?)?,
        StatsAction::All => print_json(&db.stats_all()?)?,
        StatsAction::Streak => {
            let ledger = db.load_ledger()?;
            print_json(&json!({
                "current_streak": ledger.current_streak_on(SystemClock.today()),
                "longest_streak": ledger.longest_streak,
                "total_completed": ledger.total_completed,
                "total_quit": ledger.total_quit,
                "last_completion": ledger.last_completion,
            }))?;
        }
        StatsAction::History { limit } => print_json(&db.recent_sessions(limit)?)?,
    }
    Ok(())
}
