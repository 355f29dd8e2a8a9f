use std::time::Duration;

use clap::Subcommand;
use focusflow_core::driver::{self, Command};
use focusflow_core::{Event, SessionKind, TimerState};
use tokio::sync::mpsc;

use crate::app::{print_json, App};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session
    Start {
        /// Length in minutes (defaults to the configured work/rest length)
        #[arg(long)]
        minutes: Option<u64>,
        /// Start a rest session instead of a work session
        #[arg(long)]
        rest: bool,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Drop the current session without recording it
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Follow the running session until it ends, printing events as JSON
    Watch,
    /// Tell the timer the app is going to the background
    Background,
    /// Tell the timer the app is back in front
    Foreground,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open()?;

    match action {
        TimerAction::Start { minutes, rest } => {
            let kind = if rest { SessionKind::Rest } else { SessionKind::Work };
            let secs = match (minutes, kind) {
                (Some(m), _) => m.saturating_mul(60),
                (None, SessionKind::Work) => app.config.work_secs(),
                (None, SessionKind::Rest) => app.config.rest_secs(),
            };
            // Catch up first so a session that ran out meanwhile is recorded.
            print_events(app.controller.tick())?;
            match app.controller.start_session(secs, kind)? {
                Some(event) => print_json(&event)?,
                None => return Err("a session is already in progress".into()),
            }
        }
        TimerAction::Pause => {
            let events = app.controller.pause();
            if events.is_empty() {
                print_json(&app.controller.snapshot())?;
            }
            print_events(events)?;
        }
        TimerAction::Resume => match app.controller.resume() {
            Some(event) => print_json(&event)?,
            None => print_json(&app.controller.snapshot())?,
        },
        TimerAction::Reset => match app.controller.reset() {
            Some(event) => print_json(&event)?,
            None => {
                return Err("strict mode is on; use `focusflow quit` to end this session".into())
            }
        },
        TimerAction::Status => {
            let events = app.controller.tick();
            print_json(&app.controller.snapshot())?;
            print_events(events)?;
        }
        TimerAction::Watch => {
            let tick_every = app.config.tick_interval();
            let App {
                config,
                db,
                controller,
            } = app;
            let controller = watch(controller, tick_every)?;
            app = App {
                config,
                db,
                controller,
            };
        }
        TimerAction::Background => {
            app.controller.on_background();
            print_json(&app.controller.snapshot())?;
        }
        TimerAction::Foreground => {
            let events = app.controller.on_foreground();
            print_json(&app.controller.snapshot())?;
            print_events(events)?;
        }
    }

    app.save()
}

fn print_events(events: Vec<Event>) -> Result<(), Box<dyn std::error::Error>> {
    for event in &events {
        print_json(event)?;
    }
    Ok(())
}

/// Drive the controller from the tick loop until the session completes.
fn watch(
    controller: focusflow_core::FocusController,
    tick_every: Duration,
) -> Result<focusflow_core::FocusController, Box<dyn std::error::Error>> {
    if controller.timer().state() != TimerState::Running {
        print_json(&controller.snapshot())?;
        return Ok(controller);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let controller = runtime.block_on(async move {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(driver::run(controller, cmd_rx, ev_tx, tick_every));

        let mut status = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = status.tick() => {
                    if cmd_tx.send(Command::Snapshot).await.is_err() {
                        break;
                    }
                }
                event = ev_rx.recv() => {
                    let Some(event) = event else { break };
                    if let Ok(json) = serde_json::to_string(&event) {
                        println!("{json}");
                    }
                    if matches!(event, Event::SessionCompleted { .. }) {
                        break;
                    }
                }
            }
        }

        let _ = cmd_tx.send(Command::Shutdown).await;
        handle.await
    })?;

    Ok(controller)
}
