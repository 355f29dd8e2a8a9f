//! Periodic tick driver.
//!
//! One task owns the [`FocusController`]. Ticks from a tokio interval and
//! commands from the front-end are multiplexed on that task, so no two
//! transitions ever run concurrently.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::controller::FocusController;
use crate::events::Event;
use crate::session::SessionKind;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { duration_secs: u64, kind: SessionKind },
    Pause,
    Resume,
    RequestQuit,
    CancelQuit,
    GoBack,
    ContinueQuit,
    KeepGoing,
    ConfirmQuit,
    Background,
    Foreground,
    Reset,
    Snapshot,
    Shutdown,
}

/// Run until the command channel closes or `Shutdown` arrives, then hand
/// the controller back for persistence.
pub async fn run(
    mut controller: FocusController,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
    tick_every: Duration,
) -> FocusController {
    let mut interval = time::interval(tick_every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if controller.is_ticking() {
                    forward(&events, controller.tick());
                }
            }
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                if cmd == Command::Shutdown {
                    break;
                }
                let out = apply(&mut controller, cmd);
                forward(&events, out);
            }
        }
    }

    tracing::debug!("tick driver stopped");
    controller
}

fn apply(controller: &mut FocusController, cmd: Command) -> Vec<Event> {
    match cmd {
        Command::Start {
            duration_secs,
            kind,
        } => match controller.start_session(duration_secs, kind) {
            Ok(event) => event.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "start rejected");
                Vec::new()
            }
        },
        Command::Pause => controller.pause(),
        Command::Resume => controller.resume().into_iter().collect(),
        Command::RequestQuit => controller.request_quit(),
        Command::CancelQuit => controller.cancel_quit(),
        Command::GoBack => controller.go_back(),
        Command::ContinueQuit => controller.continue_quit(),
        Command::KeepGoing => controller.keep_going(),
        Command::ConfirmQuit => controller.confirm_quit(),
        Command::Background => {
            controller.on_background();
            Vec::new()
        }
        Command::Foreground => controller.on_foreground(),
        Command::Reset => controller.reset().into_iter().collect(),
        Command::Snapshot => vec![controller.snapshot()],
        Command::Shutdown => Vec::new(),
    }
}

fn forward(events: &mpsc::UnboundedSender<Event>, out: Vec<Event>) {
    for event in out {
        // A closed receiver only means nobody is listening any more.
        let _ = events.send(event);
    }
}
