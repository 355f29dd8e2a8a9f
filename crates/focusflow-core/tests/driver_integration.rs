//! The tick driver against a hand-moved clock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use focusflow_core::driver::{self, Command};
use focusflow_core::services::{LoggingBlocker, LoggingNotifier, NullStore};
use focusflow_core::{
    ChallengeType, Collaborators, Event, FocusController, ManualClock, QuitStage, SessionKind,
    StreakLedger, StrictModeSettings, TimerState,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn controller(clock: Arc<ManualClock>, settings: StrictModeSettings) -> FocusController {
    FocusController::new(
        Collaborators {
            clock,
            blocker: Arc::new(LoggingBlocker),
            notifier: Arc::new(LoggingNotifier),
            store: Arc::new(NullStore),
        },
        settings,
        StreakLedger::default(),
        Some(5),
    )
}

async fn next_matching<F>(rx: &mut mpsc::UnboundedReceiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    timeout(StdDuration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("driver closed the event channel");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn driver_completes_session_when_clock_passes_end() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
    ));
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(driver::run(
        controller(clock.clone(), StrictModeSettings::default()),
        cmd_rx,
        ev_tx,
        StdDuration::from_millis(5),
    ));

    cmd_tx
        .send(Command::Start {
            duration_secs: 1500,
            kind: SessionKind::Work,
        })
        .await
        .unwrap();
    next_matching(&mut ev_rx, |e| matches!(e, Event::TimerStarted { .. })).await;

    clock.advance_secs(1500);
    next_matching(&mut ev_rx, |e| matches!(e, Event::SessionCompleted { .. })).await;

    cmd_tx.send(Command::Shutdown).await.unwrap();
    let controller = handle.await.unwrap();
    assert_eq!(controller.timer().state(), TimerState::Completed);
    assert_eq!(controller.ledger().current_streak, 1);
}

#[tokio::test]
async fn driver_advances_quit_delay() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
    ));
    let settings = StrictModeSettings {
        enabled: true,
        challenge_type: ChallengeType::HoldButton,
        ..Default::default()
    };
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(driver::run(
        controller(clock.clone(), settings),
        cmd_rx,
        ev_tx,
        StdDuration::from_millis(5),
    ));

    cmd_tx
        .send(Command::Start {
            duration_secs: 600,
            kind: SessionKind::Work,
        })
        .await
        .unwrap();
    cmd_tx.send(Command::RequestQuit).await.unwrap();
    next_matching(&mut ev_rx, |e| matches!(e, Event::QuitFlowStarted { .. })).await;

    clock.advance_secs(10);
    let event = next_matching(&mut ev_rx, |e| matches!(e, Event::QuitFlowAdvanced { .. })).await;
    assert!(matches!(
        event,
        Event::QuitFlowAdvanced {
            stage: QuitStage::Challenge,
            ..
        }
    ));

    cmd_tx.send(Command::GoBack).await.unwrap();
    next_matching(&mut ev_rx, |e| matches!(e, Event::QuitFlowAborted { .. })).await;

    // Dropping the sender stops the driver as well.
    drop(cmd_tx);
    let controller = handle.await.unwrap();
    assert!(controller.quit_flow().is_none());
    assert_eq!(controller.timer().state(), TimerState::Running);
}
