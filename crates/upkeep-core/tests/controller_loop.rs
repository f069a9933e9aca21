//! Controller loop tests over a real tokio runtime with very short
//! timings and a tempdir-backed database. The evaluator runs on wall
//! clock, so these tests use real (tens-of-milliseconds) delays rather
//! than tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use upkeep_core::{
    BackgroundBehavior, BackgroundNotifier, Config, ControllerEvent, ControllerHandle, Database,
    Event, NotificationChannel, NotifyError, NullRemoteSource, ReminderCandidate,
    ReminderController, ReminderStore, ReminderTiming, Signals, StaticSignals, UserAction,
};

#[derive(Clone, Default)]
struct RecordingChannel {
    sent: Arc<Mutex<Vec<String>>>,
}

impl NotificationChannel for RecordingChannel {
    fn permission_granted(&mut self) -> bool {
        true
    }

    fn send(&mut self, title: &str, _body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(title.to_string());
        Ok(())
    }

    fn request_attention(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }
}

fn fast_timing() -> ReminderTiming {
    ReminderTiming {
        first_delay_ms: 50,
        cadence_ms: 10_000,
        min_reschedule_ms: 10,
        inactive_poll_ms: 30,
        fullscreen_poll_floor_ms: 30,
        notify_rate_limit_ms: 10_000,
    }
}

fn fast_config() -> Config {
    Config {
        auto_check: false,
        timing: fast_timing(),
        ..Config::default()
    }
}

struct Harness {
    handle: ControllerHandle,
    events: tokio::sync::mpsc::UnboundedReceiver<Event>,
    sent: Arc<Mutex<Vec<String>>>,
    _dir: tempfile::TempDir,
}

fn spawn_controller(signals: Signals) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("upkeep.db")).unwrap();
    let store = ReminderStore::with_database(db);

    let channel = RecordingChannel::default();
    let sent = channel.sent.clone();
    let notifier = BackgroundNotifier::new(channel, BackgroundBehavior::Notification);

    let (mut controller, handle) = ReminderController::new(
        store,
        fast_config(),
        None::<NullRemoteSource>,
        None,
        StaticSignals(signals),
        notifier,
    );
    let events = controller.take_events().unwrap();
    tokio::spawn(controller.run());

    Harness {
        handle,
        events,
        sent,
        _dir: dir,
    }
}

async fn next_event(events: &mut tokio::sync::mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Wait for the next event of the wanted shape, skipping others.
macro_rules! expect_event {
    ($events:expr, $pattern:pat => $body:expr) => {
        loop {
            match next_event($events).await {
                $pattern => break $body,
                _ => continue,
            }
        }
    };
}

#[tokio::test]
async fn mock_candidate_shows_after_grace_period() {
    let mut h = spawn_controller(Signals::default());

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0",
            Some("Notes."),
        )))
        .await;

    expect_event!(&mut h.events, Event::CandidateDetected { version, .. } => {
        assert_eq!(version, "3.0.0");
    });
    expect_event!(&mut h.events, Event::ReminderShown { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    h.handle.shutdown().await;
}

#[tokio::test]
async fn snooze_hides_then_reshows_at_expiry() {
    let mut h = spawn_controller(Signals::default());

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0", None,
        )))
        .await;
    expect_event!(&mut h.events, Event::ReminderShown { .. } => ());

    h.handle
        .send(ControllerEvent::User(UserAction::Snooze(120)))
        .await;
    expect_event!(&mut h.events, Event::ReminderHidden { .. } => ());
    expect_event!(&mut h.events, Event::ReminderSnoozed { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    // The deadline armed by the snooze brings it back without any
    // further prompting.
    expect_event!(&mut h.events, Event::ReminderShown { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    h.handle.shutdown().await;
}

#[tokio::test]
async fn skip_dismisses_and_stays_quiet() {
    let mut h = spawn_controller(Signals::default());

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0", None,
        )))
        .await;
    expect_event!(&mut h.events, Event::ReminderShown { .. } => ());

    h.handle.send(ControllerEvent::User(UserAction::Skip)).await;
    expect_event!(&mut h.events, Event::VersionDismissed { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    // Nothing further may arrive, even well past the cadence floor.
    tokio::time::sleep(Duration::from_millis(300)).await;
    h.handle.send(ControllerEvent::Refresh).await;
    h.handle.shutdown().await;
    while let Some(event) = h.events.recv().await {
        assert!(
            !matches!(event, Event::ReminderShown { .. }),
            "dismissed version shown again"
        );
    }
}

#[tokio::test]
async fn inactive_window_notifies_once_without_banner() {
    let inactive = Signals {
        window_active: false,
        ..Signals::default()
    };
    let mut h = spawn_controller(inactive);

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0",
            Some("Fixes."),
        )))
        .await;

    expect_event!(&mut h.events, Event::NotificationSent { version, .. } => {
        assert_eq!(version, "3.0.0");
    });
    assert_eq!(
        h.sent.lock().unwrap_or_else(|e| e.into_inner()).as_slice(),
        ["Update 3.0.0 available"]
    );

    // Rate-limited: several more inactive polls, still one delivery.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.sent.lock().unwrap_or_else(|e| e.into_inner()).len(), 1);

    h.handle.shutdown().await;
    while let Some(event) = h.events.recv().await {
        assert!(
            !matches!(event, Event::ReminderShown { .. }),
            "banner shown while window inactive"
        );
    }
}

#[tokio::test]
async fn clearing_the_mock_clears_the_candidate_and_banner() {
    let mut h = spawn_controller(Signals::default());

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0", None,
        )))
        .await;
    expect_event!(&mut h.events, Event::ReminderShown { .. } => ());

    h.handle.send(ControllerEvent::MockCleared).await;
    expect_event!(&mut h.events, Event::CandidateCleared { .. } => ());
    expect_event!(&mut h.events, Event::ReminderHidden { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    h.handle.shutdown().await;
}

#[tokio::test]
async fn repeated_pokes_converge_to_one_presentation() {
    let mut h = spawn_controller(Signals::default());

    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0", None,
        )))
        .await;

    // Hammer the queue through the grace period; every poke supersedes
    // the pending deadline, none may produce an extra show.
    for _ in 0..20 {
        h.handle.send(ControllerEvent::Refresh).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    expect_event!(&mut h.events, Event::ReminderShown { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.handle.shutdown().await;
    let mut shows = 1;
    while let Some(event) = h.events.recv().await {
        if matches!(event, Event::ReminderShown { .. }) {
            shows += 1;
        }
    }
    assert_eq!(shows, 1, "reminder presented more than once");
}

#[tokio::test]
async fn manual_pause_suppresses_until_resume() {
    let mut h = spawn_controller(Signals::default());

    h.handle.send(ControllerEvent::Pause(60_000)).await;
    h.handle
        .send(ControllerEvent::MockSet(ReminderCandidate::mock(
            "3.0.0", None,
        )))
        .await;
    expect_event!(&mut h.events, Event::CandidateDetected { .. } => ());

    // Paused: the grace period elapses with nothing shown.
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.handle.send(ControllerEvent::Resume).await;

    expect_event!(&mut h.events, Event::ReminderShown { version, .. } => {
        assert_eq!(version, "3.0.0");
    });

    h.handle.shutdown().await;
}
