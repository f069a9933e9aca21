//! Scheduler loop.
//!
//! Owns exactly one pending re-evaluation deadline. Every external
//! event — source refresh, user action, operator command — lands on one
//! queue, supersedes the pending deadline, and triggers a fresh
//! evaluation; the deadline is re-armed from the evaluator's requested
//! delay, floored to the minimum reschedule quantum. The deadline is
//! cleared before the evaluator runs, so a fresh evaluation can never
//! race a stale timer handle. All state mutation happens inside this
//! loop's single task; there is nothing to lock.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};

use super::display::{DisplayState, UserAction};
use super::evaluator::{evaluate, Evaluation};
use super::now_ms;
use crate::candidate::{resolve, DetectionLedger, ReminderCandidate};
use crate::events::Event;
use crate::feed::{FeedUpdate, LocalFeedSource};
use crate::notify::{BackgroundNotifier, NotificationChannel};
use crate::remote::{RemoteSource, RemoteUpdate};
use crate::signals::SignalSource;
use crate::storage::{Config, ReminderStore, ReminderStyle};

/// Commands accepted by the controller loop.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Force an immediate re-evaluation.
    Refresh,
    /// Environment signals changed (focus, fullscreen, install state).
    SignalsChanged,
    /// The user acted on the visible reminder.
    User(UserAction),
    /// Operator: inject a mock candidate.
    MockSet(ReminderCandidate),
    /// Operator: remove the mock candidate.
    MockCleared,
    SetStyle(ReminderStyle),
    /// Pause all reminding for this many ms.
    Pause(u64),
    Resume,
    /// Restore default state, discarding suppression history.
    Reset,
    Shutdown,
}

/// Cheap handle for poking the controller from the host.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerEvent>,
}

impl ControllerHandle {
    /// Queue an event. Returns false if the controller has shut down.
    pub async fn send(&self, event: ControllerEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(ControllerEvent::Shutdown).await;
    }
}

/// Drives the reminder: resolves candidates, evaluates, applies side
/// effects, re-arms the timer.
pub struct ReminderController<R, S, C> {
    store: ReminderStore,
    config: Config,
    ledger: DetectionLedger,
    remote: Option<R>,
    feed: Option<LocalFeedSource>,
    signals: S,
    notifier: BackgroundNotifier<C>,

    mock: Option<ReminderCandidate>,
    latest_remote: Option<RemoteUpdate>,
    latest_feed: Option<FeedUpdate>,
    active_key: Option<String>,

    display: DisplayState,
    deadline: Option<Instant>,

    commands: Option<mpsc::Receiver<ControllerEvent>>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: Option<mpsc::UnboundedReceiver<Event>>,
}

impl<R, S, C> ReminderController<R, S, C>
where
    R: RemoteSource,
    S: SignalSource,
    C: NotificationChannel,
{
    pub fn new(
        store: ReminderStore,
        config: Config,
        remote: Option<R>,
        feed: Option<LocalFeedSource>,
        signals: S,
        notifier: BackgroundNotifier<C>,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::channel(32);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mock = store.mock();
        let controller = Self {
            store,
            config,
            ledger: DetectionLedger::new(),
            remote,
            feed,
            signals,
            notifier,
            mock,
            latest_remote: None,
            latest_feed: None,
            active_key: None,
            display: DisplayState::Hidden,
            deadline: None,
            commands: Some(rx),
            events_tx,
            events_rx: Some(events_rx),
        };
        (controller, ControllerHandle { tx })
    }

    /// Take the event stream. The host subscribes to render the banner.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.events_rx.take()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Run until shutdown. Consumes the controller.
    pub async fn run(mut self) {
        let Some(mut commands) = self.commands.take() else {
            return;
        };

        let mut feed_tick =
            tokio::time::interval(Duration::from_millis(self.config.sources.feed_refresh_ms.max(1)));
        feed_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut remote_tick =
            tokio::time::interval(Duration::from_millis(self.config.sources.remote_check_ms.max(1)));
        remote_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let feed_enabled = self.config.sources.feed_enabled && self.feed.is_some();
        let remote_enabled = self.config.auto_check && self.remote.is_some();

        self.evaluate_and_apply();

        loop {
            let deadline = self.deadline;
            tokio::select! {
                _ = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.evaluate_and_apply();
                }
                _ = feed_tick.tick(), if feed_enabled => {
                    self.refresh_feed();
                    self.evaluate_and_apply();
                }
                _ = remote_tick.tick(), if remote_enabled => {
                    self.check_remote().await;
                    self.evaluate_and_apply();
                }
                command = commands.recv() => {
                    match command {
                        None | Some(ControllerEvent::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, command: ControllerEvent) {
        match command {
            ControllerEvent::Refresh | ControllerEvent::SignalsChanged => {}
            ControllerEvent::User(action) => {
                self.handle_user_action(action);
                return;
            }
            ControllerEvent::MockSet(candidate) => {
                if let Err(e) = self.store.set_mock(&candidate) {
                    tracing::warn!(error = %e, "failed to persist mock candidate");
                }
                self.mock = Some(candidate);
            }
            ControllerEvent::MockCleared => {
                if let Err(e) = self.store.clear_mock() {
                    tracing::warn!(error = %e, "failed to clear mock candidate");
                }
                self.mock = None;
            }
            ControllerEvent::SetStyle(style) => self.store.set_style(style),
            ControllerEvent::Pause(duration_ms) => {
                let until = now_ms().saturating_add(duration_ms);
                self.store.set_manual_pause_until(until);
            }
            ControllerEvent::Resume => self.store.set_manual_pause_until(0),
            ControllerEvent::Reset => {
                self.store.reset();
                self.emit(Event::StateReset { at: Utc::now() });
            }
            ControllerEvent::Shutdown => unreachable!("handled by the run loop"),
        }
        self.evaluate_and_apply();
    }

    /// Visible -> Hidden transitions. Each action picks the delay the
    /// next check is armed with, superseding the pending deadline.
    fn handle_user_action(&mut self, action: UserAction) {
        let Some(version) = self.display.version().map(str::to_string) else {
            // Nothing on screen; stale action from the host.
            return;
        };
        let now = now_ms();
        self.display = DisplayState::Hidden;
        self.deadline = None;
        self.emit(Event::ReminderHidden {
            version: version.clone(),
            at: Utc::now(),
        });

        match action {
            UserAction::Details => {
                self.emit(Event::DetailsRequested {
                    version,
                    at: Utc::now(),
                });
                self.arm(self.config.timing.cadence_ms);
            }
            UserAction::Snooze(duration_ms) => {
                let until = now.saturating_add(duration_ms);
                self.store.snooze(&version, until);
                self.emit(Event::ReminderSnoozed {
                    version,
                    until_ms: until,
                    at: Utc::now(),
                });
                self.arm(duration_ms);
            }
            UserAction::Skip => {
                self.store.dismiss(&version);
                self.emit(Event::VersionDismissed {
                    version,
                    at: Utc::now(),
                });
                // Terminal for this version; nothing to wake up for.
            }
            UserAction::Close | UserAction::AutoDismiss => {
                self.arm(self.config.timing.cadence_ms);
            }
        }
    }

    fn refresh_feed(&mut self) {
        if let Some(feed) = &self.feed {
            self.latest_feed = feed.read();
        }
    }

    async fn check_remote(&mut self) {
        let Some(remote) = &self.remote else {
            return;
        };
        match remote.check().await {
            Ok(update) => self.latest_remote = update,
            Err(e) => {
                // A failing source is "no candidate" for this pass.
                tracing::warn!(error = %e, "remote update check failed");
                self.latest_remote = None;
            }
        }
    }

    fn evaluate_and_apply(&mut self) {
        // Re-entrancy safety: the handle must be clear while evaluating.
        self.deadline = None;

        let now = now_ms();
        let candidate = resolve(
            self.mock.as_ref(),
            self.latest_feed.as_ref(),
            self.latest_remote.as_ref(),
            &mut self.ledger,
            now,
        );
        self.note_candidate(candidate.as_ref());

        let evaluation = evaluate(
            candidate.as_ref(),
            self.store.state(),
            &self.ledger,
            self.signals.sample(),
            &self.config.timing,
            now,
        );
        tracing::debug!(
            visible = evaluation.visible,
            notify = evaluation.notify.is_some(),
            reschedule_ms = ?evaluation.reschedule,
            "evaluated reminder"
        );

        if let Some(intent) = &evaluation.notify {
            if self.notifier.deliver(intent) {
                self.store.mark_notified(&intent.version, now);
                self.emit(Event::NotificationSent {
                    version: intent.version.clone(),
                    at: Utc::now(),
                });
            }
        }

        self.apply_visibility(&evaluation, candidate.as_ref(), now);

        if let Some(delay) = evaluation.reschedule {
            self.arm(delay);
        }
    }

    fn apply_visibility(
        &mut self,
        evaluation: &Evaluation,
        candidate: Option<&ReminderCandidate>,
        now: u64,
    ) {
        if evaluation.visible {
            let Some(candidate) = candidate else {
                return; // Visible implies a candidate; defensive.
            };
            if self.display.version() == Some(candidate.version.as_str()) {
                return;
            }
            self.store.mark_shown(&candidate.version, now);
            self.display = DisplayState::Visible {
                version: candidate.version.clone(),
                since_ms: now,
            };
            self.emit(Event::ReminderShown {
                version: candidate.version.clone(),
                style: self.store.state().preferred_style,
                title: candidate.title.clone(),
                snippet: candidate.snippet(),
                at: Utc::now(),
            });
            return;
        }

        // A visible reminder is taken down by user actions, not by the
        // evaluator: mark-shown makes every follow-up evaluation report
        // cadence-ineligible while the banner is still on screen. Only
        // hard suppressors pull it down from here.
        if let DisplayState::Visible { version, .. } = &self.display {
            let state = self.store.state();
            let keep = candidate.is_some_and(|c| c.version == *version)
                && !state.is_dismissed(version)
                && state
                    .snoozed_until(version)
                    .map_or(true, |until| until <= now)
                && state.manual_pause_until <= now;
            if !keep {
                let version = version.clone();
                self.display = DisplayState::Hidden;
                self.emit(Event::ReminderHidden {
                    version,
                    at: Utc::now(),
                });
            }
        }
    }

    fn note_candidate(&mut self, candidate: Option<&ReminderCandidate>) {
        let key = candidate.map(|c| c.detection_key.clone());
        if key == self.active_key {
            return;
        }
        match candidate {
            Some(c) => self.emit(Event::CandidateDetected {
                version: c.version.clone(),
                source: c.source,
                at: Utc::now(),
            }),
            None => {
                if self.active_key.is_some() {
                    self.emit(Event::CandidateCleared { at: Utc::now() });
                }
            }
        }
        self.active_key = key;
    }

    /// Arm the single pending deadline, flooring the delay to the
    /// minimum reschedule quantum so oscillating inputs cannot spin the
    /// loop.
    fn arm(&mut self, delay_ms: u64) {
        let floored = delay_ms.max(self.config.timing.min_reschedule_ms);
        self.deadline = Some(Instant::now() + Duration::from_millis(floored));
    }

    fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event);
    }
}
