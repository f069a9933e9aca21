//! Background notification side channel.
//!
//! Used when the window is inactive and the in-app banner cannot be
//! seen. Best-effort and fully independent of the banner cadence: every
//! failure here is swallowed and logged.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::reminder::NotifyIntent;

/// What to do when the window is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundBehavior {
    /// Send an OS notification (requires permission).
    #[default]
    Notification,
    /// Request window attention (dock bounce / taskbar flash).
    Attention,
    /// Do nothing.
    None,
}

/// OS-level delivery primitive. Implemented by the host shell.
pub trait NotificationChannel: Send {
    /// Whether notification permission is granted. May prompt the user;
    /// callers invoke this at most once per process lifetime.
    fn permission_granted(&mut self) -> bool;

    /// Deliver an OS notification.
    fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Ask the window manager for attention instead.
    fn request_attention(&mut self) -> Result<(), NotifyError>;
}

/// Applies the configured background behavior to a notify intent,
/// caching the permission answer for the process lifetime.
pub struct BackgroundNotifier<C> {
    channel: C,
    behavior: BackgroundBehavior,
    permission: Option<bool>,
}

impl<C: NotificationChannel> BackgroundNotifier<C> {
    pub fn new(channel: C, behavior: BackgroundBehavior) -> Self {
        Self {
            channel,
            behavior,
            permission: None,
        }
    }

    /// Attempt delivery. Returns true only when the side channel
    /// actually fired; only then does the caller record the
    /// notification timestamp.
    pub fn deliver(&mut self, intent: &NotifyIntent) -> bool {
        match self.behavior {
            BackgroundBehavior::None => false,
            BackgroundBehavior::Attention => match self.channel.request_attention() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(version = %intent.version, error = %e, "attention request failed");
                    false
                }
            },
            BackgroundBehavior::Notification => {
                let granted = match self.permission {
                    Some(granted) => granted,
                    None => {
                        // Ask once per process lifetime.
                        let granted = self.channel.permission_granted();
                        self.permission = Some(granted);
                        granted
                    }
                };
                if !granted {
                    tracing::debug!(version = %intent.version, "notification permission not granted");
                    return false;
                }
                match self.channel.send(&intent.title, &intent.body) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(version = %intent.version, error = %e, "failed to send notification");
                        false
                    }
                }
            }
        }
    }
}

/// Prints notifications to the log instead of delivering them. Used by
/// the CLI `watch` command and in hosts without a notification plugin.
#[derive(Debug, Default)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
    fn permission_granted(&mut self) -> bool {
        true
    }

    fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(title, body, "background notification");
        Ok(())
    }

    fn request_attention(&mut self) -> Result<(), NotifyError> {
        tracing::info!("attention requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingChannel {
        granted: bool,
        permission_checks: u32,
        sent: Vec<(String, String)>,
        attention_requests: u32,
        fail_send: bool,
    }

    impl NotificationChannel for RecordingChannel {
        fn permission_granted(&mut self) -> bool {
            self.permission_checks += 1;
            self.granted
        }

        fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
            if self.fail_send {
                return Err(NotifyError::ChannelFailed("boom".into()));
            }
            self.sent.push((title.to_string(), body.to_string()));
            Ok(())
        }

        fn request_attention(&mut self) -> Result<(), NotifyError> {
            self.attention_requests += 1;
            Ok(())
        }
    }

    fn intent() -> NotifyIntent {
        NotifyIntent {
            version: "1.0.0".into(),
            title: "Update 1.0.0 available".into(),
            body: "A new version is ready to install.".into(),
        }
    }

    #[test]
    fn none_mode_never_delivers() {
        let mut notifier = BackgroundNotifier::new(
            RecordingChannel {
                granted: true,
                ..Default::default()
            },
            BackgroundBehavior::None,
        );
        assert!(!notifier.deliver(&intent()));
        assert!(notifier.channel.sent.is_empty());
    }

    #[test]
    fn permission_checked_once_per_process() {
        let mut notifier = BackgroundNotifier::new(
            RecordingChannel {
                granted: true,
                ..Default::default()
            },
            BackgroundBehavior::Notification,
        );
        assert!(notifier.deliver(&intent()));
        assert!(notifier.deliver(&intent()));
        assert_eq!(notifier.channel.permission_checks, 1);
        assert_eq!(notifier.channel.sent.len(), 2);
    }

    #[test]
    fn denied_permission_blocks_delivery() {
        let mut notifier = BackgroundNotifier::new(
            RecordingChannel::default(),
            BackgroundBehavior::Notification,
        );
        assert!(!notifier.deliver(&intent()));
        assert!(notifier.channel.sent.is_empty());
    }

    #[test]
    fn send_failure_is_swallowed() {
        let mut notifier = BackgroundNotifier::new(
            RecordingChannel {
                granted: true,
                fail_send: true,
                ..Default::default()
            },
            BackgroundBehavior::Notification,
        );
        assert!(!notifier.deliver(&intent()));
    }

    #[test]
    fn attention_mode_requests_attention() {
        let mut notifier = BackgroundNotifier::new(
            RecordingChannel::default(),
            BackgroundBehavior::Attention,
        );
        assert!(notifier.deliver(&intent()));
        assert_eq!(notifier.channel.attention_requests, 1);
        assert!(notifier.channel.sent.is_empty());
    }
}
