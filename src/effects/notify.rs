use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::format::format_compact;
use crate::messages::{TimerState, WindowRequest};
use crate::timer::TimerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

/// One desktop notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    /// `None` keeps the notification up until the user dismisses it
    pub auto_dismiss: Option<Duration>,
    /// Bring the timer window back when the notification is activated
    pub reopen_view: bool,
}

impl NotificationRequest {
    /// Build the notification announcing `event` for the given snapshot
    pub fn for_event(event: TimerEvent, state: &TimerState, auto_dismiss: Duration) -> Self {
        match event {
            TimerEvent::Started => Self {
                title: "Timer Started".to_string(),
                body: format!(
                    "{} timer is now running.",
                    format_compact(state.total_time)
                ),
                urgency: Urgency::Normal,
                auto_dismiss: Some(auto_dismiss),
                reopen_view: false,
            },
            TimerEvent::Paused => Self {
                title: "Timer Stopped".to_string(),
                body: format!(
                    "Timer paused with {} remaining.",
                    format_compact(state.time_remaining)
                ),
                urgency: Urgency::Normal,
                auto_dismiss: Some(auto_dismiss),
                reopen_view: false,
            },
            TimerEvent::Completed => Self {
                title: "Timer Complete!".to_string(),
                body: format!(
                    "Your {} timer has finished.",
                    format_compact(state.total_time)
                ),
                urgency: Urgency::Critical,
                auto_dismiss: None,
                reopen_view: true,
            },
        }
    }
}

/// Abstraction for presenting notifications to the user
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// Returns once the notification is on screen
    async fn present(&self, request: NotificationRequest) -> Result<()>;
}

/// freedesktop notifications via notify-rust
pub struct DesktopNotifier {
    app_name: String,
    window_tx: mpsc::UnboundedSender<WindowRequest>,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>, window_tx: mpsc::UnboundedSender<WindowRequest>) -> Self {
        Self {
            app_name: app_name.into(),
            window_tx,
        }
    }
}

#[async_trait]
impl NotificationBackend for DesktopNotifier {
    async fn present(&self, request: NotificationRequest) -> Result<()> {
        let app_name = self.app_name.clone();
        let window_tx = self.window_tx.clone();
        let (shown_tx, shown_rx) = oneshot::channel();

        // A plain thread, not the blocking pool: waiting for activation can
        // last until the process exits.
        std::thread::spawn(move || match show_blocking(&app_name, &request) {
            Ok(handle) => {
                let _ = shown_tx.send(Ok(()));
                if request.reopen_view {
                    handle.wait_for_action(|action| {
                        tracing::debug!("Notification action: {}", action);
                        if action != "__closed" && window_tx.send(WindowRequest::Show).is_err() {
                            tracing::debug!("Timer window is gone, ignoring activation");
                        }
                    });
                }
            }
            Err(e) => {
                let _ = shown_tx.send(Err(e));
            }
        });

        shown_rx
            .await
            .context("Notification thread ended before showing")?
    }
}

fn show_blocking(
    app_name: &str,
    request: &NotificationRequest,
) -> Result<notify_rust::NotificationHandle> {
    let urgency = match request.urgency {
        Urgency::Normal => notify_rust::Urgency::Normal,
        Urgency::Critical => notify_rust::Urgency::Critical,
    };
    let timeout = match request.auto_dismiss {
        Some(after) => {
            notify_rust::Timeout::Milliseconds(after.as_millis().min(u32::MAX as u128) as u32)
        }
        None => notify_rust::Timeout::Never,
    };

    let mut notification = notify_rust::Notification::new();
    notification
        .appname(app_name)
        .summary(&request.title)
        .body(&request.body)
        .urgency(urgency)
        .timeout(timeout);
    if request.reopen_view {
        notification.action("default", "Open timer");
    }

    notification
        .show()
        .map_err(|e| anyhow::anyhow!("Failed to show notification: {}", e))
}
