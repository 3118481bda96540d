use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Snapshot of the countdown, broadcast to every view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub time_remaining: u64,
    pub total_time: u64,
}

/// Coarse lifecycle position derived from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Configured,
    Running,
    /// Countdown reached zero; `total_time` is kept for display until reset
    Finished,
}

impl TimerState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.time_remaining > 0 {
            TimerPhase::Configured
        } else if self.total_time > 0 {
            TimerPhase::Finished
        } else {
            TimerPhase::Idle
        }
    }
}

/// User-facing notification switches (persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default = "enabled")]
    pub sound_notifications: bool,
    #[serde(default = "enabled")]
    pub visual_notifications: bool,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound_notifications: true,
            visual_notifications: true,
        }
    }
}

impl NotificationSettings {
    pub fn merge(&mut self, patch: NotificationSettingsPatch) {
        if let Some(sound) = patch.sound_notifications {
            self.sound_notifications = sound;
        }
        if let Some(visual) = patch.visual_notifications {
            self.visual_notifications = visual;
        }
    }
}

/// Partial settings update; absent fields keep their current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_notifications: Option<bool>,
}

impl From<NotificationSettings> for NotificationSettingsPatch {
    fn from(settings: NotificationSettings) -> Self {
        Self {
            sound_notifications: Some(settings.sound_notifications),
            visual_notifications: Some(settings.visual_notifications),
        }
    }
}

/// Commands a view can issue, in their wire form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    Start { seconds: u64 },
    Stop,
    Reset,
    QueryState,
    UpdateNotificationSettings { settings: NotificationSettingsPatch },
}

/// Commands for the TimerController service
pub enum TimerCommand {
    Start(u64),
    Stop,
    Reset,
    QueryState(oneshot::Sender<TimerState>),
    QuerySettings(oneshot::Sender<NotificationSettings>),
    UpdateNotificationSettings(NotificationSettingsPatch),
    Shutdown(oneshot::Sender<()>),
}

/// Window chrome requests, delivered to the terminal window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    Show,
    Hide,
    Toggle,
}
