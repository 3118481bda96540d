//! Timer window model
//!
//! Mirrors the last snapshot from the controller and owns the uncommitted
//! duration fields. Every input is a plain method that updates the model and
//! returns the actions the host has to carry out, so the model never touches a
//! channel or a file itself.

use crate::format::{format_padded, progress_percent};
use crate::messages::{NotificationSettings, Request, TimerPhase, TimerState};

pub const MIN_DURATION_SECS: u64 = 30;
pub const MAX_DURATION_SECS: u64 = 21_600;

const MAX_HOURS: u64 = 6;
const MAX_MINUTES: u64 = 59;
const MAX_SECONDS: u64 = 59;

/// Draft fields after a reset: 0h 5m 0s
const DEFAULT_DRAFT: Draft = Draft {
    hours: 0,
    minutes: 5,
    seconds: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Hours,
    Minutes,
    Seconds,
}

/// Uncommitted duration inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Draft {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Draft {
    /// Split into fields, clamping each into its input range
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: (total / 3600).min(MAX_HOURS),
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

/// Work the host performs on behalf of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Send(Request),
    /// Store the toggles in the window's local settings
    Persist(NotificationSettings),
}

/// Everything needed to draw the window
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub time_label: String,
    pub progress_percent: f64,
    pub toggle_label: &'static str,
    pub inputs_disabled: bool,
    pub phase: TimerPhase,
    pub draft: Draft,
    pub validation_message: Option<String>,
    pub settings: NotificationSettings,
    pub presets: Vec<u64>,
}

#[derive(Debug)]
pub struct TimerView {
    state: TimerState,
    draft: Draft,
    /// The last duration expression exceeded the hours field and was clamped
    draft_over_limit: bool,
    validation_message: Option<String>,
    settings: NotificationSettings,
    presets: Vec<u64>,
}

impl TimerView {
    pub fn new(presets: Vec<u64>) -> Self {
        Self {
            state: TimerState::idle(),
            draft: DEFAULT_DRAFT,
            draft_over_limit: false,
            validation_message: None,
            settings: NotificationSettings::default(),
            presets,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    pub fn settings(&self) -> NotificationSettings {
        self.settings
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    /// Requests to issue when the window is opened
    pub fn activate(&self) -> Vec<ViewAction> {
        vec![ViewAction::Send(Request::QueryState)]
    }

    /// Take toggles persisted by an earlier session and hand them to the controller
    pub fn restore_settings(&mut self, settings: NotificationSettings) -> Vec<ViewAction> {
        self.settings = settings;
        vec![ViewAction::Send(Request::UpdateNotificationSettings {
            settings: settings.into(),
        })]
    }

    /// Show the controller's settings without echoing them back
    pub fn show_settings(&mut self, settings: NotificationSettings) {
        self.settings = settings;
    }

    pub fn apply_snapshot(&mut self, state: TimerState) {
        self.state = state;

        if !state.is_running && state.time_remaining > 0 {
            self.set_draft_seconds(state.time_remaining);
        }
    }

    /// Change one draft field; ignored while the fields are disabled
    pub fn edit(&mut self, field: DraftField, value: i64) {
        if self.state.is_running {
            tracing::debug!("Duration fields are locked while running");
            return;
        }

        let value = value.max(0) as u64;
        self.draft_over_limit = false;
        match field {
            DraftField::Hours => self.draft.hours = value.min(MAX_HOURS),
            DraftField::Minutes => self.draft.minutes = value.min(MAX_MINUTES),
            DraftField::Seconds => self.draft.seconds = value.min(MAX_SECONDS),
        }
        self.validate_inputs();
    }

    /// Overwrite all draft fields from a duration in seconds
    pub fn set_draft_seconds(&mut self, total: u64) {
        self.draft = Draft::from_seconds(total);
        self.draft_over_limit = total > MAX_DURATION_SECS;
        self.validate_inputs();
    }

    /// Load the n-th quick-select preset into the draft without starting it
    pub fn quick_select(&mut self, index: usize) -> bool {
        match self.presets.get(index) {
            Some(&seconds) => {
                self.set_draft_seconds(seconds);
                true
            }
            None => false,
        }
    }

    /// Enter pressed: start the draft if it is a valid duration
    pub fn commit(&mut self) -> Vec<ViewAction> {
        if self.state.is_running {
            return Vec::new();
        }

        let total = self.draft.total_seconds();
        if total < MIN_DURATION_SECS {
            self.validation_message = Some("Minimum timer duration is 30 seconds".to_string());
            return Vec::new();
        }
        if total > MAX_DURATION_SECS || self.draft_over_limit {
            self.validation_message = Some("Maximum timer duration is 6 hours".to_string());
            return Vec::new();
        }

        self.validation_message = None;
        vec![ViewAction::Send(Request::Start { seconds: total })]
    }

    /// The start/stop button
    pub fn toggle(&mut self) -> Vec<ViewAction> {
        if self.state.is_running {
            self.stop()
        } else {
            self.commit()
        }
    }

    pub fn stop(&self) -> Vec<ViewAction> {
        vec![ViewAction::Send(Request::Stop)]
    }

    pub fn reset(&mut self) -> Vec<ViewAction> {
        self.draft = DEFAULT_DRAFT;
        self.draft_over_limit = false;
        self.validation_message = None;
        vec![ViewAction::Send(Request::Reset)]
    }

    pub fn set_sound_notifications(&mut self, enabled: bool) -> Vec<ViewAction> {
        self.settings.sound_notifications = enabled;
        self.settings_changed()
    }

    pub fn set_visual_notifications(&mut self, enabled: bool) -> Vec<ViewAction> {
        self.settings.visual_notifications = enabled;
        self.settings_changed()
    }

    pub fn render(&self) -> ViewModel {
        ViewModel {
            time_label: format_padded(self.state.time_remaining),
            progress_percent: progress_percent(self.state.total_time, self.state.time_remaining),
            toggle_label: if self.state.is_running { "Stop" } else { "Start" },
            inputs_disabled: self.state.is_running,
            phase: self.state.phase(),
            draft: self.draft,
            validation_message: self.validation_message.clone(),
            settings: self.settings,
            presets: self.presets.clone(),
        }
    }

    fn settings_changed(&self) -> Vec<ViewAction> {
        vec![
            ViewAction::Persist(self.settings),
            ViewAction::Send(Request::UpdateNotificationSettings {
                settings: self.settings.into(),
            }),
        ]
    }

    fn validate_inputs(&mut self) {
        let total = self.draft.total_seconds();

        self.validation_message = if total > 0 && total < MIN_DURATION_SECS {
            Some("Minimum: 30 seconds".to_string())
        } else if total > MAX_DURATION_SECS || self.draft_over_limit {
            Some("Maximum: 6 hours".to_string())
        } else {
            None
        };
    }
}
