//! Terminal rendition of the timer window

use anyhow::Result;
use std::io::{BufRead, Write};
use tokio::sync::{broadcast, mpsc};

use crate::format::format_compact;
use crate::input::{HELP, InputParser, ViewInput};
use crate::messages::{NotificationSettings, TimerPhase, WindowRequest};
use crate::services::TimerHandle;
use crate::store::SettingsStore;
use crate::view::{TimerView, ViewAction, ViewModel};

const PROGRESS_WIDTH: usize = 24;

pub struct TerminalWindow {
    title: String,
    view: TimerView,
    timer: TimerHandle,
    store: SettingsStore,
    parser: InputParser,
    window_rx: mpsc::UnboundedReceiver<WindowRequest>,
    visible: bool,
}

impl TerminalWindow {
    pub fn new(
        title: impl Into<String>,
        presets: Vec<u64>,
        timer: TimerHandle,
        store: SettingsStore,
        window_rx: mpsc::UnboundedReceiver<WindowRequest>,
    ) -> Self {
        Self {
            title: title.into(),
            view: TimerView::new(presets),
            timer,
            store,
            parser: InputParser::new(),
            window_rx,
            visible: true,
        }
    }

    /// Run until the user quits or stdin closes
    pub async fn run(mut self) -> Result<()> {
        let mut updates = self.timer.subscribe();
        let mut lines = spawn_stdin_reader();

        self.activate().await?;
        self.draw();

        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => {
                        if !self.handle_line(&line).await? {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("Input closed");
                        break;
                    }
                },

                update = updates.recv() => match update {
                    Ok(state) => {
                        self.view.apply_snapshot(state);
                        self.draw_status();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Window missed {} snapshots, resyncing", skipped);
                        let state = self.timer.query_state().await?;
                        self.view.apply_snapshot(state);
                        self.draw_status();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Timer controller gone");
                        break;
                    }
                },

                Some(request) = self.window_rx.recv() => {
                    self.handle_window(request);
                }
            }
        }

        Ok(())
    }

    /// Load local toggles and the current state on open
    async fn activate(&mut self) -> Result<()> {
        match self.store.load::<NotificationSettings>() {
            Ok(Some(settings)) => {
                tracing::info!("Restoring window settings from {:?}", self.store.path());
                let actions = self.view.restore_settings(settings);
                self.perform(actions).await?;
            }
            Ok(None) => {
                let settings = self.timer.notification_settings().await?;
                self.view.show_settings(settings);
            }
            Err(e) => {
                tracing::warn!("Failed to load window settings: {}", e);
                let settings = self.timer.notification_settings().await?;
                self.view.show_settings(settings);
            }
        }

        let actions = self.view.activate();
        self.perform(actions).await
    }

    /// Returns `false` when the user asked to quit
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let input = match self.parser.parse(line) {
            Ok(input) => input,
            Err(e) => {
                if self.visible {
                    println!("{}", e);
                }
                return Ok(true);
            }
        };

        let actions = match input {
            ViewInput::Edit(field, value) => {
                self.view.edit(field, value);
                Vec::new()
            }
            ViewInput::SetDuration(seconds) => {
                self.view.set_draft_seconds(seconds);
                Vec::new()
            }
            ViewInput::Commit | ViewInput::Start => self.view.commit(),
            ViewInput::Stop => self.view.stop(),
            ViewInput::Toggle => self.view.toggle(),
            ViewInput::Reset => self.view.reset(),
            ViewInput::Quick(index) => {
                if !self.view.quick_select(index) && self.visible {
                    println!("No preset {}", index + 1);
                }
                Vec::new()
            }
            ViewInput::Sound(enabled) => self.view.set_sound_notifications(enabled),
            ViewInput::Visual(enabled) => self.view.set_visual_notifications(enabled),
            ViewInput::Window(request) => {
                self.handle_window(request);
                return Ok(true);
            }
            ViewInput::Help => {
                if self.visible {
                    println!("{}", HELP);
                }
                return Ok(true);
            }
            ViewInput::Quit => return Ok(false),
        };

        self.perform(actions).await?;
        self.draw();
        Ok(true)
    }

    async fn perform(&mut self, actions: Vec<ViewAction>) -> Result<()> {
        for action in actions {
            match action {
                ViewAction::Send(request) => {
                    if let Some(state) = self.timer.dispatch(request).await? {
                        self.view.apply_snapshot(state);
                    }
                }
                ViewAction::Persist(settings) => {
                    if let Err(e) = self.store.save(&settings) {
                        tracing::warn!("Failed to save window settings: {}", e);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_window(&mut self, request: WindowRequest) {
        self.visible = match request {
            WindowRequest::Show => true,
            WindowRequest::Hide => false,
            WindowRequest::Toggle => !self.visible,
        };
        tracing::debug!("Window visible: {}", self.visible);
        self.draw();
    }

    fn draw(&self) {
        if self.visible {
            println!("{}", render_panel(&self.title, &self.view.render()));
        }
    }

    fn draw_status(&self) {
        if self.visible {
            print!("\r\x1b[2K{}", render_status(&self.view.render()));
            if let Err(e) = std::io::stdout().flush() {
                tracing::debug!("Failed to flush status line: {}", e);
            }
        }
    }
}

/// Forward stdin lines from a dedicated thread
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(PROGRESS_WIDTH - filled))
}

fn phase_label(phase: TimerPhase) -> &'static str {
    match phase {
        TimerPhase::Idle => "idle",
        TimerPhase::Configured => "paused",
        TimerPhase::Running => "running",
        TimerPhase::Finished => "finished",
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// One-line countdown shown between full redraws
pub fn render_status(model: &ViewModel) -> String {
    format!(
        "{} {} {:>3.0}% ({})",
        model.time_label,
        progress_bar(model.progress_percent),
        model.progress_percent,
        phase_label(model.phase)
    )
}

pub fn render_panel(title: &str, model: &ViewModel) -> String {
    let mut lines = vec![
        format!("== {} ==", title),
        format!("  {}", render_status(model)),
    ];

    let draft = model.draft;
    let lock = if model.inputs_disabled { " (locked)" } else { "" };
    lines.push(format!(
        "  Duration: {}h {:02}m {:02}s{}",
        draft.hours, draft.minutes, draft.seconds, lock
    ));

    if let Some(message) = &model.validation_message {
        lines.push(format!("  ! {}", message));
    }

    let presets: Vec<String> = model
        .presets
        .iter()
        .enumerate()
        .map(|(i, &seconds)| format!("{}) {}", i + 1, format_compact(seconds)))
        .collect();
    if !presets.is_empty() {
        lines.push(format!("  Quick: {}", presets.join("  ")));
    }

    lines.push(format!(
        "  [{}]  reset  |  sound: {}  visual: {}",
        model.toggle_label,
        on_off(model.settings.sound_notifications),
        on_off(model.settings.visual_notifications)
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{Recorded, recording_effects};
    use crate::messages::TimerState;
    use crate::services::{ControllerOptions, TimerController};
    use crate::store::{NOTIFICATION_SETTINGS_KEY, VIEW_SETTINGS_KEY};
    use crate::view::DraftField;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        window: TerminalWindow,
        timer: TimerHandle,
        dir: TempDir,
    }

    fn view_store(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("view-settings.json"), VIEW_SETTINGS_KEY)
    }

    fn spawn_window(dir: TempDir) -> Fixture {
        let recorded = Arc::new(Recorded::default());
        let store = SettingsStore::new(dir.path().join("settings.json"), NOTIFICATION_SETTINGS_KEY);
        let (controller, timer) = TimerController::new(
            store,
            recording_effects(&recorded),
            ControllerOptions::default(),
        );
        tokio::spawn(controller.run());

        let (_window_tx, window_rx) = mpsc::unbounded_channel();
        let window = TerminalWindow::new(
            "Chronos",
            vec![300, 1500],
            timer.clone(),
            view_store(&dir),
            window_rx,
        );

        Fixture { window, timer, dir }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_forwards_saved_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let saved = NotificationSettings {
            sound_notifications: false,
            visual_notifications: true,
        };
        view_store(&dir).save(&saved).unwrap();

        let mut fx = spawn_window(dir);
        fx.window.activate().await.unwrap();

        assert_eq!(fx.window.view.settings(), saved);
        assert_eq!(fx.timer.notification_settings().await.unwrap(), saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_without_saved_toggles_shows_controller_settings() {
        let dir = tempfile::tempdir().unwrap();
        let controller_settings = NotificationSettings {
            sound_notifications: true,
            visual_notifications: false,
        };
        SettingsStore::new(dir.path().join("settings.json"), NOTIFICATION_SETTINGS_KEY)
            .save(&controller_settings)
            .unwrap();

        let mut fx = spawn_window(dir);
        fx.window.activate().await.unwrap();

        assert_eq!(fx.window.view.settings(), controller_settings);
        assert!(!fx.dir.path().join("view-settings.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_applies_current_state() {
        let mut fx = spawn_window(tempfile::tempdir().unwrap());
        fx.timer.start(60).await.unwrap();

        fx.window.activate().await.unwrap();

        assert_eq!(
            fx.window.view.state(),
            TimerState {
                is_running: true,
                time_remaining: 60,
                total_time: 60,
            }
        );
        assert!(fx.window.view.render().inputs_disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_change_is_saved_and_forwarded() {
        let mut fx = spawn_window(tempfile::tempdir().unwrap());
        fx.window.activate().await.unwrap();

        assert!(fx.window.handle_line("sound off").await.unwrap());

        let expected = NotificationSettings {
            sound_notifications: false,
            visual_notifications: true,
        };
        assert_eq!(
            view_store(&fx.dir).load::<NotificationSettings>().unwrap(),
            Some(expected)
        );
        assert_eq!(fx.timer.notification_settings().await.unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_then_enter_starts_timer() {
        let mut fx = spawn_window(tempfile::tempdir().unwrap());
        fx.window.activate().await.unwrap();

        fx.window.handle_line("25m").await.unwrap();
        fx.window.handle_line("").await.unwrap();

        assert_eq!(
            fx.timer.query_state().await.unwrap(),
            TimerState {
                is_running: true,
                time_remaining: 1500,
                total_time: 1500,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_duration_never_reaches_controller() {
        let mut fx = spawn_window(tempfile::tempdir().unwrap());
        fx.window.activate().await.unwrap();

        fx.window.handle_line("7h").await.unwrap();
        fx.window.handle_line("").await.unwrap();

        assert_eq!(fx.timer.query_state().await.unwrap(), TimerState::idle());
        assert_eq!(
            fx.window.view.validation_message(),
            Some("Maximum timer duration is 6 hours")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_commands_and_quit() {
        let mut fx = spawn_window(tempfile::tempdir().unwrap());

        assert!(fx.window.handle_line("hide").await.unwrap());
        assert!(!fx.window.visible);
        assert!(fx.window.handle_line("help").await.unwrap());
        assert!(fx.window.handle_line("quick 9").await.unwrap());
        assert!(fx.window.handle_line("window").await.unwrap());
        assert!(fx.window.visible);
        assert!(fx.window.handle_line("bogus input").await.unwrap());

        assert!(!fx.window.handle_line("quit").await.unwrap());
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), format!("[{}]", ".".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(50.0).matches('#').count(), PROGRESS_WIDTH / 2);
    }

    #[test]
    fn test_panel_shows_running_countdown() {
        let mut view = TimerView::new(vec![300, 1500]);
        view.apply_snapshot(TimerState {
            is_running: true,
            time_remaining: 90,
            total_time: 120,
        });

        let panel = render_panel("Chronos", &view.render());

        assert!(panel.starts_with("== Chronos =="));
        assert!(panel.contains("01:30"));
        assert!(panel.contains(" 25% (running)"));
        assert!(panel.contains("(locked)"));
        assert!(panel.contains("1) 5:00  2) 25:00"));
        assert!(panel.contains("[Stop]"));
    }

    #[test]
    fn test_panel_shows_validation_and_toggles() {
        let mut view = TimerView::new(Vec::new());
        view.edit(DraftField::Minutes, 0);
        view.edit(DraftField::Seconds, 10);
        view.set_visual_notifications(false);

        let panel = render_panel("Chronos", &view.render());

        assert!(panel.contains("Duration: 0h 00m 10s"));
        assert!(panel.contains("! Minimum: 30 seconds"));
        assert!(panel.contains("sound: on  visual: off"));
        assert!(!panel.contains("Quick:"));
    }
}
