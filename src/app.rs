use crate::config::Config;
use crate::effects::{
    DesktopNotifier, Effects, LogSurface, StatusFile, StatusSurface, ThemeSounds,
};
use crate::services::{TimerController, TimerHandle};
use crate::store::{NOTIFICATION_SETTINGS_KEY, SettingsStore, VIEW_SETTINGS_KEY};
use crate::terminal::TerminalWindow;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct App {
    controller: TimerController,
    timer: TimerHandle,
    window: TerminalWindow,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let (window_tx, window_rx) = mpsc::unbounded_channel();

        let effects = Effects {
            notifier: Arc::new(DesktopNotifier::new(&config.app_name, window_tx)),
            sounds: Arc::new(ThemeSounds::freedesktop()),
            surface: Self::status_surface(&config),
        };

        let store = SettingsStore::new(Config::settings_path()?, NOTIFICATION_SETTINGS_KEY);
        let (controller, timer) =
            TimerController::new(store, effects, config.controller_options());

        let window_store = SettingsStore::new(Config::view_settings_path()?, VIEW_SETTINGS_KEY);
        let window = TerminalWindow::new(
            &config.app_name,
            config.quick_presets.clone(),
            timer.clone(),
            window_store,
            window_rx,
        );

        tracing::info!("Ready! Type `help` for commands");

        Ok(Self {
            controller,
            timer,
            window,
        })
    }

    fn status_surface(config: &Config) -> Arc<dyn StatusSurface> {
        match &config.status_file {
            Some(path) => {
                let surface = StatusFile::new(path);
                tracing::info!("Writing status label to {:?}", surface.path());
                Arc::new(surface)
            }
            None => {
                tracing::info!("No status file configured, logging the label instead");
                Arc::new(LogSurface)
            }
        }
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            controller,
            timer,
            window,
        } = self;

        let controller = tokio::spawn(controller.run());

        tokio::select! {
            result = window.run() => {
                if let Err(e) = result {
                    tracing::error!("Timer window failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        }

        if let Err(e) = timer.shutdown().await {
            tracing::warn!("Timer controller already stopped: {}", e);
        }
        if let Err(e) = controller.await {
            tracing::error!("Timer controller task failed: {}", e);
        }

        Ok(())
    }
}
