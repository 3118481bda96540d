use crate::effects::{Effects, NotificationRequest, SoundCue};
use crate::format::{FLASH_GLYPHS, FLASH_STEPS, IDLE_GLYPH, format_compact};
use crate::messages::{
    NotificationSettings, NotificationSettingsPatch, Request, TimerCommand, TimerState,
};
use crate::schedule::{self, ScheduleHandle};
use crate::store::SettingsStore;
use crate::timer::{TickSchedule, TimerEvent, TimerMachine, Transition};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Timing knobs for side effects
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub notification_timeout: Duration,
    pub flash_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            notification_timeout: Duration::from_secs(5),
            flash_interval: Duration::from_millis(500),
        }
    }
}

/// Messages from the controller's own schedules, tagged with the schedule
/// generation so deliveries queued before a cancel are ignored
#[derive(Debug, Clone, Copy)]
enum Internal {
    Tick(u64),
    Flash(u64),
}

/// Owns the countdown and everything it triggers
///
/// This service:
/// - Is the only writer of the timer state
/// - Runs the once-per-second tick schedule while a countdown is running
/// - Broadcasts a snapshot after every command and tick
/// - Announces start, pause and completion through the effects
/// - Keeps and persists the notification settings
pub struct TimerController {
    machine: TimerMachine,
    settings: NotificationSettings,
    store: SettingsStore,
    effects: Effects,
    options: ControllerOptions,
    cmd_rx: mpsc::Receiver<TimerCommand>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    updates_tx: broadcast::Sender<TimerState>,
    ticks: ScheduleHandle,
    tick_generation: u64,
    flash: ScheduleHandle,
    flash_generation: u64,
    flash_step: u32,
}

impl TimerController {
    pub fn new(
        store: SettingsStore,
        effects: Effects,
        options: ControllerOptions,
    ) -> (Self, TimerHandle) {
        let settings = match store.load::<NotificationSettings>() {
            Ok(Some(settings)) => {
                tracing::info!("Loaded notification settings: {:?}", settings);
                settings
            }
            Ok(None) => NotificationSettings::default(),
            Err(e) => {
                tracing::warn!("Failed to load notification settings, using defaults: {}", e);
                NotificationSettings::default()
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (updates_tx, _) = broadcast::channel(64);

        let handle = TimerHandle {
            tx: cmd_tx,
            updates_tx: updates_tx.clone(),
        };

        let controller = Self {
            machine: TimerMachine::new(),
            settings,
            store,
            effects,
            options,
            cmd_rx,
            internal_tx,
            internal_rx,
            updates_tx,
            ticks: ScheduleHandle::inactive(),
            tick_generation: 0,
            flash: ScheduleHandle::inactive(),
            flash_generation: 0,
            flash_step: 0,
        };

        (controller, handle)
    }

    pub async fn run(mut self) {
        self.set_label(IDLE_GLYPH);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("All timer handles dropped");
                        self.teardown();
                        break;
                    }
                },

                Some(internal) = self.internal_rx.recv() => {
                    self.handle_internal(internal);
                }
            }
        }

        tracing::info!("Timer controller stopped");
    }

    /// Returns `false` once the controller should exit
    fn handle_command(&mut self, cmd: TimerCommand) -> bool {
        match cmd {
            TimerCommand::Start(seconds) => {
                if seconds == 0 {
                    tracing::warn!("Ignoring start with a zero duration");
                } else {
                    let transition = self.machine.start(seconds);
                    if transition.is_noop() {
                        tracing::debug!("Timer already running, ignoring start");
                    } else {
                        tracing::info!("Timer started for {}s", seconds);
                        self.cancel_flash();
                        self.set_label(&format_compact(seconds));
                        self.apply(transition);
                    }
                }
                self.broadcast();
            }

            TimerCommand::Stop => {
                let transition = self.machine.stop();
                if !transition.is_noop() {
                    tracing::info!(
                        "Timer stopped with {}s remaining",
                        self.machine.state().time_remaining
                    );
                    self.set_label(IDLE_GLYPH);
                    self.apply(transition);
                }
                self.broadcast();
            }

            TimerCommand::Reset => {
                let transition = self.machine.reset();
                tracing::info!("Timer reset");
                self.set_label(IDLE_GLYPH);
                self.apply(transition);
                self.broadcast();
            }

            TimerCommand::QueryState(reply) => {
                let _ = reply.send(self.machine.state());
            }

            TimerCommand::QuerySettings(reply) => {
                let _ = reply.send(self.settings);
            }

            TimerCommand::UpdateNotificationSettings(patch) => {
                self.settings.merge(patch);
                tracing::info!("Notification settings now {:?}", self.settings);
                if let Err(e) = self.store.save(&self.settings) {
                    tracing::warn!("Failed to persist notification settings: {}", e);
                }
            }

            TimerCommand::Shutdown(reply) => {
                self.teardown();
                let _ = reply.send(());
                return false;
            }
        }

        true
    }

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Tick(generation) if generation == self.tick_generation => {
                let transition = self.machine.tick();
                let state = self.machine.state();
                tracing::debug!("Tick: {}s remaining", state.time_remaining);

                self.set_label(&format_compact(state.time_remaining));
                self.apply(transition);
                self.broadcast();
            }

            Internal::Flash(generation) if generation == self.flash_generation => {
                if self.flash_step >= FLASH_STEPS {
                    self.cancel_flash();
                    self.set_label(IDLE_GLYPH);
                } else {
                    let glyph = FLASH_GLYPHS[(self.flash_step % 2) as usize];
                    self.flash_step += 1;
                    self.set_label(glyph);
                }
            }

            stale => tracing::debug!("Ignoring stale schedule message {:?}", stale),
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition.ticks {
            TickSchedule::Begin => {
                self.tick_generation += 1;
                self.ticks = schedule::every(
                    TICK_PERIOD,
                    self.internal_tx.clone(),
                    Internal::Tick(self.tick_generation),
                );
            }
            TickSchedule::Cancel => self.cancel_ticks(),
            TickSchedule::Keep => {}
        }

        if let Some(event) = transition.event {
            self.announce(event);
        }
    }

    fn announce(&mut self, event: TimerEvent) {
        let state = self.machine.state();
        tracing::info!("Announcing {:?}", event);

        if self.settings.visual_notifications {
            let request =
                NotificationRequest::for_event(event, &state, self.options.notification_timeout);
            let notifier = Arc::clone(&self.effects.notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.present(request).await {
                    tracing::warn!("Failed to show {:?} notification: {}", event, e);
                }
            });
        }

        if self.settings.sound_notifications {
            let cue = match event {
                TimerEvent::Started => SoundCue::Start,
                TimerEvent::Paused => SoundCue::Pause,
                TimerEvent::Completed => SoundCue::Complete,
            };
            let sounds = Arc::clone(&self.effects.sounds);
            tokio::spawn(async move {
                if let Err(e) = sounds.play(cue).await {
                    tracing::warn!("Failed to play {:?} sound: {}", cue, e);
                }
            });
        }

        if event == TimerEvent::Completed {
            self.begin_flash();
        }
    }

    fn begin_flash(&mut self) {
        self.flash_generation += 1;
        self.flash_step = 0;
        self.flash = schedule::every(
            self.options.flash_interval,
            self.internal_tx.clone(),
            Internal::Flash(self.flash_generation),
        );
    }

    fn cancel_ticks(&mut self) {
        self.ticks.cancel();
        self.tick_generation += 1;
    }

    fn cancel_flash(&mut self) {
        self.flash.cancel();
        self.flash_generation += 1;
        self.flash_step = 0;
    }

    fn set_label(&self, label: &str) {
        if let Err(e) = self.effects.surface.set_label(label) {
            tracing::warn!("Failed to update status label: {}", e);
        }
    }

    fn broadcast(&self) {
        let state = self.machine.state();
        match self.updates_tx.send(state) {
            Ok(receivers) => tracing::debug!("Broadcast {:?} to {} views", state, receivers),
            Err(_) => tracing::debug!("No views listening, dropping snapshot"),
        }
    }

    fn teardown(&mut self) {
        if self.ticks.is_active() {
            tracing::info!("Cancelling running countdown");
        }
        self.cancel_ticks();
        self.cancel_flash();
        self.set_label(IDLE_GLYPH);
    }
}

/// Handle for communicating with the TimerController
#[derive(Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<TimerCommand>,
    updates_tx: broadcast::Sender<TimerState>,
}

impl TimerHandle {
    /// Receive every snapshot broadcast from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TimerState> {
        self.updates_tx.subscribe()
    }

    pub async fn start(&self, seconds: u64) -> Result<()> {
        self.send(TimerCommand::Start(seconds), "start").await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(TimerCommand::Stop, "stop").await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(TimerCommand::Reset, "reset").await
    }

    pub async fn update_notification_settings(&self, patch: NotificationSettingsPatch) -> Result<()> {
        self.send(TimerCommand::UpdateNotificationSettings(patch), "settings")
            .await
    }

    pub async fn query_state(&self) -> Result<TimerState> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::QueryState(reply), "query").await?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive timer state: {}", e))
    }

    pub async fn notification_settings(&self) -> Result<NotificationSettings> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::QuerySettings(reply), "settings query")
            .await?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive notification settings: {}", e))
    }

    /// Forward a view request; a state query yields the reply
    pub async fn dispatch(&self, request: Request) -> Result<Option<TimerState>> {
        match request {
            Request::Start { seconds } => self.start(seconds).await?,
            Request::Stop => self.stop().await?,
            Request::Reset => self.reset().await?,
            Request::QueryState => return self.query_state().await.map(Some),
            Request::UpdateNotificationSettings { settings } => {
                self.update_notification_settings(settings).await?
            }
        }
        Ok(None)
    }

    /// Stop the controller, cancelling any running schedule
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Shutdown(reply), "shutdown").await?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive shutdown confirmation: {}", e))
    }

    async fn send(&self, cmd: TimerCommand, name: &str) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send {} command: {}", name, e))
    }
}
