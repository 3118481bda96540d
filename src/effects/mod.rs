//! Platform collaborators the timer controller announces through
//!
//! Each collaborator sits behind a small trait so the controller can be
//! driven with recording fakes in tests. Failures are reported back as
//! errors and the caller decides to log and move on.

pub mod notify;
pub mod sound;
pub mod surface;

pub use notify::{DesktopNotifier, NotificationBackend, NotificationRequest};
pub use sound::{CuePlayer, SoundCue, ThemeSounds};
pub use surface::{LogSurface, StatusFile, StatusSurface};

use std::sync::Arc;

/// The set of collaborators handed to the controller
#[derive(Clone)]
pub struct Effects {
    pub notifier: Arc<dyn NotificationBackend>,
    pub sounds: Arc<dyn CuePlayer>,
    pub surface: Arc<dyn StatusSurface>,
}

#[cfg(test)]
pub mod testing {
    //! Recording fakes for the collaborator traits

    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct Recorded {
        pub notifications: Mutex<Vec<NotificationRequest>>,
        pub cues: Mutex<Vec<SoundCue>>,
        pub labels: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl Recorded {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn titles(&self) -> Vec<String> {
            self.notifications
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.title.clone())
                .collect()
        }

        pub fn cues(&self) -> Vec<SoundCue> {
            self.cues.lock().unwrap().clone()
        }

        pub fn labels(&self) -> Vec<String> {
            self.labels.lock().unwrap().clone()
        }

        pub fn last_label(&self) -> Option<String> {
            self.labels.lock().unwrap().last().cloned()
        }
    }

    pub struct Fake(pub Arc<Recorded>);

    #[async_trait]
    impl NotificationBackend for Fake {
        async fn present(&self, request: NotificationRequest) -> Result<()> {
            self.0.notifications.lock().unwrap().push(request);
            if self.0.fail {
                anyhow::bail!("notification service unavailable");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CuePlayer for Fake {
        async fn play(&self, cue: SoundCue) -> Result<()> {
            self.0.cues.lock().unwrap().push(cue);
            if self.0.fail {
                anyhow::bail!("no audio device");
            }
            Ok(())
        }
    }

    impl StatusSurface for Fake {
        fn set_label(&self, label: &str) -> Result<()> {
            self.0.labels.lock().unwrap().push(label.to_string());
            if self.0.fail {
                anyhow::bail!("status file not writable");
            }
            Ok(())
        }
    }

    pub fn recording_effects(recorded: &Arc<Recorded>) -> Effects {
        Effects {
            notifier: Arc::new(Fake(Arc::clone(recorded))),
            sounds: Arc::new(Fake(Arc::clone(recorded))),
            surface: Arc::new(Fake(Arc::clone(recorded))),
        }
    }
}
