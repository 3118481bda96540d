use anyhow::{Context, Result};
use async_trait::async_trait;
use rodio::OutputStreamBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const THEME_DIR: &str = "/usr/share/sounds/freedesktop/stereo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Start,
    Pause,
    Complete,
}

/// Abstraction for playing a short cue per timer event
#[async_trait]
pub trait CuePlayer: Send + Sync {
    async fn play(&self, cue: SoundCue) -> Result<()>;
}

/// Plays cues from the freedesktop sound theme through rodio
pub struct ThemeSounds {
    paths: HashMap<SoundCue, PathBuf>,
}

impl ThemeSounds {
    pub fn new(paths: HashMap<SoundCue, PathBuf>) -> Self {
        Self { paths }
    }

    pub fn freedesktop() -> Self {
        let theme = Path::new(THEME_DIR);
        Self::new(HashMap::from([
            (SoundCue::Start, theme.join("bell.oga")),
            (SoundCue::Pause, theme.join("message.oga")),
            (SoundCue::Complete, theme.join("complete.oga")),
        ]))
    }

    pub fn path_for(&self, cue: SoundCue) -> Option<&Path> {
        self.paths.get(&cue).map(PathBuf::as_path)
    }
}

#[async_trait]
impl CuePlayer for ThemeSounds {
    async fn play(&self, cue: SoundCue) -> Result<()> {
        let path = self
            .path_for(cue)
            .with_context(|| format!("No sound configured for {:?}", cue))?
            .to_path_buf();

        tokio::task::spawn_blocking(move || play_sound_blocking(&path))
            .await
            .context("Sound playback task panicked")?
    }
}

fn play_sound_blocking(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open sound {:?}", path))?;

    let stream_handle = OutputStreamBuilder::open_default_stream()
        .map_err(|e| anyhow::anyhow!("Failed to open audio stream: {}", e))?;
    let sink = rodio::play(stream_handle.mixer(), BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to play {:?}: {}", path, e))?;
    sink.sleep_until_end();

    Ok(())
}
