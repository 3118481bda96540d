use anyhow::Result;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tokio::sync::mpsc;

use crate::store::write_atomically;

/// The passive display: a short label shown in the menu bar
pub trait StatusSurface: Send + Sync {
    fn set_label(&self, label: &str) -> Result<()>;
}

/// Writes the label to a file a status bar can poll
///
/// waybar, polybar and i3blocks all support a custom module that `cat`s a file.
/// Labels are queued to a writer thread, which only writes the newest one
/// when several are pending. Dropping the surface flushes the queue.
pub struct StatusFile {
    path: PathBuf,
    tx: Option<mpsc::UnboundedSender<String>>,
    writer: Option<JoinHandle<()>>,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || write_labels(&writer_path, rx));

        Self {
            path,
            tx: Some(tx),
            writer: Some(writer),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSurface for StatusFile {
    fn set_label(&self, label: &str) -> Result<()> {
        self.tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Status file writer already stopped"))?
            .send(label.to_string())
            .map_err(|_| anyhow::anyhow!("Status file writer for {:?} stopped", self.path))
    }
}

impl Drop for StatusFile {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::warn!("Status file writer panicked");
            }
        }
    }
}

fn write_labels(path: &Path, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(mut label) = rx.blocking_recv() {
        while let Ok(newer) = rx.try_recv() {
            label = newer;
        }

        if let Err(e) = write_atomically(path, format!("{}\n", label).as_bytes()) {
            tracing::warn!("Failed to write status label to {:?}: {}", path, e);
        }
    }
}

/// Fallback when there is nowhere to write the label
pub struct LogSurface;

impl StatusSurface for LogSurface {
    fn set_label(&self, label: &str) -> Result<()> {
        tracing::debug!("Status label: {}", label);
        Ok(())
    }
}
