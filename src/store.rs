use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Key the controller keeps its notification settings under
pub const NOTIFICATION_SETTINGS_KEY: &str = "notificationSettings";

/// Key the view keeps its local copy of the toggles under
pub const VIEW_SETTINGS_KEY: &str = "chronos-notification-settings";

/// A JSON file holding one settings record under a fixed key
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the old one, so a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    key: &'static str,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, key: &'static str) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record, `None` if the file or the key does not exist yet
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let mut document = self.read_document()?;
        match document.remove(self.key) {
            Some(value) => {
                let record = serde_json::from_value(value).with_context(|| {
                    format!("Failed to parse '{}' in {:?}", self.key, self.path)
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Overwrite the record, keeping any other keys in the file
    pub fn save<T: Serialize>(&self, record: &T) -> Result<()> {
        let mut document = self.read_document().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable settings file {:?}: {}", self.path, e);
            Map::new()
        });
        let value = serde_json::to_value(record).context("Failed to serialize settings")?;
        document.insert(self.key.to_string(), value);

        let contents = serde_json::to_string_pretty(&Value::Object(document))
            .context("Failed to serialize settings")?;
        write_atomically(&self.path, contents.as_bytes())?;

        tracing::debug!("Saved '{}' to {:?}", self.key, self.path);
        Ok(())
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {:?}", self.path))?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {:?}", self.path))
    }
}

/// Replace `path` with `contents` via a sibling temp file
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {:?}", parent))?;

    let mut file = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write temp file for {:?}", path))?;
    file.persist(path)
        .with_context(|| format!("Failed to replace {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::NotificationSettings;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"), NOTIFICATION_SETTINGS_KEY);

        let loaded: Option<NotificationSettings> = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(
            dir.path().join("nested").join("settings.json"),
            NOTIFICATION_SETTINGS_KEY,
        );
        let settings = NotificationSettings {
            sound_notifications: false,
            visual_notifications: true,
        };

        store.save(&settings).unwrap();
        let loaded: Option<NotificationSettings> = store.load().unwrap();

        assert_eq!(loaded, Some(settings));
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"notificationSettings\""));
        assert!(raw.contains("\"soundNotifications\": false"));
    }

    #[test]
    fn test_save_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"windowBounds": {"x": 10}}"#).unwrap();

        let store = SettingsStore::new(&path, NOTIFICATION_SETTINGS_KEY);
        store.save(&NotificationSettings::default()).unwrap();

        let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["windowBounds"]["x"], 10);
        assert_eq!(document[NOTIFICATION_SETTINGS_KEY]["visualNotifications"], true);
    }

    #[test]
    fn test_corrupt_file_is_an_error_on_load_and_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(&path, VIEW_SETTINGS_KEY);
        assert!(store.load::<NotificationSettings>().is_err());

        store.save(&NotificationSettings::default()).unwrap();
        let loaded: Option<NotificationSettings> = store.load().unwrap();
        assert_eq!(loaded, Some(NotificationSettings::default()));
    }
}
