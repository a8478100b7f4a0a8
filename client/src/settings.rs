use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tilescore_types::{Locale, PlayerId};
use tracing::warn;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    locale: Locale,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorder_id: Option<PlayerId>,
}

/// Persisted local client state: the chosen locale and the recorder-lock
/// player id. A plain JSON file, loaded once at open and written back on
/// every mutation, injected into whoever needs it instead of being read
/// ambiently.
pub struct SettingsStore {
    path: PathBuf,
    state: Mutex<Persisted>,
}

impl SettingsStore {
    /// Open the store at `path`. A missing file starts from defaults; an
    /// unreadable or corrupt one is discarded with a warning rather than
    /// taking the client down.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding corrupt settings file");
                    Persisted::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Persisted::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read settings file");
                Persisted::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn locale(&self) -> Locale {
        self.state.lock().unwrap().locale
    }

    pub fn set_locale(&self, locale: Locale) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.locale = locale;
        self.save(&state)
    }

    pub fn recorder(&self) -> Option<PlayerId> {
        self.state.lock().unwrap().recorder_id
    }

    pub fn set_recorder(&self, recorder: Option<PlayerId>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.recorder_id = recorder;
        self.save(&state)
    }

    fn save(&self, state: &Persisted) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(state)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_starts_from_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json"));
        assert_eq!(store.locale(), Locale::En);
        assert_eq!(store.recorder(), None);
    }

    #[test]
    fn locale_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::open(&path);
        store.set_locale(Locale::Zh).unwrap();
        drop(store);

        let store = SettingsStore::open(&path);
        assert_eq!(store.locale(), Locale::Zh);
    }

    #[test]
    fn recorder_survives_reopen_and_clears() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::open(&path);
        store.set_recorder(Some(PlayerId(3))).unwrap();
        drop(store);

        let store = SettingsStore::open(&path);
        assert_eq!(store.recorder(), Some(PlayerId(3)));
        store.set_recorder(None).unwrap();
        drop(store);

        let store = SettingsStore::open(&path);
        assert_eq!(store.recorder(), None);
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SettingsStore::open(&path);
        assert_eq!(store.locale(), Locale::En);
        assert_eq!(store.recorder(), None);

        // A write repairs the file.
        store.set_locale(Locale::Zh).unwrap();
        let store = SettingsStore::open(&path);
        assert_eq!(store.locale(), Locale::Zh);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::open(&path);
        store.set_locale(Locale::Zh).unwrap();
        assert!(path.exists());
    }
}
