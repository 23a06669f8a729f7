use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value storage for client-side view preferences.
pub trait ViewSettingsStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn save(&self, key: &str, value: &str) -> Result<(), InfraError>;
}

/// Keeps one `<key>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileViewSettingsStore {
    dir: PathBuf,
}

impl FileViewSettingsStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, InfraError> {
        let key = key.trim();
        let is_safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !is_safe {
            return Err(InfraError::InvalidConfig(format!(
                "invalid settings key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ViewSettingsStore for FileViewSettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(InfraError::Io(error)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryViewSettingsStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryViewSettingsStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            entries: Mutex::new(HashMap::from([(key.to_string(), value.to_string())])),
        }
    }
}

impl ViewSettingsStore for InMemoryViewSettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError> {
        let entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("settings lock poisoned: {error}")))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("settings lock poisoned: {error}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::view_settings::VIEW_SETTINGS_KEY;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_SETTINGS_DIR: AtomicUsize = AtomicUsize::new(0);

    fn temp_dir() -> PathBuf {
        let sequence = NEXT_SETTINGS_DIR.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "activity-settings-tests-{}-{}",
            std::process::id(),
            sequence
        ))
    }

    #[test]
    fn file_store_returns_none_for_missing_entry() {
        let dir = temp_dir();
        let store = FileViewSettingsStore::new(&dir);
        assert_eq!(store.load(VIEW_SETTINGS_KEY).expect("load"), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = temp_dir();
        FileViewSettingsStore::new(&dir)
            .save(VIEW_SETTINGS_KEY, r#"{"page":2}"#)
            .expect("save");

        let reopened = FileViewSettingsStore::new(&dir);
        assert_eq!(
            reopened.load(VIEW_SETTINGS_KEY).expect("load"),
            Some(r#"{"page":2}"#.to_string())
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileViewSettingsStore::new(temp_dir());
        assert!(store.save("../escape", "{}").is_err());
        assert!(store.load("").is_err());
    }

    #[test]
    fn in_memory_store_overwrites_entry() {
        let store = InMemoryViewSettingsStore::with_entry(VIEW_SETTINGS_KEY, "old");
        store.save(VIEW_SETTINGS_KEY, "new").expect("save");
        assert_eq!(store.load(VIEW_SETTINGS_KEY).expect("load"), Some("new".to_string()));
    }
}
