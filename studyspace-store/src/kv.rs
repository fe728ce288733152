use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Synchronous client-local key-value text storage. Reads of absent or
/// unreadable keys yield `None`; write failures are logged and swallowed. A
/// storage problem must never surface as a booking failure.
pub trait KvStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!(%err, key, "storage directory unavailable");
            return;
        }
        if let Err(err) = fs::write(self.path(key), value) {
            warn!(%err, key, "storage write failed");
        }
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}
