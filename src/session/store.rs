// Session store
//
// Key-value persistence port standing in for per-tab session storage. The
// wizard writes pending form snapshots here before a login redirect and
// reads them back on mount. Keys are read and written atomically, one at a
// time; there is no cross-instance coordination.

use anyhow::Result;
use log::warn;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store used by tests and smoke runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        slots.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object per install, read-modify-write per
/// operation. Unparseable contents are treated as an empty store so a
/// corrupt file cannot wedge the wizard.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store file under the resolved data folder.
    pub fn at_default_location() -> Result<Self> {
        let dir = crate::utils::path_resolver::resolve_data_folder()?;
        Ok(Self::new(dir.join("session_store.json")))
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "[PHASE: session] [STEP: restore] Session store at {:?} is unreadable, starting empty: {}",
                    self.path, e
                );
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        let body = serde_json::to_string_pretty(slots)?;
        std::fs::write(&self.path, body)
            .map_err(|e| anyhow::anyhow!("Failed to write session store {:?}: {}", self.path, e))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.read_all();
        slots.insert(key.to_string(), value.to_string());
        self.write_all(&slots)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self.read_all();
        if slots.remove(key).is_some() {
            self.write_all(&slots)?;
        }
        Ok(())
    }
}
