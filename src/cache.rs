use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};

use crate::error::AuditError;
use crate::system::Clock;

pub struct CachedValue {
    pub text: String,
    pub stored_at: SystemTime,
}

/// Key-value storage for raw command output, keyed by a digest of the
/// command string. The TTL and hashing policy live in `QueryCache`; a
/// store only persists and retrieves.
pub trait CacheStore {
    fn load(&self, key: &str) -> Option<CachedValue>;
    fn store(&self, key: &str, text: &str);
    fn clear(&self);
}

/// File-backed store rooted in the process temp directory. One file per
/// distinct command, named by the command digest. Writes go through a
/// temp file and a rename, so a reader sees either a complete prior
/// value or nothing.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn in_temp() -> Self {
        Self::new(std::env::temp_dir().join("unmerged-cache"))
    }
}

impl CacheStore for DiskStore {
    fn load(&self, key: &str) -> Option<CachedValue> {
        let path = self.dir.join(key);
        let text = fs::read_to_string(&path).ok()?;
        let stored_at = fs::metadata(&path).ok()?.modified().ok()?;
        Some(CachedValue { text, stored_at })
    }

    fn store(&self, key: &str, text: &str) {
        if fs::create_dir_all(&self.dir).is_err() {
            return;
        }
        let tmp = self.dir.join(format!("{key}.tmp"));
        if fs::write(&tmp, text).is_ok() {
            let _ = fs::rename(&tmp, self.dir.join(key));
        }
    }

    fn clear(&self) {
        // No-op when the store directory does not exist.
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// In-memory store for tests.
pub struct MemoryStore {
    entries: RefCell<HashMap<String, (String, SystemTime)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Shift every entry's stamp into the past, to exercise expiry.
    pub fn backdate_all(&self, by: Duration) {
        let mut entries = self.entries.borrow_mut();
        for (_, stored_at) in entries.values_mut() {
            if let Some(earlier) = stored_at.checked_sub(by) {
                *stored_at = earlier;
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Option<CachedValue> {
        self.entries
            .borrow()
            .get(key)
            .map(|(text, stored_at)| CachedValue {
                text: text.clone(),
                stored_at: *stored_at,
            })
    }

    fn store(&self, key: &str, text: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), (text.to_string(), SystemTime::now()));
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Memoizes command output in a `CacheStore` with a freshness window.
///
/// The key is a SHA-256 digest of the exact command string, so any change
/// in arguments (branch name, base ref) produces a different entry. A hit
/// within the window returns the stored text without re-executing; a miss
/// or stale entry runs the command, stores its output on success, and
/// returns it. Command failures propagate and are never cached.
pub struct QueryCache<'a> {
    store: &'a dyn CacheStore,
    max_age: Duration,
}

impl<'a> QueryCache<'a> {
    #[must_use]
    pub fn new(store: &'a dyn CacheStore, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// # Errors
    /// Propagates whatever error `run` reports on a miss or stale entry.
    pub fn get(
        &self,
        clock: &dyn Clock,
        command: &str,
        run: impl FnOnce() -> Result<String, AuditError>,
    ) -> Result<String, AuditError> {
        let key = digest(command);
        if let Some(hit) = self.store.load(&key)
            && is_fresh(clock, hit.stored_at, self.max_age)
        {
            return Ok(hit.text);
        }
        let text = run()?;
        self.store.store(&key, &text);
        Ok(text)
    }
}

fn is_fresh(clock: &dyn Clock, stored_at: SystemTime, max_age: Duration) -> bool {
    match clock.now().duration_since(stored_at) {
        Ok(age) => age <= max_age,
        // A stamp from the future counts as fresh.
        Err(_) => true,
    }
}

fn digest(command: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(command.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
