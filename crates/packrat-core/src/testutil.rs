use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use packrat_types::error::Result;

use crate::storage::StorageBackend;
use crate::store::ObjectStore;

/// In-memory storage backend for testing. Thread-safe via Mutex.
pub struct MemoryBackend {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self.data.lock().unwrap();
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut map = self.data.lock().unwrap();
        map.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let map = self.data.lock().unwrap();
        Ok(map.contains_key(key))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let map = self.data.lock().unwrap();
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Object store backed by [`MemoryBackend`].
pub fn memory_store() -> Arc<ObjectStore> {
    Arc::new(ObjectStore::new(Box::new(MemoryBackend::new())))
}

/// Shared handle to inspect which keys were written via `put()`.
#[derive(Clone)]
pub struct PutLog(Arc<Mutex<Vec<String>>>);

impl PutLog {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    /// All keys written via `put()` since the last `clear()`.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn record(&self, key: &str) {
        self.0.lock().unwrap().push(key.to_string());
    }
}

/// Storage wrapper that records which keys were passed to `put()`.
/// Delegates all operations to an inner `MemoryBackend`.
pub struct RecordingBackend {
    inner: MemoryBackend,
    log: PutLog,
}

impl RecordingBackend {
    pub fn new() -> (Self, PutLog) {
        let log = PutLog::new();
        (
            Self {
                inner: MemoryBackend::new(),
                log: log.clone(),
            },
            log,
        )
    }
}

impl StorageBackend for RecordingBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.log.record(key);
        self.inner.put(key, data)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}

/// Write a file under `root`, creating parent directories as needed.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
}

/// Force a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    use std::fs::{FileTimes, OpenOptions};
    use std::time::{Duration, SystemTime};

    let file = OpenOptions::new().write(true).open(path).unwrap();
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    file.set_times(FileTimes::new().set_modified(mtime)).unwrap();
}
