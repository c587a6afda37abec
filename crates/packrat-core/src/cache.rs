use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use packrat_types::error::Result;
use packrat_types::object_id::ObjectId;

use crate::store::{ObjectStore, ObjectType};

/// Cached metadata for one uploaded file, keyed by its source-relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashCacheEntry {
    pub size: u64,
    pub mtime_ns: i64,
    pub id: ObjectId,
}

/// Maps source-relative paths to the identifier their content produced on a
/// previous run, so unchanged files can be reused without re-reading.
///
/// A size+mtime match approximates content identity: no read is required,
/// but a rewrite that lands on the same size and mtime is wrongly treated as
/// unchanged, and a metadata-only touch forces a spurious re-read. Same
/// trade-off rsync-style incremental tools make; the cache is an
/// optimization, never a correctness dependency.
///
/// Entries live in a `BTreeMap` so serialization is deterministic and an
/// unchanged cache re-encodes to identical bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HashCache {
    entries: BTreeMap<String, HashCacheEntry>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a path. Hits only when both size and mtime match exactly.
    pub fn lookup(&self, path: &str, size: u64, mtime_ns: i64) -> Option<ObjectId> {
        let entry = self.entries.get(path)?;
        if entry.size == size && entry.mtime_ns == mtime_ns {
            Some(entry.id)
        } else {
            None
        }
    }

    /// Insert or overwrite the entry for a path under the current run.
    pub fn record(&mut self, path: String, size: u64, mtime_ns: i64, id: ObjectId) {
        self.entries.insert(path, HashCacheEntry { size, mtime_ns, id });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store the accumulated entries as a new cache object and return its
    /// identifier for chaining into the next manifest. The previous run's
    /// cache object is never modified.
    pub fn save(&self, store: &ObjectStore) -> Result<ObjectId> {
        let encoded = rmp_serde::to_vec(self)?;
        let id = store.put_object(ObjectType::HashCache, &encoded)?;
        debug!(entries = self.entries.len(), cache_id = %id, "hash cache stored");
        Ok(id)
    }

    /// Load a previous run's cache object.
    ///
    /// Degrades to an empty cache on any failure: the cache only skips work,
    /// so a missing or corrupt object must not fail the run.
    pub fn load(store: &ObjectStore, id: &ObjectId) -> Self {
        let payload = match store.get_object(ObjectType::HashCache, id) {
            Ok(p) => p,
            Err(e) => {
                warn!(cache_id = %id, error = %e, "previous hash cache unavailable, re-hashing all files");
                return Self::new();
            }
        };
        match rmp_serde::from_slice(&payload) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(cache_id = %id, error = %e, "previous hash cache undecodable, re-hashing all files");
                Self::new()
            }
        }
    }
}
