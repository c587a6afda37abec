use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Running counters maintained by the object store across uploads.
///
/// Counters are monotonic for the lifetime of the store; a manifest embeds a
/// [`StatsSnapshot`] copied by value, so one run's contribution is the
/// difference against the previous run's snapshot.
#[derive(Debug, Default)]
pub struct StoreStats {
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    blobs_written: AtomicU64,
    trees_written: AtomicU64,
    objects_deduplicated: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StoreStats {
    pub(crate) fn add_bytes_read(&self, n: u64) {
        self.bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_bytes_written(&self, n: u64) {
        self.bytes_written.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_blob_written(&self) {
        self.blobs_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_tree_written(&self) {
        self.trees_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_deduplicated(&self) {
        self.objects_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            blobs_written: self.blobs_written.load(Ordering::Relaxed),
            trees_written: self.trees_written.load(Ordering::Relaxed),
            objects_deduplicated: self.objects_deduplicated.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// A frozen copy of the store counters, embedded in a manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub blobs_written: u64,
    pub trees_written: u64,
    pub objects_deduplicated: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}
