use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use packrat_types::object_id::ObjectId;

use crate::store::StatsSnapshot;

/// The record of one completed backup run.
///
/// Produced only for successful runs and immutable afterwards; later runs in
/// the snapshot chain reference it solely through [`Manifest::hash_cache_id`],
/// which seeds their incremental-skip decisions. The previous run's stored
/// cache object is never rewritten, so an old manifest stays reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Source path this run backed up.
    pub source_path: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Root of the uploaded object graph: a tree for directory sources, a
    /// blob for single-file sources.
    pub root_id: ObjectId,
    /// Cache object to chain into the next run. `None` for single-file
    /// sources, which bypass the cache.
    pub hash_cache_id: Option<ObjectId>,
    /// Store counters snapshotted after the upload finished.
    pub stats: StatsSnapshot,
}
