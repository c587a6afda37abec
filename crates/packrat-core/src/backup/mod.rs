pub mod upload;

pub use upload::{CancelHandle, UploadOptions, UploadResult, Uploader};

use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use packrat_types::error::{PackratError, Result};

use crate::manifest::Manifest;
use crate::source::{self, Entry};

/// One backup run: the source to walk and the previous run to reuse from.
#[derive(Debug, Clone, Copy)]
pub struct BackupRequest<'a> {
    pub source_path: &'a str,
    /// Manifest of the previous run in this snapshot chain, if any. Its
    /// cache object seeds the incremental-skip decisions for directory
    /// sources.
    pub previous: Option<&'a Manifest>,
}

/// Run a backup and return the manifest describing it.
///
/// The source is resolved before anything is written, so an unsupported
/// source kind fails with no side effects. On failure no manifest is
/// produced and the caller must not treat the run as a snapshot; objects
/// already written stay in the store, where content addressing lets a retry
/// reference them instead of re-writing.
pub fn run(uploader: &Uploader, req: BackupRequest<'_>) -> Result<Manifest> {
    let entry = source::resolve(Path::new(req.source_path))?;

    let started_at = Utc::now();
    let outcome = match &entry {
        Entry::Directory(dir) => {
            let previous_cache = req.previous.and_then(|m| m.hash_cache_id);
            uploader.upload_directory(dir, previous_cache.as_ref())
        }
        Entry::File(file) => uploader.upload_file(file).map(|root_id| UploadResult {
            root_id,
            hash_cache_id: None,
        }),
        Entry::Unsupported(node) => Err(PackratError::UnsupportedEntry(format!(
            "{} ({})",
            node.path.display(),
            node.kind
        ))),
    };
    let finished_at = Utc::now();
    let elapsed_ms = (finished_at - started_at).num_milliseconds();

    let result = match outcome {
        Ok(r) => r,
        Err(PackratError::Cancelled) => {
            info!(source = req.source_path, elapsed_ms, "backup cancelled");
            return Err(PackratError::Cancelled);
        }
        Err(e) => {
            warn!(source = req.source_path, elapsed_ms, error = %e, "backup failed");
            return Err(e);
        }
    };

    let manifest = Manifest {
        source_path: req.source_path.to_string(),
        started_at,
        finished_at,
        root_id: result.root_id,
        hash_cache_id: result.hash_cache_id,
        stats: uploader.store().stats(),
    };
    info!(
        source = req.source_path,
        root = %manifest.root_id,
        elapsed_ms,
        "backup complete"
    );
    Ok(manifest)
}
