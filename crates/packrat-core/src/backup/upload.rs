use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use rayon::prelude::*;
use tracing::debug;

use packrat_types::error::{PackratError, Result};
use packrat_types::object_id::ObjectId;

use crate::cache::HashCache;
use crate::source::{DirectoryEntry, Entry, FileEntry, UnsupportedEntry};
use crate::store::ObjectStore;
use crate::tree::{Tree, TreeEntry, TreeEntryKind};

/// Upload behavior configuration. Policy beyond this (scheduling, retention,
/// source selection) belongs to the caller.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Worker threads for sibling uploads. `0` uses all available cores.
    pub parallelism: usize,
    /// Gitignore-style patterns excluding paths relative to the source root.
    pub exclude_patterns: Vec<String>,
}

/// Result of uploading one source.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub root_id: ObjectId,
    /// Cache object for the next run. `None` when the cache was bypassed
    /// (single-file sources).
    pub hash_cache_id: Option<ObjectId>,
}

/// Shared flag for aborting an in-flight upload.
///
/// Cancellation is sticky: once set, every run on the owning uploader fails
/// with [`PackratError::Cancelled`] until [`CancelHandle::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Per-run state shared by the workers of one `upload_directory` call.
struct RunContext {
    previous: HashCache,
    current: Mutex<HashCache>,
}

/// Walks a source tree and turns it into a graph of store objects.
///
/// Constructed once per object store and reused across runs. Each run
/// carries its own cache state, so several uploaders over one store are safe
/// to run concurrently as long as the store itself is.
pub struct Uploader {
    store: Arc<ObjectStore>,
    pool: rayon::ThreadPool,
    excludes: Option<Gitignore>,
    cancel: CancelHandle,
}

impl Uploader {
    pub fn new(store: Arc<ObjectStore>, options: &UploadOptions) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if options.parallelism > 0 {
            builder = builder.num_threads(options.parallelism);
        }
        let pool = builder
            .build()
            .map_err(|e| PackratError::Config(format!("worker pool: {e}")))?;
        let excludes = build_exclude_matcher(&options.exclude_patterns)?;
        Ok(Self {
            store,
            pool,
            excludes,
            cancel: CancelHandle::default(),
        })
    }

    /// Handle for aborting uploads started by this uploader.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Upload a directory tree, reusing objects recorded in the previous
    /// run's cache wherever size and mtime still match. Returns the root
    /// tree identifier and a fresh cache object for chaining.
    pub fn upload_directory(
        &self,
        root: &DirectoryEntry,
        previous_cache: Option<&ObjectId>,
    ) -> Result<UploadResult> {
        let previous = match previous_cache {
            Some(id) => HashCache::load(&self.store, id),
            None => HashCache::new(),
        };
        debug!(seeded_entries = previous.len(), "hash cache seeded");
        let ctx = RunContext {
            previous,
            current: Mutex::new(HashCache::new()),
        };

        let root_id = self.pool.install(|| self.upload_dir_inner(root, "", &ctx))?;

        let current = ctx.current.into_inner().unwrap();
        let hash_cache_id = current.save(&self.store)?;
        Ok(UploadResult {
            root_id,
            hash_cache_id: Some(hash_cache_id),
        })
    }

    /// Upload a single file, bypassing the hash cache.
    ///
    /// A bare-file source carries no previous-run context in this design;
    /// the asymmetry with directory sources is deliberate.
    pub fn upload_file(&self, file: &FileEntry) -> Result<ObjectId> {
        self.check_cancelled()?;
        let mut reader = file.open()?;
        self.store.write_blob_stream(&mut reader, file.size())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PackratError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Recursive upload of one directory. Siblings run on the worker pool;
    /// the parent's tree object is encoded only after every child has
    /// resolved, in name order regardless of completion order. The first
    /// child error aborts the parent and propagates unchanged.
    fn upload_dir_inner(
        &self,
        dir: &DirectoryEntry,
        rel_path: &str,
        ctx: &RunContext,
    ) -> Result<ObjectId> {
        self.check_cancelled()?;
        let children = dir.children()?;

        let entries = children
            .par_iter()
            .filter_map(|child| {
                let child_rel = join_rel(rel_path, child.name());
                if self.is_excluded(&child_rel, matches!(child, Entry::Directory(_))) {
                    debug!(path = %child_rel, "excluded");
                    return None;
                }
                Some(self.upload_child(child, &child_rel, ctx))
            })
            .collect::<Result<Vec<TreeEntry>>>()?;

        self.store.write_tree(&Tree::new(entries))
    }

    fn upload_child(&self, child: &Entry, rel_path: &str, ctx: &RunContext) -> Result<TreeEntry> {
        self.check_cancelled()?;
        match child {
            Entry::File(file) => {
                let id = self.upload_file_cached(file, rel_path, ctx)?;
                Ok(TreeEntry {
                    name: file.name().to_string(),
                    kind: TreeEntryKind::File,
                    id,
                    size: file.size(),
                    mtime_ns: file.mtime_ns(),
                })
            }
            Entry::Directory(subdir) => {
                let id = self.upload_dir_inner(subdir, rel_path, ctx)?;
                Ok(TreeEntry {
                    name: subdir.name().to_string(),
                    kind: TreeEntryKind::Directory,
                    id,
                    size: 0,
                    mtime_ns: subdir.mtime_ns(),
                })
            }
            Entry::Unsupported(node) => Err(unsupported(node)),
        }
    }

    /// Upload one file, consulting the previous run's cache first. A hit
    /// reuses the recorded identifier without opening the file; either way
    /// the observed metadata is recorded into the current run's cache.
    fn upload_file_cached(
        &self,
        file: &FileEntry,
        rel_path: &str,
        ctx: &RunContext,
    ) -> Result<ObjectId> {
        if let Some(id) = ctx.previous.lookup(rel_path, file.size(), file.mtime_ns()) {
            self.store.counters().add_cache_hit();
            ctx.current
                .lock()
                .unwrap()
                .record(rel_path.to_string(), file.size(), file.mtime_ns(), id);
            return Ok(id);
        }

        self.store.counters().add_cache_miss();
        let mut reader = file.open()?;
        let id = self.store.write_blob_stream(&mut reader, file.size())?;
        ctx.current
            .lock()
            .unwrap()
            .record(rel_path.to_string(), file.size(), file.mtime_ns(), id);
        Ok(id)
    }

    fn is_excluded(&self, rel_path: &str, is_dir: bool) -> bool {
        self.excludes
            .as_ref()
            .is_some_and(|m| m.matched(rel_path, is_dir).is_ignore())
    }
}

fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn unsupported(node: &UnsupportedEntry) -> PackratError {
    PackratError::UnsupportedEntry(format!("{} ({})", node.path.display(), node.kind))
}

fn build_exclude_matcher(patterns: &[String]) -> Result<Option<Gitignore>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GitignoreBuilder::new("");
    for pat in patterns {
        builder
            .add_line(None, pat)
            .map_err(|e| PackratError::Config(format!("invalid exclude pattern '{pat}': {e}")))?;
    }
    let matcher = builder
        .build()
        .map_err(|e| PackratError::Config(format!("exclude matcher build failed: {e}")))?;
    Ok(Some(matcher))
}
