use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use packrat_types::error::{PackratError, Result};

/// A read-only view of one filesystem node, as consumed by the uploader.
///
/// The set of kinds is closed on purpose: every consumer matches
/// exhaustively, so a node that is neither a file nor a directory is a typed
/// case the uploader rejects, not a runtime surprise.
#[derive(Debug, Clone)]
pub enum Entry {
    File(FileEntry),
    Directory(DirectoryEntry),
    Unsupported(UnsupportedEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
            Entry::Unsupported(u) => &u.name,
        }
    }
}

/// A regular file: fixed size, modification time, readable byte stream.
#[derive(Debug, Clone)]
pub struct FileEntry {
    name: String,
    path: PathBuf,
    size: u64,
    mtime_ns: i64,
}

impl FileEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mtime_ns(&self) -> i64 {
        self.mtime_ns
    }

    /// Open the file's content for reading.
    pub fn open(&self) -> Result<fs::File> {
        Ok(fs::File::open(&self.path)?)
    }
}

/// A directory: named, timestamped, enumerable.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    name: String,
    path: PathBuf,
    mtime_ns: i64,
}

impl DirectoryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mtime_ns(&self) -> i64 {
        self.mtime_ns
    }

    /// Enumerate children in lexicographic name order.
    ///
    /// Enumeration is side-effect-free and repeatable: reading the same
    /// directory twice yields the same children in the same order, which the
    /// uploader relies on for reproducible tree encodings. Symlinks are never
    /// followed; nodes of other kinds come back as [`Entry::Unsupported`].
    pub fn children(&self) -> Result<Vec<Entry>> {
        let mut names = Vec::new();
        for dirent in fs::read_dir(&self.path)? {
            names.push(dirent?.file_name());
        }
        names.sort();

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            children.push(classify(&self.path.join(&name))?);
        }
        Ok(children)
    }
}

/// A node the pipeline recognizes but does not back up.
#[derive(Debug, Clone)]
pub struct UnsupportedEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Symlink,
    Special,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Symlink => write!(f, "symbolic link"),
            NodeKind::Special => write!(f, "special file"),
        }
    }
}

/// Resolve a source path to an [`Entry`].
///
/// Symlinks are never followed. A missing path is an error; a node that is
/// neither a regular file nor a directory resolves to [`Entry::Unsupported`]
/// so the caller fails with a descriptive error instead of silently skipping
/// data.
pub fn resolve(path: &Path) -> Result<Entry> {
    classify(path).map_err(|e| match e {
        PackratError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            PackratError::SourceNotFound(path.display().to_string())
        }
        other => other,
    })
}

fn classify(path: &Path) -> Result<Entry> {
    let metadata = fs::symlink_metadata(path)?;
    let file_type = metadata.file_type();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if file_type.is_symlink() {
        return Ok(Entry::Unsupported(UnsupportedEntry {
            name,
            path: path.to_path_buf(),
            kind: NodeKind::Symlink,
        }));
    }
    if file_type.is_dir() {
        return Ok(Entry::Directory(DirectoryEntry {
            name,
            path: path.to_path_buf(),
            mtime_ns: mtime_nanos(&metadata),
        }));
    }
    if file_type.is_file() {
        return Ok(Entry::File(FileEntry {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime_ns: mtime_nanos(&metadata),
        }));
    }
    Ok(Entry::Unsupported(UnsupportedEntry {
        name,
        path: path.to_path_buf(),
        kind: NodeKind::Special,
    }))
}

/// Modification time in nanoseconds since the Unix epoch.
fn mtime_nanos(metadata: &fs::Metadata) -> i64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        metadata.mtime() * 1_000_000_000 + metadata.mtime_nsec()
    }

    #[cfg(not(unix))]
    {
        use std::time::UNIX_EPOCH;
        match metadata.modified() {
            Ok(t) => match t.duration_since(UNIX_EPOCH) {
                Ok(d) => i64::try_from(d.as_nanos()).unwrap_or(i64::MAX),
                Err(e) => -i64::try_from(e.duration().as_nanos()).unwrap_or(i64::MAX),
            },
            Err(_) => 0,
        }
    }
}
