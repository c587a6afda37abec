use serde::{Deserialize, Serialize};

use packrat_types::object_id::ObjectId;

/// Kind marker for a directory child, stored in the tree object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeEntryKind {
    File,
    Directory,
}

/// One child of a directory: its name, the identifier its upload produced,
/// and the metadata observed at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub kind: TreeEntryKind,
    pub id: ObjectId,
    pub size: u64,
    pub mtime_ns: i64,
}

/// The stored representation of one directory.
///
/// Entries are sorted by name at construction, so the serialized bytes do
/// not depend on enumeration or completion order. Re-encoding an unchanged
/// directory reproduces the exact stored bytes, which is what lets the store
/// deduplicate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn find(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
