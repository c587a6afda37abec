use std::path::Path;
use std::sync::Arc;

use crate::backup::{UploadOptions, Uploader};
use crate::source::{self, DirectoryEntry, Entry, FileEntry};
use crate::store::ObjectStore;
use crate::testutil::write_file;

/// Standard fixture: two files at the root, one nested.
///
///   a.txt        "hello"
///   sub/b.txt    "world"
///   sub/deep/c.bin  512 bytes
pub fn build_sample_tree(root: &Path) {
    write_file(root, "a.txt", b"hello");
    write_file(root, "sub/b.txt", b"world");
    write_file(root, "sub/deep/c.bin", &[0x5A; 512]);
}

pub const SAMPLE_FILE_COUNT: u64 = 3;

pub fn dir_entry(path: &Path) -> DirectoryEntry {
    match source::resolve(path).unwrap() {
        Entry::Directory(dir) => dir,
        other => panic!("expected directory entry, got {other:?}"),
    }
}

pub fn file_entry(path: &Path) -> FileEntry {
    match source::resolve(path).unwrap() {
        Entry::File(file) => file,
        other => panic!("expected file entry, got {other:?}"),
    }
}

pub fn uploader(store: Arc<ObjectStore>) -> Uploader {
    Uploader::new(store, &UploadOptions::default()).unwrap()
}

pub fn uploader_with(store: Arc<ObjectStore>, options: UploadOptions) -> Uploader {
    Uploader::new(store, &options).unwrap()
}
