use std::path::Path;
use std::sync::Arc;

use packrat_core::backup::{self, BackupRequest, UploadOptions, Uploader};
use packrat_core::storage::LocalBackend;
use packrat_core::store::ObjectStore;
use packrat_types::object_id::ObjectKind;

fn local_store(dir: &Path) -> Arc<ObjectStore> {
    let backend = LocalBackend::new(dir.to_str().unwrap()).unwrap();
    Arc::new(ObjectStore::new(Box::new(backend)))
}

fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
}

fn build_source(root: &Path) {
    write_file(root, "a.txt", b"hello");
    write_file(root, "sub/b.txt", b"world");
    write_file(root, "sub2/c.txt", b"third branch");
}

fn run_backup(
    uploader: &Uploader,
    source: &Path,
    previous: Option<&packrat_core::manifest::Manifest>,
) -> packrat_core::manifest::Manifest {
    backup::run(
        uploader,
        BackupRequest {
            source_path: source.to_str().unwrap(),
            previous,
        },
    )
    .unwrap()
}

#[test]
fn unchanged_rerun_reproduces_root_with_full_cache_hits() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_file(source_dir.path(), "a.txt", b"hello");
    write_file(source_dir.path(), "sub/b.txt", b"world");

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(Arc::clone(&store), &UploadOptions::default()).unwrap();

    let manifest1 = run_backup(&uploader, source_dir.path(), None);
    assert_eq!(manifest1.stats.cache_misses, 2);

    let manifest2 = run_backup(&uploader, source_dir.path(), Some(&manifest1));

    assert_eq!(manifest2.root_id, manifest1.root_id);
    assert!(manifest2.hash_cache_id.is_some());
    // Both files hit; nothing was re-read.
    assert_eq!(manifest2.stats.cache_hits - manifest1.stats.cache_hits, 2);
    assert_eq!(manifest2.stats.cache_misses, manifest1.stats.cache_misses);
    assert_eq!(manifest2.stats.bytes_read, manifest1.stats.bytes_read);
}

#[test]
fn change_is_localized_to_its_path() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    build_source(source_dir.path());

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(Arc::clone(&store), &UploadOptions::default()).unwrap();

    let manifest1 = run_backup(&uploader, source_dir.path(), None);

    write_file(source_dir.path(), "sub/b.txt", b"world but longer now");
    let manifest2 = run_backup(&uploader, source_dir.path(), Some(&manifest1));

    assert_ne!(manifest2.root_id, manifest1.root_id);
    assert_eq!(manifest2.stats.cache_hits - manifest1.stats.cache_hits, 2);

    let old_root = store.read_tree(&manifest1.root_id).unwrap();
    let new_root = store.read_tree(&manifest2.root_id).unwrap();

    // Siblings and uncles keep their identifiers; only the changed path moves.
    assert_eq!(
        old_root.find("a.txt").unwrap().id,
        new_root.find("a.txt").unwrap().id
    );
    assert_eq!(
        old_root.find("sub2").unwrap().id,
        new_root.find("sub2").unwrap().id
    );
    assert_ne!(
        old_root.find("sub").unwrap().id,
        new_root.find("sub").unwrap().id
    );
}

#[test]
fn identical_content_deduplicates_across_files() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_file(source_dir.path(), "first.bin", b"shared payload");
    write_file(source_dir.path(), "second.bin", b"shared payload");

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(Arc::clone(&store), &UploadOptions::default()).unwrap();
    let manifest = run_backup(&uploader, source_dir.path(), None);

    let root = store.read_tree(&manifest.root_id).unwrap();
    let first = root.find("first.bin").unwrap();
    let second = root.find("second.bin").unwrap();
    assert_eq!(first.id, second.id);
    // One content blob plus the hash cache object.
    assert_eq!(manifest.stats.blobs_written, 2);
    assert!(manifest.stats.objects_deduplicated >= 1);
}

#[test]
fn fresh_stores_agree_on_root_id() {
    let source_dir = tempfile::tempdir().unwrap();
    build_source(source_dir.path());

    let store_a = tempfile::tempdir().unwrap();
    let store_b = tempfile::tempdir().unwrap();
    let uploader_a =
        Uploader::new(local_store(store_a.path()), &UploadOptions::default()).unwrap();
    let uploader_b =
        Uploader::new(local_store(store_b.path()), &UploadOptions::default()).unwrap();

    let manifest_a = run_backup(&uploader_a, source_dir.path(), None);
    let manifest_b = run_backup(&uploader_b, source_dir.path(), None);
    assert_eq!(manifest_a.root_id, manifest_b.root_id);
}

#[test]
fn corrupt_cache_object_degrades_without_failing() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    build_source(source_dir.path());

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(Arc::clone(&store), &UploadOptions::default()).unwrap();
    let manifest1 = run_backup(&uploader, source_dir.path(), None);

    // Clobber the stored cache object behind the store's back.
    let cache_key = manifest1.hash_cache_id.unwrap().storage_key();
    std::fs::write(store_dir.path().join(&cache_key), b"\xDE\xAD\xBE\xEF").unwrap();

    let manifest2 = run_backup(&uploader, source_dir.path(), Some(&manifest1));
    assert_eq!(manifest2.root_id, manifest1.root_id);
    assert_eq!(manifest2.stats.cache_hits, 0);
    assert!(manifest2.hash_cache_id.is_some());
}

#[test]
fn single_file_source_round_trips() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_file(source_dir.path(), "payload.dat", &[0x42; 2048]);

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(Arc::clone(&store), &UploadOptions::default()).unwrap();
    let manifest = run_backup(&uploader, &source_dir.path().join("payload.dat"), None);

    assert_eq!(manifest.root_id.kind, ObjectKind::Blob);
    assert!(manifest.hash_cache_id.is_none());
    assert_eq!(store.read_blob(&manifest.root_id).unwrap(), vec![0x42; 2048]);
}

#[test]
fn wide_tree_survives_parallel_upload() {
    let source_dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    for d in 0..8 {
        for f in 0..16 {
            write_file(
                source_dir.path(),
                &format!("branch_{d}/leaf_{f:02}.dat"),
                format!("content {d}:{f}").as_bytes(),
            );
        }
    }

    let store = local_store(store_dir.path());
    let uploader = Uploader::new(
        Arc::clone(&store),
        &UploadOptions {
            parallelism: 8,
            exclude_patterns: Vec::new(),
        },
    )
    .unwrap();

    let manifest1 = run_backup(&uploader, source_dir.path(), None);
    let root = store.read_tree(&manifest1.root_id).unwrap();
    assert_eq!(root.entries.len(), 8);

    let manifest2 = run_backup(&uploader, source_dir.path(), Some(&manifest1));
    assert_eq!(manifest2.root_id, manifest1.root_id);
    assert_eq!(
        manifest2.stats.cache_hits - manifest1.stats.cache_hits,
        8 * 16
    );
}
