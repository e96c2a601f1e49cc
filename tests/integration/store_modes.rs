use dagcar::export::StoreBackend;
use dagcar::source::FileDescriptor;
use tempfile::TempDir;

use crate::integration::support::{export, SourceTree};

fn fixture() -> SourceTree {
    let big: Vec<u8> = (0..200u32).map(|i| (i * 13 % 256) as u8).collect();
    SourceTree::new(&[
        ("a/one.txt", b"one"),
        ("a/two.bin", &big),
        ("b/three.txt", b"three three three"),
    ])
}

#[test]
fn scratch_copy_matches_direct_ingest() {
    let tree = fixture();
    let files = tree.discovered();
    let (direct, direct_archive) = export(&files, &tree.options());

    let scratch = TempDir::new().unwrap();
    let mut options = tree.options();
    options.scratch_dir = Some(scratch.path().to_path_buf());
    let (copied, copied_archive) = export(&files, &options);

    assert_eq!(direct.root, copied.root);
    assert_eq!(direct_archive, copied_archive);
    assert!(scratch.path().join("a/two.bin").exists());
}

#[test]
fn scratch_copy_of_range_matches_direct_range() {
    let tree = fixture();
    let files = vec![FileDescriptor::range(tree.path("a/two.bin"), 200, 30, 170)];
    let (direct, _) = export(&files, &tree.options());

    let scratch = TempDir::new().unwrap();
    let mut options = tree.options();
    options.scratch_dir = Some(scratch.path().to_path_buf());
    let (copied, _) = export(&files, &options);

    assert_eq!(direct.root, copied.root);
    assert_eq!(
        std::fs::metadata(scratch.path().join("a/two.bin")).unwrap().len(),
        140
    );
}

#[test]
fn no_copy_matches_copying_store() {
    let tree = fixture();
    let files = tree.discovered();
    let (copying, copying_archive) = export(&files, &tree.options());

    let mut options = tree.options();
    options.no_copy = true;
    let (referencing, referencing_archive) = export(&files, &options);

    assert_eq!(copying.root, referencing.root);
    assert_eq!(copying.manifest, referencing.manifest);
    assert_eq!(copying_archive, referencing_archive);
}

#[test]
fn no_copy_with_scratch_references_the_copies() {
    let tree = fixture();
    let files = tree.discovered();
    let (copying, copying_archive) = export(&files, &tree.options());

    let scratch = TempDir::new().unwrap();
    let mut options = tree.options();
    options.scratch_dir = Some(scratch.path().to_path_buf());
    options.no_copy = true;
    let (referencing, referencing_archive) = export(&files, &options);

    assert_eq!(copying.root, referencing.root);
    assert_eq!(copying_archive, referencing_archive);
}

#[test]
fn disk_backend_matches_memory_backend() {
    let tree = fixture();
    let files = tree.discovered();
    let (memory, memory_archive) = export(&files, &tree.options());

    let mut options = tree.options();
    options.backend = StoreBackend::Disk(None);
    let (temporary, temporary_archive) = export(&files, &options);

    let db = TempDir::new().unwrap();
    options.backend = StoreBackend::Disk(Some(db.path().join("blocks")));
    let (persistent, _) = export(&files, &options);

    assert_eq!(memory.root, temporary.root);
    assert_eq!(memory.root, persistent.root);
    assert_eq!(memory_archive, temporary_archive);
}
