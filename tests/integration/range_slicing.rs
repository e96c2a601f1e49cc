use dagcar::archive::ArchiveReader;
use dagcar::concurrency::CancelToken;
use dagcar::export::{pack_graphs, MANIFEST_INDEX};
use dagcar::source::FileDescriptor;
use dagcar::store::MemoryBlockstore;
use dagcar::tree::balanced::build_file_node;
use dagcar::tree::reader::{read_file, resolve_path};
use dagcar::PackError;
use std::fs::{self, File};
use std::io::BufReader;
use tempfile::TempDir;

use crate::integration::support::{small_params, SourceTree};

fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

#[test]
fn full_range_matches_whole_file() {
    let data = content(100);
    let tree = SourceTree::new(&[("f.bin", &data)]);
    let path = tree.path("f.bin");
    let store = MemoryBlockstore::new();
    let cancel = CancelToken::new();

    let whole = FileDescriptor::whole(&path, 100);
    let explicit = FileDescriptor::range(&path, 100, 0, 100);
    let defaulted = FileDescriptor::range(&path, 100, 0, 0).normalized().unwrap();

    let a = build_file_node(&store, &whole, small_params(), &cancel).unwrap();
    let b = build_file_node(&store, &explicit, small_params(), &cancel).unwrap();
    let c = build_file_node(&store, &defaulted, small_params(), &cancel).unwrap();
    assert_eq!(a.cid, b.cid);
    assert_eq!(a.cid, c.cid);
    assert_eq!(a.file_size, 100);
}

#[test]
fn split_ranges_concatenate_to_original() {
    let data = content(123);
    let tree = SourceTree::new(&[("f.bin", &data)]);
    let path = tree.path("f.bin");
    let store = MemoryBlockstore::new();
    let cancel = CancelToken::new();

    for k in [1u64, 8, 50, 122, 123] {
        let head = FileDescriptor::range(&path, 123, 0, k);
        let tail = FileDescriptor::range(&path, 123, k, 123);

        let mut joined = Vec::new();
        for desc in [&head, &tail] {
            let root = build_file_node(&store, desc, small_params(), &cancel).unwrap();
            assert_eq!(root.file_size, desc.len());
            read_file(&store, &root.cid, &mut joined).unwrap();
        }
        assert_eq!(joined, data, "split at {}", k);
    }
}

#[test]
fn range_equals_standalone_file_with_same_bytes() {
    let data = content(64);
    let tree = SourceTree::new(&[("big.bin", &data), ("part.bin", &data[16..48])]);
    let store = MemoryBlockstore::new();
    let cancel = CancelToken::new();

    let range = FileDescriptor::range(tree.path("big.bin"), 64, 16, 48);
    let standalone = FileDescriptor::whole(tree.path("part.bin"), 32);
    let a = build_file_node(&store, &range, small_params(), &cancel).unwrap();
    let b = build_file_node(&store, &standalone, small_params(), &cancel).unwrap();
    assert_eq!(a.cid, b.cid);
}

#[test]
fn invalid_range_is_rejected() {
    let tree = SourceTree::new(&[("f.bin", b"0123456789")]);
    let desc = FileDescriptor::range(tree.path("f.bin"), 10, 4, 20);
    assert!(matches!(
        desc.normalized(),
        Err(PackError::InvalidRange { end: 20, .. })
    ));
}

#[test]
fn shrunk_source_is_out_of_bounds() {
    let tree = SourceTree::new(&[("f.bin", &content(40))]);
    // Descriptor claims more bytes than the file holds by the time it is read.
    let desc = FileDescriptor::range(tree.path("f.bin"), 80, 10, 70);
    let err = build_file_node(
        &MemoryBlockstore::new(),
        &desc,
        small_params(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, PackError::OutOfBounds { offset: 40, .. }), "{}", err);
}

#[test]
fn sliced_graphs_reassemble_source() {
    let big = content(300);
    let tree = SourceTree::new(&[("a.txt", b"first"), ("big.bin", &big), ("z.txt", b"last")]);
    let out = TempDir::new().unwrap();

    let outputs = pack_graphs(out.path(), Some(128), &tree.options()).unwrap();
    // 309 content bytes at 128 per graph.
    assert_eq!(outputs.len(), 3);
    assert!(out.path().join(MANIFEST_INDEX).exists());

    let mut reassembled = Vec::new();
    for output in &outputs {
        let store = MemoryBlockstore::new();
        let file = BufReader::new(File::open(&output.archive).unwrap());
        let roots = ArchiveReader::load(file, &store).unwrap();
        assert_eq!(roots, vec![output.root]);

        if let Ok(cid) = resolve_path(&store, &output.root, "big.bin") {
            read_file(&store, &cid, &mut reassembled).unwrap();
        }
    }
    assert_eq!(reassembled, big);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 4);
}
