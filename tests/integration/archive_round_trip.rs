use dagcar::archive::ArchiveReader;
use dagcar::manifest::ManifestExtractor;
use dagcar::store::MemoryBlockstore;
use dagcar::tree::node::{DagNode, DirectoryNode};
use dagcar::tree::reader::{read_file, resolve_path};
use dagcar::PackError;
use std::io::Cursor;

use crate::integration::support::{export, SourceTree};

fn sample_tree() -> SourceTree {
    let big: Vec<u8> = (0..500u32).map(|i| (i % 251) as u8).collect();
    SourceTree::new(&[
        ("docs/readme.md", b"# dagcar\n"),
        ("docs/guide/intro.txt", b"start here, then keep reading"),
        ("data/big.bin", &big),
        ("empty", b""),
    ])
}

#[test]
fn manifest_rebuilt_from_archive_matches_export() {
    let tree = sample_tree();
    let files = tree.discovered();
    let (result, archive) = export(&files, &tree.options());

    let store = MemoryBlockstore::new();
    let roots = ArchiveReader::load(Cursor::new(archive), &store).unwrap();
    assert_eq!(roots, vec![result.root]);

    let rebuilt = ManifestExtractor::new(&store).build(&result.root).unwrap();
    assert_eq!(rebuilt, result.manifest);
    assert_eq!(result.manifest.hash, result.root.to_string());
}

#[test]
fn every_file_reads_back_from_archive() {
    let tree = sample_tree();
    let files = tree.discovered();
    let (result, archive) = export(&files, &tree.options());

    let store = MemoryBlockstore::new();
    ArchiveReader::load(Cursor::new(archive), &store).unwrap();

    for desc in &files {
        let relative = desc.path.strip_prefix(tree.root()).unwrap();
        let relative = relative.to_str().unwrap().replace('\\', "/");
        let cid = resolve_path(&store, &result.root, &relative).unwrap();

        let mut content = Vec::new();
        read_file(&store, &cid, &mut content).unwrap();
        assert_eq!(content, std::fs::read(&desc.path).unwrap(), "{}", relative);
    }
}

#[test]
fn manifest_lists_nested_directories() {
    let tree = sample_tree();
    let (result, _) = export(&tree.discovered(), &tree.options());

    let paths: Vec<String> = result.manifest.walk().into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        paths,
        vec![
            "data",
            "data/big.bin",
            "docs",
            "docs/guide",
            "docs/guide/intro.txt",
            "docs/readme.md",
            "empty",
        ]
    );
    // Multi-chunk files are reported as leaves.
    let data = &result.manifest.children[0];
    assert!(data.children[0].children.is_empty());
}

#[test]
fn empty_input_yields_empty_directory_root() {
    let tree = SourceTree::new(&[]);
    let (result, archive) = export(&[], &tree.options());

    let (empty_dir, size) = DagNode::Directory(DirectoryNode::new()).to_block().unwrap();
    assert_eq!(result.root, empty_dir.cid);
    assert!(result.manifest.children.is_empty());
    assert_eq!(result.manifest.size, size);
    assert_eq!(result.stats.blocks, 1);

    let store = MemoryBlockstore::new();
    let roots = ArchiveReader::load(Cursor::new(archive), &store).unwrap();
    assert_eq!(roots, vec![empty_dir.cid]);
}

#[test]
fn truncated_archive_is_rejected() {
    let tree = sample_tree();
    let (_, archive) = export(&tree.discovered(), &tree.options());

    for cut in [3, archive.len() - 1] {
        let err = ArchiveReader::load(Cursor::new(archive[..cut].to_vec()), &MemoryBlockstore::new())
            .unwrap_err();
        assert!(matches!(err, PackError::Archive(_)), "cut at {}: {}", cut, err);
    }
}
