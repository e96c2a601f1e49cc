use dagcar::tree::builder::{build_tree, BuildOptions};
use dagcar::PackError;

use crate::integration::support::{child_names, export, SourceTree};

fn xyz() -> SourceTree {
    SourceTree::new(&[("a/x", b"x"), ("a/y", b"yy"), ("b/z", b"zzz")])
}

#[test]
fn sorted_paths_group_under_shared_directories() {
    let tree = xyz();
    let (result, _) = export(&tree.descriptors(&["a/x", "a/y", "b/z"]), &tree.options());

    let root = &result.manifest;
    assert_eq!(root.name, "");
    assert_eq!(child_names(root), vec!["a", "b"]);
    assert_eq!(child_names(&root.children[0]), vec!["x", "y"]);
    assert_eq!(child_names(&root.children[1]), vec!["z"]);
}

#[test]
fn unsorted_input_reopens_directory_as_second_entry() {
    let tree = xyz();
    let (result, _) = export(&tree.descriptors(&["a/x", "b/z", "a/y"]), &tree.options());

    let root = &result.manifest;
    assert_eq!(child_names(root), vec!["a", "b", "a"]);
    assert_eq!(child_names(&root.children[0]), vec!["x"]);
    assert_eq!(child_names(&root.children[2]), vec!["y"]);
}

#[test]
fn duplicate_paths_are_not_deduplicated() {
    let tree = xyz();
    let (result, _) = export(&tree.descriptors(&["a/x", "a/x"]), &tree.options());

    let a = &result.manifest.children[0];
    assert_eq!(child_names(a), vec!["x", "x"]);
    assert_eq!(a.children[0].hash, a.children[1].hash);
}

#[test]
fn deep_path_then_shallow_sibling() {
    let tree = SourceTree::new(&[("a/b/c/d.txt", b"deep"), ("a/e.txt", b"shallow"), ("f", b"top")]);
    let (result, _) = export(
        &tree.descriptors(&["a/b/c/d.txt", "a/e.txt", "f"]),
        &tree.options(),
    );

    let root = &result.manifest;
    assert_eq!(child_names(root), vec!["a", "f"]);
    let a = &root.children[0];
    assert_eq!(child_names(a), vec!["b", "e.txt"]);
    assert_eq!(child_names(&a.children[0]), vec!["c"]);
    assert_eq!(child_names(&a.children[0].children[0]), vec!["d.txt"]);
}

#[test]
fn single_top_level_file() {
    let tree = SourceTree::new(&[("solo.txt", b"alone")]);
    let (result, _) = export(&tree.descriptors(&["solo.txt"]), &tree.options());
    assert_eq!(child_names(&result.manifest), vec!["solo.txt"]);
    assert_eq!(result.manifest.children[0].size, 5);
}

#[test]
fn cumulative_sizes_add_up() {
    let tree = xyz();
    let (result, _) = export(&tree.descriptors(&["a/x", "a/y", "b/z"]), &tree.options());

    let a = &result.manifest.children[0];
    let leaves: u64 = a.children.iter().map(|c| c.size).sum();
    assert_eq!(leaves, 3);
    assert!(a.size > leaves);
    let top: u64 = result.manifest.children.iter().map(|c| c.size).sum();
    assert!(result.manifest.size > top);
}

#[test]
fn path_outside_root_is_rejected() {
    let tree = xyz();
    let other = SourceTree::new(&[("elsewhere", b"?")]);
    let files = other.descriptors(&["elsewhere"]);

    let store = dagcar::store::MemoryBlockstore::new();
    let options = BuildOptions {
        source_root: tree.root(),
        scratch_dir: None,
        params: Default::default(),
        cancel: Default::default(),
    };
    let err = build_tree(&store, &files, &options).unwrap_err();
    assert!(matches!(err, PackError::InvalidPath(_)));
}

#[test]
fn missing_source_file_is_unavailable() {
    let tree = xyz();
    let mut files = tree.descriptors(&["a/x"]);
    files[0].path = tree.path("a/gone");

    let store = dagcar::store::MemoryBlockstore::new();
    let options = BuildOptions {
        source_root: tree.root(),
        scratch_dir: None,
        params: Default::default(),
        cancel: Default::default(),
    };
    let err = build_tree(&store, &files, &options).unwrap_err();
    assert!(matches!(err, PackError::SourceUnavailable { .. }));
}
