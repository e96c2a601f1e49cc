use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;

use crate::integration::support::{export, SourceTree};

#[test]
fn same_input_same_root() {
    let files: &[(&str, &[u8])] = &[("x/a", b"alpha"), ("x/b", b"bravo"), ("y", b"yankee")];
    let first = SourceTree::new(files);
    let second = SourceTree::new(files);

    let (a, archive_a) = export(&first.discovered(), &first.options());
    let (b, archive_b) = export(&first.discovered(), &first.options());
    let (c, archive_c) = export(&second.discovered(), &second.options());

    assert_eq!(a.root, b.root);
    // Identity depends on relative paths only, not where the source lives.
    assert_eq!(a.root, c.root);
    assert_eq!(archive_a, archive_b);
    assert_eq!(archive_a, archive_c);
}

#[test]
fn content_change_changes_root() {
    let tree = SourceTree::new(&[("d/f", b"before")]);
    let (before, _) = export(&tree.discovered(), &tree.options());
    fs::write(tree.path("d/f"), b"after!").unwrap();
    let (after, _) = export(&tree.discovered(), &tree.options());

    assert_ne!(before.root, after.root);
    assert_ne!(before.manifest.children[0].hash, after.manifest.children[0].hash);
}

#[test]
fn layout_params_are_part_of_identity() {
    let data = vec![42u8; 100];
    let tree = SourceTree::new(&[("f", &data)]);
    let mut options = tree.options();
    let (narrow, _) = export(&tree.discovered(), &options);
    options.params.max_links = 16;
    let (wide, _) = export(&tree.discovered(), &options);
    assert_ne!(narrow.root, wide.root);
}

fn file_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    let name = prop::sample::select(vec!["a", "b", "c"]);
    let path = prop::collection::vec(name, 1..4).prop_map(|segs| segs.join("/"));
    prop::collection::btree_map(path, prop::collection::vec(any::<u8>(), 0..64), 0..8)
}

/// Drop paths that would need a file and a directory with the same name.
fn without_conflicts(files: BTreeMap<String, Vec<u8>>) -> Vec<(String, Vec<u8>)> {
    let mut kept: Vec<(String, Vec<u8>)> = Vec::new();
    for (path, content) in files {
        let clashes = kept.iter().any(|(other, _)| {
            path.starts_with(&format!("{}/", other)) || other.starts_with(&format!("{}/", path))
        });
        if !clashes {
            kept.push((path, content));
        }
    }
    kept
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_trees_are_deterministic_and_readable(files in file_set()) {
        let files = without_conflicts(files);
        let entries: Vec<(&str, &[u8])> =
            files.iter().map(|(p, c)| (p.as_str(), c.as_slice())).collect();
        let tree = SourceTree::new(&entries);
        let discovered = tree.discovered();
        prop_assert_eq!(discovered.len(), files.len());

        let (first, archive_first) = export(&discovered, &tree.options());
        let (second, archive_second) = export(&discovered, &tree.options());
        prop_assert_eq!(first.root, second.root);
        prop_assert_eq!(&archive_first, &archive_second);

        let leaves: Vec<String> = first
            .manifest
            .walk()
            .into_iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(path, _)| path)
            .collect();
        let expected: Vec<String> = files.iter().map(|(p, _)| p.clone()).collect();
        prop_assert_eq!(leaves, expected);
    }
}
