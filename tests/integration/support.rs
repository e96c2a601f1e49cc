//! Shared fixtures: a temporary source tree and one-call export helpers.

use dagcar::export::{generate_archive, ExportOptions, ExportResult};
use dagcar::source::walk::collect_files;
use dagcar::source::FileDescriptor;
use dagcar::tree::DagParams;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    /// Create `files` (slash-separated relative path, content) under a fresh directory.
    pub fn new(files: &[(&str, &[u8])]) -> Self {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        SourceTree { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Whole-file descriptors in discovery order.
    pub fn discovered(&self) -> Vec<FileDescriptor> {
        collect_files(self.root()).unwrap()
    }

    /// Whole-file descriptors for `relative` paths, in the order given.
    pub fn descriptors(&self, relative: &[&str]) -> Vec<FileDescriptor> {
        relative
            .iter()
            .map(|r| {
                let path = self.path(r);
                let size = fs::metadata(&path).unwrap().len();
                FileDescriptor::whole(path, size)
            })
            .collect()
    }

    pub fn options(&self) -> ExportOptions {
        let mut options = ExportOptions::new(self.root());
        options.params = small_params();
        options
    }
}

/// Small enough that a few hundred bytes already produce multi-level files.
pub fn small_params() -> DagParams {
    DagParams {
        chunk_size: 8,
        max_links: 3,
    }
}

pub fn export(files: &[FileDescriptor], options: &ExportOptions) -> (ExportResult, Vec<u8>) {
    let mut archive = Vec::new();
    let result = generate_archive(files, options, &mut archive).unwrap();
    (result, archive)
}

pub fn child_names(node: &dagcar::FsNode) -> Vec<&str> {
    node.children.iter().map(|c| c.name.as_str()).collect()
}
