//! Archive export
//!
//! Orchestrates one packaging run: set up a scratch block store, build the directory tree
//! from the descriptors, write every reachable block to the sink, then read the manifest
//! back out of the same store. [`pack_graphs`] repeats that per planned graph and writes
//! the archives to disk.

use crate::archive::{write_archive, ArchiveStats};
use crate::concurrency::CancelToken;
use crate::error::PackError;
use crate::manifest::{FsNode, ManifestExtractor};
use crate::source::walk::{collect_files, plan_graphs};
use crate::source::{absolute, FileDescriptor};
use crate::store::{Blockstore, FileStore, MemoryBlockstore, SledBlockstore};
use crate::tree::{build_tree, BuildOptions, DagParams};
use crate::types::Cid;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File name of the per-run manifest index written by [`pack_graphs`].
pub const MANIFEST_INDEX: &str = "manifest.jsonl";

/// Archive file extension.
pub const ARCHIVE_EXTENSION: &str = "car";

/// Backing store for the blocks of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    /// sled database at the given directory, or a temporary one.
    Disk(Option<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub source_root: PathBuf,
    pub scratch_dir: Option<PathBuf>,
    pub params: DagParams,
    pub backend: StoreBackend,
    /// Hold raw leaves by reference into their source files instead of copying them.
    pub no_copy: bool,
    pub cancel: CancelToken,
}

impl ExportOptions {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        ExportOptions {
            source_root: source_root.into(),
            scratch_dir: None,
            params: DagParams::default(),
            backend: StoreBackend::Memory,
            no_copy: false,
            cancel: CancelToken::new(),
        }
    }

    /// Root that no-copy references are recorded against.
    fn reference_root(&self) -> &Path {
        self.scratch_dir.as_deref().unwrap_or(&self.source_root)
    }

    fn open_store(&self) -> Result<Box<dyn Blockstore>, PackError> {
        let base: Box<dyn Blockstore> = match &self.backend {
            StoreBackend::Memory => Box::new(MemoryBlockstore::new()),
            StoreBackend::Disk(Some(path)) => Box::new(SledBlockstore::open(path)?),
            StoreBackend::Disk(None) => Box::new(SledBlockstore::temporary()?),
        };
        if self.no_copy {
            Ok(Box::new(FileStore::new(base, self.reference_root())))
        } else {
            Ok(base)
        }
    }
}

/// Outcome of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub root: Cid,
    pub manifest: FsNode,
    pub stats: ArchiveStats,
}

/// Build the tree for `files`, write its archive into `out` and return the manifest.
///
/// Nothing is written to `out` until the whole tree has been committed. A failure while
/// writing leaves a partial archive in `out`; callers that need atomicity write to a
/// temporary location first, as [`pack_graphs`] does.
pub fn generate_archive<W: Write>(
    files: &[FileDescriptor],
    options: &ExportOptions,
    out: W,
) -> Result<ExportResult, PackError> {
    options.params.validate()?;
    let store = options.open_store()?;

    let build = BuildOptions {
        source_root: &options.source_root,
        scratch_dir: options.scratch_dir.as_deref(),
        params: options.params,
        cancel: options.cancel.clone(),
    };
    let tree = build_tree(&store, files, &build)?;
    options.cancel.check()?;

    let stats = write_archive(&store, &tree.cid, out)?;
    let manifest = ManifestExtractor::new(&store).build(&tree.cid)?;

    info!(
        root = %tree.cid,
        files = files.len(),
        blocks = stats.blocks,
        archive_bytes = stats.archive_bytes,
        "Exported archive"
    );
    Ok(ExportResult {
        root: tree.cid,
        manifest,
        stats,
    })
}

/// One archive produced by [`pack_graphs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphOutput {
    pub index: usize,
    pub root: Cid,
    pub archive: PathBuf,
    pub files: usize,
    pub bytes: u64,
    pub manifest: FsNode,
}

/// Discover every file under `options.source_root`, split the set into graphs of at most
/// `slice_size` range bytes, and write one archive per graph into `out_dir`.
///
/// Archives are named `<root>.car` and only appear once complete. A `manifest.jsonl` index
/// with one line per graph is written last.
pub fn pack_graphs(
    out_dir: &Path,
    slice_size: Option<u64>,
    options: &ExportOptions,
) -> Result<Vec<GraphOutput>, PackError> {
    let mut options = options.clone();
    options.source_root = canonical(&options.source_root)?;
    if let Some(scratch) = &options.scratch_dir {
        fs::create_dir_all(scratch)?;
        options.scratch_dir = Some(canonical(scratch)?);
    }

    let files = collect_files(&options.source_root)?;
    let graphs = plan_graphs(&files, slice_size)?;
    fs::create_dir_all(out_dir)?;
    info!(
        source = %options.source_root.display(),
        files = files.len(),
        graphs = graphs.len(),
        "Packing source"
    );

    let mut outputs = Vec::with_capacity(graphs.len());
    for (index, graph) in graphs.iter().enumerate() {
        options.cancel.check()?;
        let mut tmp = NamedTempFile::new_in(out_dir)?;
        let result = {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let result = generate_archive(graph, &options, &mut writer)?;
            writer.flush()?;
            result
        };
        tmp.as_file().sync_all()?;

        let archive = out_dir.join(format!("{}.{}", result.root, ARCHIVE_EXTENSION));
        tmp.persist(&archive).map_err(|e| PackError::Io(e.error))?;
        debug!(index, archive = %archive.display(), "Persisted archive");

        outputs.push(GraphOutput {
            index,
            root: result.root,
            archive,
            files: graph.len(),
            bytes: graph.iter().map(FileDescriptor::len).sum(),
            manifest: result.manifest,
        });
    }

    write_index(out_dir, &outputs)?;
    Ok(outputs)
}

/// Resolve symlinks so descriptor paths, scratch copies and no-copy references all share
/// one prefix. Without UNC prefixes on Windows.
fn canonical(path: &Path) -> Result<PathBuf, PackError> {
    dunce::canonicalize(absolute(path)?).map_err(|e| PackError::SourceUnavailable {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_index(out_dir: &Path, outputs: &[GraphOutput]) -> Result<(), PackError> {
    let mut tmp = NamedTempFile::new_in(out_dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for output in outputs {
            serde_json::to_writer(&mut writer, output)
                .map_err(|e| PackError::Io(e.into()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    tmp.persist(out_dir.join(MANIFEST_INDEX))
        .map_err(|e| PackError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveReader;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn source() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("docs/b.txt"), b"bravo bravo").unwrap();
        fs::write(dir.path().join("top.bin"), vec![7u8; 300]).unwrap();
        dir
    }

    #[test]
    fn test_generate_archive_manifest_matches_archive() {
        let src = source();
        let files = collect_files(src.path()).unwrap();
        let options = ExportOptions::new(src.path());

        let mut out = Vec::new();
        let result = generate_archive(&files, &options, &mut out).unwrap();
        assert_eq!(result.stats.archive_bytes, out.len() as u64);

        let names: Vec<&str> = result.manifest.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "top.bin"]);

        let store = MemoryBlockstore::new();
        let roots = ArchiveReader::load(Cursor::new(out), &store).unwrap();
        assert_eq!(roots, vec![result.root]);
        let rebuilt = ManifestExtractor::new(&store).build(&result.root).unwrap();
        assert_eq!(rebuilt, result.manifest);
    }

    #[test]
    fn test_cancelled_export_writes_nothing() {
        let src = source();
        let files = collect_files(src.path()).unwrap();
        let options = ExportOptions::new(src.path());
        options.cancel.cancel();

        let mut out = Vec::new();
        let err = generate_archive(&files, &options, &mut out).unwrap_err();
        assert!(matches!(err, PackError::Cancelled));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unusable_params_fail_before_building() {
        let src = source();
        let files = collect_files(src.path()).unwrap();
        for params in [
            DagParams {
                chunk_size: 8,
                max_links: 1,
            },
            DagParams {
                chunk_size: 0,
                max_links: 4,
            },
        ] {
            let mut options = ExportOptions::new(src.path());
            options.params = params;
            let mut out = Vec::new();
            let err = generate_archive(&files, &options, &mut out).unwrap_err();
            assert!(matches!(err, PackError::ConfigError(_)), "{:?}", params);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_pack_graphs_writes_named_archives_and_index() {
        let src = source();
        let out = TempDir::new().unwrap();
        let mut options = ExportOptions::new(src.path());
        options.params = DagParams {
            chunk_size: 64,
            max_links: 4,
        };

        let outputs = pack_graphs(out.path(), Some(200), &options).unwrap();
        // 316 bytes at 200 per graph.
        assert_eq!(outputs.len(), 2);
        for output in &outputs {
            assert!(output.archive.exists());
            assert_eq!(
                output.archive.file_name().unwrap().to_str().unwrap(),
                format!("{}.car", output.root)
            );
        }
        assert_eq!(outputs.iter().map(|o| o.bytes).sum::<u64>(), 316);

        let index = fs::read_to_string(out.path().join(MANIFEST_INDEX)).unwrap();
        assert_eq!(index.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(index.lines().next().unwrap()).unwrap();
        assert_eq!(first["root"], outputs[0].root.to_string());
        assert_eq!(first["manifest"]["Name"], "");
    }
}
