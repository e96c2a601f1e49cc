//! Directory discovery and graph planning.
//!
//! Discovery yields whole-file descriptors in the order the tree builder requires
//! (file-name order at every level, so files sharing a directory are contiguous).
//! Planning cuts that list into graphs whose byte totals fit a slice budget, splitting a
//! file across consecutive graphs when it straddles a boundary.

use super::FileDescriptor;
use crate::error::PackError;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Enumerate regular files under `root` in builder order. Symlinks are not followed.
pub fn collect_files(root: &Path) -> Result<Vec<FileDescriptor>, PackError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PackError::SourceUnavailable {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| PackError::SourceUnavailable {
            path: entry.path().to_path_buf(),
            source: e.into(),
        })?;
        files.push(FileDescriptor::whole(entry.path(), metadata.len()));
    }
    debug!(root = %root.display(), files = files.len(), "Collected source files");
    Ok(files)
}

/// Partition `files` into graphs of at most `slice_size` range bytes each.
///
/// `None` puts everything into one graph. Empty files join the current graph without
/// consuming budget. Order is preserved, so every graph stays sorted.
pub fn plan_graphs(
    files: &[FileDescriptor],
    slice_size: Option<u64>,
) -> Result<Vec<Vec<FileDescriptor>>, PackError> {
    let slice_size = match slice_size {
        None => return Ok(vec![files.to_vec()]),
        Some(0) => {
            return Err(PackError::ConfigError(
                "slice size must be greater than zero".to_string(),
            ))
        }
        Some(n) => n,
    };

    let mut graphs = Vec::new();
    let mut current: Vec<FileDescriptor> = Vec::new();
    let mut used = 0u64;

    for file in files {
        let file = file.normalized()?;
        if file.is_empty() {
            current.push(file);
            continue;
        }

        let mut start = file.start;
        while start < file.end {
            if used == slice_size {
                graphs.push(std::mem::take(&mut current));
                used = 0;
            }
            let take = (file.end - start).min(slice_size - used);
            current.push(FileDescriptor::range(
                file.path.clone(),
                file.size,
                start,
                start + take,
            ));
            used += take;
            start += take;
        }
    }
    if !current.is_empty() || graphs.is_empty() {
        graphs.push(current);
    }
    Ok(graphs)
}
