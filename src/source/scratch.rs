//! Copy-before-ingest: materialize a descriptor's range as its own file.

use super::FileDescriptor;
use crate::error::PackError;
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Copy `desc`'s bytes to `scratch_dir/relative` and return a whole-file descriptor for
/// the copy.
///
/// `desc` must already be normalized.
pub fn materialize(
    desc: &FileDescriptor,
    relative: &Path,
    scratch_dir: &Path,
) -> Result<FileDescriptor, PackError> {
    let target = scratch_dir.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let unavailable = |e: io::Error| PackError::SourceUnavailable {
        path: desc.path.clone(),
        source: e,
    };
    let mut source = File::open(&desc.path).map_err(unavailable)?;
    source.seek(SeekFrom::Start(desc.start)).map_err(unavailable)?;

    let want = desc.end - desc.start;
    let mut destination = File::create(&target)?;
    let copied = io::copy(&mut io::Read::take(&mut source, want), &mut destination)?;
    if copied != want {
        return Err(PackError::OutOfBounds {
            start: desc.start,
            end: desc.end,
            offset: desc.start + copied,
        });
    }
    destination.sync_all()?;

    debug!(
        source = %desc.path.display(),
        target = %target.display(),
        bytes = copied,
        "Copied slice to scratch"
    );
    Ok(FileDescriptor::whole(target, want))
}
