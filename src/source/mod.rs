//! Input descriptors and the readers that turn them into byte streams.

pub mod range;
pub mod scratch;
pub mod walk;

use crate::error::PackError;
use range::RangeReader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// One leaf to ingest: a whole file or the byte range `[start, end)` of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub size: u64,
    #[serde(default)]
    pub start: u64,
    /// Exclusive end; `0` means `size`.
    #[serde(default)]
    pub end: u64,
}

impl FileDescriptor {
    /// Descriptor for a whole file.
    pub fn whole(path: impl Into<PathBuf>, size: u64) -> Self {
        FileDescriptor {
            path: path.into(),
            size,
            start: 0,
            end: size,
        }
    }

    pub fn range(path: impl Into<PathBuf>, size: u64, start: u64, end: u64) -> Self {
        FileDescriptor {
            path: path.into(),
            size,
            start,
            end,
        }
    }

    /// Copy with `end` defaulted and `0 <= start <= end <= size` checked.
    pub fn normalized(&self) -> Result<Self, PackError> {
        let end = if self.end == 0 { self.size } else { self.end };
        if self.start > end || end > self.size {
            return Err(PackError::InvalidRange {
                path: self.path.clone(),
                start: self.start,
                end,
                size: self.size,
            });
        }
        Ok(FileDescriptor {
            end,
            ..self.clone()
        })
    }

    pub fn len(&self) -> u64 {
        let end = if self.end == 0 { self.size } else { self.end };
        end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the descriptor covers the entire file.
    pub fn is_whole(&self) -> bool {
        self.start == 0 && (self.end == 0 || self.end == self.size)
    }

    /// Open a stream over the described bytes.
    ///
    /// Whole files are read directly; sub-ranges go through [`RangeReader`].
    pub fn open(&self) -> Result<Box<dyn Read>, PackError> {
        let file = File::open(&self.path).map_err(|e| PackError::SourceUnavailable {
            path: self.path.clone(),
            source: e,
        })?;
        if self.is_whole() {
            Ok(Box::new(file))
        } else {
            Ok(Box::new(RangeReader::new(
                file, self.start, self.end, self.size,
            )))
        }
    }
}

/// Split `path` relative to `root` into segment names, the empty root segment first.
pub fn path_segments(root: &Path, path: &Path) -> Result<Vec<String>, PackError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PackError::InvalidPath(path.to_path_buf()))?;

    let mut segments = vec![String::new()];
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| PackError::InvalidPath(path.to_path_buf()))?;
                segments.push(name.to_string());
            }
            Component::CurDir => {}
            _ => return Err(PackError::InvalidPath(path.to_path_buf())),
        }
    }
    if segments.len() == 1 {
        // The root itself is not a leaf.
        return Err(PackError::InvalidPath(path.to_path_buf()));
    }
    Ok(segments)
}

/// Make `path` absolute without resolving symlinks past what the OS requires.
pub fn absolute(path: &Path) -> Result<PathBuf, PackError> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(clean(&abs))
}

/// Lexically normalize `.` and `..` components.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
