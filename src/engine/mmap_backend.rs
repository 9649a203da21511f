/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A memory-mapped stream file: file handle, mapping, and cached size in
//! one resource that releases everything on `Drop`.
//!
//! Generalizes `MmapBackend<W>` (a typed word-slice view over an immutable
//! mapping) to a raw byte region opened lazily, with a choice between
//! buffered and direct I/O on the underlying file descriptor.

use std::path::{Path, PathBuf};

use mmap_rs::{Mmap, MmapOptions};

use crate::error::{GridError, Result};

/// Whether to bypass the OS page cache when opening a stream file.
///
/// `O_DIRECT` is a Linux-only concept; on other platforms this degrades to
/// `Buffered` transparently, which is the portable fallback the design
/// notes call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Buffered,
    Direct,
}

#[cfg(target_os = "linux")]
fn open_file(path: &Path, mode: OpenMode) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = std::fs::OpenOptions::new();
    options.read(true);
    if mode == OpenMode::Direct {
        options.custom_flags(libc::O_DIRECT);
    }
    options.open(path)
}

#[cfg(not(target_os = "linux"))]
fn open_file(path: &Path, _mode: OpenMode) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().read(true).open(path)
}

/// A lazily-mapped stream file. Opening maps the whole file read-only and
/// shared across workers; the mapping is released when this value is
/// dropped.
pub struct MappedStream {
    path: PathBuf,
    mmap: Mmap,
    len: usize,
}

impl MappedStream {
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        let file = open_file(path, mode).map_err(|e| GridError::IoMapFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let len = file
            .metadata()
            .map_err(|e| GridError::IoMapFailed {
                path: path.to_path_buf(),
                source: e,
            })?
            .len() as usize;

        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(|e| GridError::IoMapFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::other(e),
                })?
                .with_file(file, 0)
                .map()
                .map_err(|e| GridError::IoMapFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::other(e),
                })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            len,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_slice()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// `Mmap` is `Send + Sync` for read-only mappings of an immutable file; the
// engine never writes through this mapping.
unsafe impl Send for MappedStream {}
unsafe impl Sync for MappedStream {}
