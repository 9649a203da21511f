/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Error types returned by the streaming engine.

use std::path::PathBuf;

/// Errors that can occur while loading a graph grid or streaming over it.
///
/// All metadata and I/O errors are fatal to the pass in which they occur;
/// `process` closures passed to [`stream_vertices`](crate::engine::Engine::stream_vertices)
/// or [`stream_edges`](crate::engine::Engine::stream_edges) are assumed
/// total and their errors are not modeled here.
#[derive(thiserror::Error, Debug)]
pub enum GridError {
    /// The `meta` file (or an offset table) is missing from the graph directory.
    #[error("metadata file missing: {path}")]
    MetadataMissing { path: PathBuf },

    /// The `meta` file exists but is malformed (wrong field count, bad
    /// `edge_type`, or non-monotonic offset table).
    #[error("metadata malformed in {path}: {reason}")]
    MetadataMalformed { path: PathBuf, reason: String },

    /// A `block-i-j` auxiliary file is missing.
    #[error("block file missing: {path}")]
    BlockFileMissing { path: PathBuf },

    /// Memory-mapping a stream file failed.
    #[error("failed to map {path}: {source}")]
    IoMapFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read against a stream file failed.
    #[error("read failed on {path} at offset {offset}: {source}")]
    IoReadFailed {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// `hint()` produced a zero-sized partition batch; clamped to 1.
    #[error("working set of {bytes} bytes leaves no room in the memory budget, clamping batch to 1 partition")]
    BudgetTooSmall { bytes: u64 },

    /// `update_mode` was neither 0 (source-oriented) nor 1 (target-oriented).
    #[error("invalid update mode {0}, expected 0 (source-oriented) or 1 (target-oriented)")]
    InvalidUpdateMode(u32),
}

pub type Result<T> = std::result::Result<T, GridError>;
