/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Engine construction, teardown, and stream lifetime — the glue that
//! wires the grid metadata, the lazily-mapped row/column streams, and a
//! persistent worker thread pool together.

pub mod accumulate;
pub mod bitmap;
pub mod edge;
pub mod edge_stream;
pub mod metadata;
pub mod mmap_backend;
pub mod partition;
pub mod planner;
pub mod scratch;
pub mod vertex_stream;
pub mod worker;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::engine::bitmap::Bitmap;
use crate::engine::metadata::GridMetadata;
use crate::engine::mmap_backend::{MappedStream, OpenMode};
use crate::error::Result;

pub use planner::VectorDescriptor;

/// Which on-disk stream an edge-streaming pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Reads the row stream, grouped by source partition.
    SourceOriented,
    /// Reads the column stream, grouped by target partition. Default.
    TargetOriented,
}

/// Assumed-unbounded default, matching the source's own "assume RAM
/// capacity is very large" placeholder until a caller calls
/// [`Engine::set_memory_bytes`].
const DEFAULT_MEMORY_BYTES: u64 = 1024 * 1024 * 1024 * 1024;

/// A single engine instance bound to one on-disk graph directory for its
/// lifetime. Offset tables and block sizes are loaded eagerly at
/// construction; the row and column streams are mapped lazily on first use
/// of the corresponding update mode, and released when the engine is
/// dropped.
pub struct Engine {
    path: PathBuf,
    meta: GridMetadata,
    memory_bytes: u64,
    vertex_data_bytes: u64,
    partition_batch: u32,
    parallelism: usize,
    thread_pool: rayon::ThreadPool,
    row_stream: Mutex<Option<MappedStream>>,
    column_stream: Mutex<Option<MappedStream>>,
}

impl Engine {
    /// Opens the graph directory at `path`, reading and validating its
    /// grid descriptor. Fails fatally on missing or malformed metadata.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = GridMetadata::load(&path)?;
        let parallelism = num_cpus::get();
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .build()
            .expect("failed to start worker thread pool");

        log::info!(
            "opened grid at {}: {} vertices, {} edges, {} partitions, {:?}",
            path.display(),
            meta.vertices,
            meta.edges,
            meta.partitions,
            meta.edge_type,
        );

        let partitions = meta.partitions;
        Ok(Self {
            path,
            meta,
            memory_bytes: DEFAULT_MEMORY_BYTES,
            vertex_data_bytes: 0,
            partition_batch: partitions,
            parallelism,
            thread_pool,
            row_stream: Mutex::new(None),
            column_stream: Mutex::new(None),
        })
    }

    pub fn vertices(&self) -> u64 {
        self.meta.vertices
    }

    pub fn edges(&self) -> u64 {
        self.meta.edges
    }

    pub fn partitions(&self) -> u32 {
        self.meta.partitions
    }

    pub fn set_memory_bytes(&mut self, memory_bytes: u64) {
        self.memory_bytes = memory_bytes;
    }

    pub fn set_vertex_data_bytes(&mut self, vertex_data_bytes: u64) {
        self.vertex_data_bytes = vertex_data_bytes;
    }

    /// Allocates a fresh, all-clear bitmap sized to this graph's vertex
    /// count. Ownership belongs to the caller; the engine only ever
    /// borrows bitmaps passed back into `stream_vertices`/`stream_edges`.
    pub fn alloc_bitmap(&self) -> Bitmap {
        Bitmap::new(self.meta.vertices)
    }

    /// Declares the per-vertex working-set size about to be paged through
    /// a batched pass, and resizes `partition_batch` so that one window's
    /// worth fits within 80% of the memory budget.
    pub fn hint(&mut self, descriptors: &[VectorDescriptor]) {
        let (batch, bytes) = planner::batch_size(descriptors, self.meta.partitions, self.memory_bytes);
        if bytes > 0 && batch == 1 && self.meta.partitions > 1 {
            log::warn!(
                "working set of {bytes} bytes barely fits the memory budget; \
                 partition_batch clamped to 1"
            );
        }
        self.partition_batch = batch;
    }

    fn should_use_batched_vertex_mode(&self) -> bool {
        self.vertex_data_bytes as f64 > 0.8 * self.memory_bytes as f64
    }

    fn active_bytes(&self, active: &[bool]) -> u64 {
        self.meta
            .block_sizes
            .iter()
            .zip(active.iter())
            .filter(|(_, &is_active)| is_active)
            .map(|(row, _)| row.iter().sum::<u64>())
            .sum()
    }

    fn open_mode(&self, active: &[bool]) -> OpenMode {
        if self.active_bytes(active) > self.memory_bytes {
            OpenMode::Direct
        } else {
            OpenMode::Buffered
        }
    }

    fn row_path(&self) -> PathBuf {
        self.path.join("row")
    }

    fn column_path(&self) -> PathBuf {
        self.path.join("column")
    }

    /// Returns the row stream, mapping it on first use and reusing the
    /// cached mapping afterwards.
    fn with_row_stream<T>(&self, mode: OpenMode, f: impl FnOnce(&MappedStream) -> Result<T>) -> Result<T> {
        let mut guard = self.row_stream.lock().unwrap();
        if guard.is_none() {
            *guard = Some(MappedStream::open(&self.row_path(), mode)?);
        }
        f(guard.as_ref().unwrap())
    }

    /// Returns the column stream, mapping it on first use and reusing the
    /// cached mapping afterwards (the column stream is the default mode,
    /// so this is the one most passes pay the mapping cost for exactly
    /// once).
    fn with_column_stream<T>(&self, mode: OpenMode, f: impl FnOnce(&MappedStream) -> Result<T>) -> Result<T> {
        let mut guard = self.column_stream.lock().unwrap();
        if guard.is_none() {
            *guard = Some(MappedStream::open(&self.column_path(), mode)?);
        }
        f(guard.as_ref().unwrap())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::engine::edge::EdgeType;
    use std::io::Write;
    use std::path::Path;

    /// Builds a minimal on-disk grid from a plain edge list, partitioned
    /// by `partitions`, writing both the row and column streams plus both
    /// offset tables and (empty) block accounting files.
    pub fn write_grid(
        dir: &Path,
        vertices: u64,
        partitions: u32,
        edge_type: EdgeType,
        edges: &[(u32, u32, Option<f32>)],
    ) {
        let p = partitions as usize;
        let mut blocks: Vec<Vec<Vec<u8>>> = vec![vec![Vec::new(); p]; p];

        let part_of = |v: u32| -> usize {
            let (begin, end) = crate::engine::partition_for_test(partitions, vertices);
            for (idx, (b, e)) in begin.iter().zip(end.iter()).enumerate() {
                if (v as u64) >= *b && (v as u64) < *e {
                    return idx;
                }
            }
            p - 1
        };

        for &(s, t, w) in edges {
            let i = part_of(s);
            let j = part_of(t);
            let mut rec = Vec::new();
            rec.extend_from_slice(&s.to_le_bytes());
            rec.extend_from_slice(&t.to_le_bytes());
            if let (EdgeType::Weighted, Some(w)) = (edge_type, w) {
                rec.extend_from_slice(&w.to_le_bytes());
            }
            blocks[i][j].extend_from_slice(&rec);
        }

        let mut row_offset = vec![0i64; p * p + 1];
        let mut row_bytes = Vec::new();
        let mut k = 0;
        for i in 0..p {
            for j in 0..p {
                row_offset[k] = row_bytes.len() as i64;
                row_bytes.extend_from_slice(&blocks[i][j]);
                k += 1;
            }
        }
        row_offset[p * p] = row_bytes.len() as i64;

        let mut column_offset = vec![0i64; p * p + 1];
        let mut column_bytes = Vec::new();
        let mut k = 0;
        for j in 0..p {
            for i in 0..p {
                column_offset[k] = column_bytes.len() as i64;
                column_bytes.extend_from_slice(&blocks[i][j]);
                k += 1;
            }
        }
        column_offset[p * p] = column_bytes.len() as i64;

        std::fs::write(
            dir.join("meta"),
            format!(
                "{} {} {} {}\n",
                if matches!(edge_type, EdgeType::Weighted) { 1 } else { 0 },
                vertices,
                edges.len(),
                partitions
            ),
        )
        .unwrap();

        let mut write_table = |name: &str, table: &[i64]| {
            let mut f = std::fs::File::create(dir.join(name)).unwrap();
            for v in table {
                f.write_all(&v.to_le_bytes()).unwrap();
            }
        };
        write_table("row_offset", &row_offset);
        write_table("column_offset", &column_offset);
        std::fs::write(dir.join("row"), &row_bytes).unwrap();
        std::fs::write(dir.join("column"), &column_bytes).unwrap();

        for i in 0..p {
            for j in 0..p {
                std::fs::write(
                    dir.join(format!("block-{i}-{j}")),
                    &blocks[i][j],
                )
                .unwrap();
            }
        }
    }
}

#[cfg(test)]
fn partition_for_test(partitions: u32, vertices: u64) -> (Vec<u64>, Vec<u64>) {
    let mut begin = Vec::new();
    let mut end = Vec::new();
    for p in 0..partitions {
        let (b, e) = partition::partition_range(partitions, vertices, p);
        begin.push(b);
        end.push(e);
    }
    (begin, end)
}
