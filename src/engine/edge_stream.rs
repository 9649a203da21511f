/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel edge-centric fold over the row or column stream, with
//! bitmap-driven shard skipping and, in target-oriented mode, a
//! partition-batch windowed traversal of the source axis.
//!
//! Grounded directly on `Graph::stream_edges` in the original format's
//! reference implementation: the same shard-skip pre-pass, the same
//! `row_offset`/`column_offset` task-chunking loops, and the same
//! source-window bound check guarding target-oriented mode, reworked onto
//! [`run_edge_workers`](crate::engine::worker::run_edge_workers)'s scoped
//! worker pool instead of a raw queue-plus-sentinel loop.

use rayon::prelude::*;

use crate::engine::accumulate::Accumulate;
use crate::engine::bitmap::Bitmap;
use crate::engine::edge::{Edge, EdgeType};
use crate::engine::mmap_backend::OpenMode;
use crate::engine::partition::partition_range;
use crate::engine::planner::{emit_block_tasks, IoRange};
use crate::engine::worker::run_edge_workers;
use crate::engine::{Engine, UpdateMode};
use crate::error::Result;

impl Engine {
    /// Parallel fold of `process(edge)` over every edge whose source
    /// partition is active, optionally restricted further to sources with
    /// `bitmap` set. `pre`/`post` fire once per source-partition-batch
    /// window in [`UpdateMode::TargetOriented`] (the default mode, and the
    /// only one that windows); they never fire in
    /// [`UpdateMode::SourceOriented`].
    ///
    /// Returns the folded value alongside `read_bytes`: the total number of
    /// bytes copied out of the mapping across all workers and (in
    /// `TargetOriented` mode) all windows, exposed for diagnostics.
    #[allow(clippy::too_many_arguments)]
    pub fn stream_edges<T, P>(
        &self,
        process: P,
        bitmap: Option<&Bitmap>,
        zero: T,
        mode: UpdateMode,
        mut pre: impl FnMut(u64, u64),
        mut post: impl FnMut(u64, u64),
    ) -> Result<(T, u64)>
    where
        T: Accumulate,
        P: Fn(Edge) -> T + Sync,
    {
        let partitions = self.meta.partitions;
        let vertices = self.meta.vertices;
        let edge_type = self.meta.edge_type;
        let page_size = edge_type.page_size();
        let active = self.active_shards(bitmap);
        let open_mode = self.open_mode(&active);

        match mode {
            UpdateMode::SourceOriented => {
                self.with_row_stream(open_mode, |stream| {
                    let region = stream.as_bytes();
                    let emit = move |tx: crossbeam_channel::Sender<IoRange>| {
                        let mut cursor = 0u64;
                        let mut buf = Vec::new();
                        for i in 0..partitions {
                            if !active[i as usize] {
                                continue;
                            }
                            for j in 0..partitions {
                                let (begin, end) = self.meta.block_row_range(i, j);
                                buf.clear();
                                emit_block_tasks(&mut cursor, begin as u64, end as u64, page_size, &mut buf);
                                for task in buf.drain(..) {
                                    if tx.send(task).is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                    };
                    let filter = move |e: &Edge| bitmap.map_or(true, |b| b.get(e.source as u64));
                    let (value, read_bytes) = run_edge_workers(
                        &self.thread_pool,
                        self.parallelism,
                        emit,
                        region,
                        edge_type,
                        filter,
                        &process,
                    );
                    Ok((zero + value, read_bytes))
                })
            }
            UpdateMode::TargetOriented => {
                let mut total = zero;
                let mut total_read_bytes = 0u64;
                let mut cur = 0u32;
                while cur < partitions {
                    let batch = self.partition_batch.max(1);
                    let window_begin = partition_range(partitions, vertices, cur).0;
                    let window_end_partition = (cur + batch).min(partitions);
                    let window_end = if window_end_partition >= partitions {
                        vertices
                    } else {
                        partition_range(partitions, vertices, window_end_partition).0
                    };

                    pre(window_begin, window_end);

                    let active = &active;
                    let value = self.with_column_stream(open_mode, |stream| {
                        let region = stream.as_bytes();
                        let emit = move |tx: crossbeam_channel::Sender<IoRange>| {
                            let mut cursor = 0u64;
                            let mut buf = Vec::new();
                            for j in 0..partitions {
                                for i in cur..window_end_partition {
                                    if !active[i as usize] {
                                        continue;
                                    }
                                    let (begin, end) = self.meta.block_column_range(j, i);
                                    buf.clear();
                                    emit_block_tasks(&mut cursor, begin as u64, end as u64, page_size, &mut buf);
                                    for task in buf.drain(..) {
                                        if tx.send(task).is_err() {
                                            return;
                                        }
                                    }
                                }
                            }
                        };
                        let filter = move |e: &Edge| {
                            let source = e.source as u64;
                            if source < window_begin || source >= window_end {
                                return false;
                            }
                            bitmap.map_or(true, |b| b.get(source))
                        };
                        let (value, read_bytes) = run_edge_workers(
                            &self.thread_pool,
                            self.parallelism,
                            emit,
                            region,
                            edge_type,
                            filter,
                            &process,
                        );
                        Ok((value, read_bytes))
                    })?;
                    total = total + value.0;
                    total_read_bytes += value.1;

                    post(window_begin, window_end);
                    cur += batch;
                }
                Ok((total, total_read_bytes))
            }
        }
    }

    /// Convenience wrapper for the common unbatched call shape, defaulting
    /// to [`UpdateMode::TargetOriented`] (the column stream), matching the
    /// source format's own default. Returns `(value, read_bytes)`, same as
    /// [`stream_edges`](Self::stream_edges).
    pub fn stream_edges_simple<T, P>(
        &self,
        process: P,
        bitmap: Option<&Bitmap>,
        zero: T,
    ) -> Result<(T, u64)>
    where
        T: Accumulate,
        P: Fn(Edge) -> T + Sync,
    {
        self.stream_edges(
            process,
            bitmap,
            zero,
            UpdateMode::TargetOriented,
            |_, _| {},
            |_, _| {},
        )
    }

    /// Determines, per source partition, whether any vertex in its range
    /// has its bit set in `bitmap` — `None` means every partition is
    /// active. Run across the engine's thread pool since a partition can
    /// span many bitmap words.
    fn active_shards(&self, bitmap: Option<&Bitmap>) -> Vec<bool> {
        let partitions = self.meta.partitions;
        match bitmap {
            None => vec![true; partitions as usize],
            Some(bitmap) => {
                let vertices = self.meta.vertices;
                self.thread_pool.install(|| {
                    (0..partitions)
                        .into_par_iter()
                        .map(|p| {
                            let (begin, end) = partition_range(partitions, vertices, p);
                            bitmap.any_set_in_range(begin, end)
                        })
                        .collect()
                })
            }
        }
    }
}
