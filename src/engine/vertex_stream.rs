/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel vertex-centric fold over all (or bitmap-selected) vertices,
//! with an optional batched mode for working sets that exceed the memory
//! budget.
//!
//! The per-partition dynamic work assignment — an atomic cursor handed
//! out in partition-sized chunks, thread-local partial folding, one
//! atomic fold into the shared result at partition exit — mirrors
//! `SequentialLabelling::par_graph_apply` (`src/traits/labelling.rs`),
//! specialized here to partition ranges and optional bitmap filtering
//! instead of raw contiguous node ranges.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::engine::accumulate::Accumulate;
use crate::engine::bitmap::Bitmap;
use crate::engine::partition::partition_range;
use crate::engine::Engine;

impl Engine {
    /// Parallel fold of `process(v)` over vertices, optionally restricted
    /// to the ones set in `bitmap`. Enters batched mode automatically when
    /// no bitmap is given and the declared vertex-state size exceeds 80%
    /// of the memory budget; `pre`/`post` are only called in that mode,
    /// once per partition-batch window, and the windows they see are
    /// contiguous and tile `[0, vertices)`.
    pub fn stream_vertices<T, P>(
        &self,
        process: P,
        bitmap: Option<&Bitmap>,
        zero: T,
        mut pre: impl FnMut(u64, u64),
        mut post: impl FnMut(u64, u64),
    ) -> T
    where
        T: Accumulate,
        P: Fn(u64) -> T + Sync,
    {
        let partitions = self.meta.partitions;
        let vertices = self.meta.vertices;

        if bitmap.is_none() && self.should_use_batched_vertex_mode() {
            let value = T::Atomic::default();
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
                self.scan_partition_window(cur, window_end_partition, None, &process, zero, &value);
                post(window_begin, window_end);

                cur += batch;
            }
            return T::load(&value);
        }

        let value = T::Atomic::default();
        self.scan_partition_window(0, partitions, bitmap, &process, zero, &value);
        T::load(&value)
    }

    /// Runs partitions `[begin_partition, end_partition)` in parallel on
    /// the engine's thread pool, with a dynamic cursor handing out one
    /// partition at a time to whichever worker asks next.
    fn scan_partition_window<T, P>(
        &self,
        begin_partition: u32,
        end_partition: u32,
        bitmap: Option<&Bitmap>,
        process: &P,
        zero: T,
        shared: &T::Atomic,
    ) where
        T: Accumulate,
        P: Fn(u64) -> T + Sync,
    {
        let vertices = self.meta.vertices;
        let partitions = self.meta.partitions;
        let next = AtomicU32::new(begin_partition);

        self.thread_pool.scope(|scope| {
            let num_workers = self
                .parallelism
                .min((end_partition - begin_partition).max(1) as usize);
            for _ in 0..num_workers {
                let next = &next;
                scope.spawn(move |_| loop {
                    let p = next.fetch_add(1, Ordering::Relaxed);
                    if p >= end_partition {
                        break;
                    }
                    let (begin, end) = partition_range(partitions, vertices, p);
                    let mut local = zero;
                    match bitmap {
                        None => {
                            for v in begin..end {
                                local = local + process(v);
                            }
                        }
                        Some(bitmap) => {
                            bitmap.for_each_set_in_range(begin, end, |v| {
                                local = local + process(v);
                            });
                        }
                    }
                    T::atomic_add_into(shared, local);
                });
            }
        });
    }

    /// Convenience wrapper for the common unbatched call shape.
    pub fn stream_vertices_simple<T, P>(&self, process: P, bitmap: Option<&Bitmap>, zero: T) -> T
    where
        T: Accumulate,
        P: Fn(u64) -> T + Sync,
    {
        self.stream_vertices(process, bitmap, zero, |_, _| {}, |_, _| {})
    }
}
