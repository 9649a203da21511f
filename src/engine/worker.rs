/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The edge-decoding worker pool: a bounded `crossbeam_channel` of
//! page-aligned I/O ranges feeding a fixed set of scoped threads, each
//! folding its own partial result before a single atomic fold on exit.
//!
//! Grounded directly on `ParMapFoldIter::par_map_fold2_with`
//! (`src/traits/par_map_fold.rs`): a bounded channel as the task queue,
//! `scope.spawn` per worker, one `send` of the worker's folded result on
//! channel closure instead of N sends per item.

use crossbeam_channel::{Receiver, Sender};

use crate::engine::accumulate::Accumulate;
use crate::engine::edge::{Edge, EdgeType};
use crate::engine::planner::IoRange;
use crate::engine::scratch::AlignedBuffer;

/// Capacity for the bounded I/O-task queue: at least 65,536 slots. `push`
/// blocks the planner thread once this fills, `pop` blocks each worker
/// once it empties.
pub const QUEUE_CAPACITY: usize = 65_536;

pub fn bounded_queue() -> (Sender<IoRange>, Receiver<IoRange>) {
    crossbeam_channel::bounded(QUEUE_CAPACITY)
}

/// Runs `parallelism` workers pulling page-aligned ranges out of a bounded
/// queue that `emit_tasks` fills *concurrently* on the calling thread —
/// `emit_tasks` receives the `Sender` and is expected to `send` every task
/// for this pass and then drop the sender, which is what closes the
/// channel and lets each worker's `recv()` loop end. Because the queue is
/// bounded, `emit_tasks`'s sends block once it fills, giving the producer
/// real backpressure against the consumers.
///
/// Each worker copies its range into a thread-local page-aligned scratch
/// buffer, decodes edges at `offset % edge_unit ..`, filters, and folds
/// `process`'s results locally before one atomic merge into the shared
/// value on exit.
///
/// Returns the folded value across all workers and the total bytes copied
/// out of the mapping (`read_bytes`, exposed for diagnostics).
#[allow(clippy::too_many_arguments)]
pub fn run_edge_workers<T, P, F>(
    thread_pool: &rayon::ThreadPool,
    parallelism: usize,
    emit_tasks: impl FnOnce(Sender<IoRange>) + Send,
    region: &[u8],
    edge_type: EdgeType,
    filter: F,
    process: P,
) -> (T, u64)
where
    T: Accumulate,
    P: Fn(Edge) -> T + Sync,
    F: Fn(&Edge) -> bool + Sync,
{
    let value = T::Atomic::default();
    let read_bytes = std::sync::atomic::AtomicU64::new(0);
    let (tx, rx) = bounded_queue();

    thread_pool.in_place_scope(|scope| {
        for _ in 0..parallelism {
            let tasks = rx.clone();
            let value = &value;
            let read_bytes = &read_bytes;
            let filter = &filter;
            let process = &process;
            scope.spawn(move |_| {
                let mut local = T::default();
                let mut local_read_bytes = 0u64;
                let mut scratch = AlignedBuffer::new(
                    super::planner::IOSIZE as usize,
                    edge_type.page_size() as usize,
                );

                while let Ok(task) = tasks.recv() {
                    let start = task.offset as usize;
                    let len = task.length as usize;
                    let end = (start + len).min(region.len()).min(start + scratch.capacity());
                    if start >= end {
                        continue;
                    }
                    let bytes = end - start;
                    let buffer = scratch.as_mut_slice();
                    let buffer = &mut buffer[..bytes];
                    buffer.copy_from_slice(&region[start..end]);
                    local_read_bytes += bytes as u64;

                    let start_pos = (task.offset % edge_type.edge_unit()) as usize;
                    for edge in Edge::decode_all(buffer, start_pos, edge_type) {
                        if filter(&edge) {
                            local = local + process(edge);
                        }
                    }
                }

                T::atomic_add_into(value, local);
                std::sync::atomic::AtomicU64::fetch_add(
                    read_bytes,
                    local_read_bytes,
                    std::sync::atomic::Ordering::Relaxed,
                );
            });
        }

        // Dropping our own `rx` (the clones live with the workers) and
        // running the producer on the scope's calling thread lets pushes
        // and pops interleave for the remainder of this scope.
        drop(rx);
        emit_tasks(tx);
    });

    (T::load(&value), read_bytes.load(std::sync::atomic::Ordering::Relaxed))
}
