/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Breadth-first traversal over a partitioned edge grid, reproducing the
//! reference `bfs` demo shipped alongside the on-disk format this crate
//! streams: alternating active-vertex bitmaps, a CAS-guarded `parent`
//! array, and one `stream_edges` pass per BFS level.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use gridstream::prelude::*;

#[derive(Parser)]
#[command(name = "bfs", about = "Breadth-first traversal over a partitioned edge grid.")]
struct Args {
    /// Directory holding the grid's meta/row/column/offset files.
    path: PathBuf,
    /// Vertex to start the traversal from.
    start: u32,
    /// Memory budget in GiB; governs direct-vs-buffered I/O and batch sizing.
    #[arg(long, default_value_t = 8)]
    memory_gb: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut engine = Engine::new(&args.path)
        .with_context(|| format!("failed to open grid at {}", args.path.display()))?;
    engine.set_memory_bytes(args.memory_gb * 1024 * 1024 * 1024);

    let vertices = engine.vertices();
    if u64::from(args.start) >= vertices {
        anyhow::bail!(
            "start vertex {} is out of range for a graph of {vertices} vertices",
            args.start
        );
    }

    let parent: Vec<AtomicI64> = (0..vertices).map(|_| AtomicI64::new(-1)).collect();
    parent[args.start as usize].store(i64::from(args.start), Ordering::Relaxed);
    engine.set_vertex_data_bytes(vertices * std::mem::size_of::<i64>() as u64);

    let mut active_in = engine.alloc_bitmap();
    let mut active_out = engine.alloc_bitmap();
    active_out.set(u64::from(args.start));

    let mut active_vertices = 1u64;
    let mut iteration = 0u32;
    let start_time = Instant::now();

    while active_vertices != 0 {
        iteration += 1;
        log::info!("{iteration:>7}: {active_vertices}");
        std::mem::swap(&mut active_in, &mut active_out);
        active_out.clear_all();
        engine.hint(&[VectorDescriptor::new(vertices, std::mem::size_of::<i64>() as u64)]);

        let read_bytes;
        (active_vertices, read_bytes) = engine.stream_edges_simple(
            |edge| {
                let target = edge.target as usize;
                if parent[target].load(Ordering::Relaxed) != -1 {
                    return 0u64;
                }
                match parent[target].compare_exchange(
                    -1,
                    i64::from(edge.source),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        active_out.set_atomic(u64::from(edge.target));
                        1
                    }
                    Err(_) => 0,
                }
            },
            Some(&active_in),
            0u64,
        )?;
        log::debug!("{iteration:>7}: read {read_bytes} bytes");
    }

    let elapsed = start_time.elapsed();

    let discovered = engine.stream_vertices_simple(
        |v| u64::from(parent[v as usize].load(Ordering::Relaxed) != -1),
        None,
        0u64,
    );

    println!(
        "discovered {discovered} vertices from {} in {:.2} seconds.",
        args.start,
        elapsed.as_secs_f64()
    );

    Ok(())
}
