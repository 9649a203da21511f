mod common;

use anyhow::Result;
use gridstream::prelude::*;

use common::write_grid;

const EDGES: [(u32, u32, Option<f32>); 4] = [
    (0u32, 1u32, None),
    (1, 2, None),
    (2, 3, None),
    (3, 0, None),
];

#[test]
fn source_and_target_oriented_modes_return_the_same_edge_count() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_grid(dir.path(), 8, 3, EdgeType::Unweighted, &EDGES);
    let engine = Engine::new(dir.path())?;

    let (target, target_read_bytes) = engine.stream_edges(
        |_| 1u64,
        None,
        0u64,
        UpdateMode::TargetOriented,
        |_, _| {},
        |_, _| {},
    )?;
    let (source, source_read_bytes) = engine.stream_edges(
        |_| 1u64,
        None,
        0u64,
        UpdateMode::SourceOriented,
        |_, _| {},
        |_, _| {},
    )?;

    assert_eq!(target, EDGES.len() as u64);
    assert_eq!(source, EDGES.len() as u64);
    assert!(target_read_bytes > 0);
    assert!(source_read_bytes > 0);
    Ok(())
}

#[test]
fn weighted_fold_agrees_under_both_modes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let weighted = [
        (0u32, 1u32, Some(2.5f32)),
        (1, 2, Some(1.5f32)),
        (2, 0, Some(3.0f32)),
    ];
    write_grid(dir.path(), 6, 2, EdgeType::Weighted, &weighted);
    let engine = Engine::new(dir.path())?;

    let (sum_target, _): (f64, u64) = engine.stream_edges(
        |e| e.weight.unwrap() as f64,
        None,
        0.0,
        UpdateMode::TargetOriented,
        |_, _| {},
        |_, _| {},
    )?;
    let (sum_source, _): (f64, u64) = engine.stream_edges(
        |e| e.weight.unwrap() as f64,
        None,
        0.0,
        UpdateMode::SourceOriented,
        |_, _| {},
        |_, _| {},
    )?;

    assert!((sum_target - 7.0).abs() < 1e-9);
    assert!((sum_source - 7.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn empty_bitmap_decodes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_grid(dir.path(), 8, 3, EdgeType::Unweighted, &EDGES);
    let engine = Engine::new(dir.path())?;
    let bitmap = engine.alloc_bitmap();
    assert_eq!(bitmap.popcount(), 0);

    let (count, read_bytes) = engine.stream_edges_simple(|_| 1u64, Some(&bitmap), 0u64)?;
    assert_eq!(count, 0);
    assert_eq!(read_bytes, 0);
    Ok(())
}

#[test]
fn single_partition_matches_naive_sequential_scan() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_grid(dir.path(), 8, 1, EdgeType::Unweighted, &EDGES);
    let engine = Engine::new(dir.path())?;

    let seen: std::sync::Mutex<Vec<(u32, u32)>> = std::sync::Mutex::new(Vec::new());
    let _: (u64, u64) = engine.stream_edges_simple(
        |e| {
            seen.lock().unwrap().push((e.source, e.target));
            0
        },
        None,
        0u64,
    )?;

    let mut naive = seen.into_inner().unwrap();
    let mut expected: Vec<(u32, u32)> = EDGES.iter().map(|&(s, t, _)| (s, t)).collect();
    naive.sort_unstable();
    expected.sort_unstable();
    assert_eq!(naive, expected);
    Ok(())
}

#[test]
fn weighted_and_unweighted_graphs_agree_when_the_closure_ignores_weight() -> Result<()> {
    let unweighted_dir = tempfile::tempdir()?;
    write_grid(unweighted_dir.path(), 8, 2, EdgeType::Unweighted, &EDGES);
    let unweighted = Engine::new(unweighted_dir.path())?;

    let weighted_edges: Vec<_> = EDGES.iter().map(|&(s, t, _)| (s, t, Some(1.0f32))).collect();
    let weighted_dir = tempfile::tempdir()?;
    write_grid(weighted_dir.path(), 8, 2, EdgeType::Weighted, &weighted_edges);
    let weighted = Engine::new(weighted_dir.path())?;

    let (sum_a, _): (u64, u64) =
        unweighted.stream_edges_simple(|e| u64::from(e.source) + u64::from(e.target), None, 0u64)?;
    let (sum_b, _): (u64, u64) =
        weighted.stream_edges_simple(|e| u64::from(e.source) + u64::from(e.target), None, 0u64)?;
    assert_eq!(sum_a, sum_b);

    let (count_a, _) = unweighted.stream_edges_simple(|_| 1u64, None, 0u64)?;
    let (count_b, _) = weighted.stream_edges_simple(|_| 1u64, None, 0u64)?;
    assert_eq!(count_a, count_b);
    Ok(())
}
