use std::io::Write;
use std::path::Path;

use gridstream::prelude::EdgeType;

/// Builds a minimal on-disk grid from a plain edge list, partitioned by
/// `partitions`, writing both the row and column streams plus both offset
/// tables and (accounting-only) per-block files — mirrors the library's own
/// internal fixture builder, duplicated here since integration tests only
/// see `gridstream`'s public surface.
pub fn write_grid(
    dir: &Path,
    vertices: u64,
    partitions: u32,
    edge_type: EdgeType,
    edges: &[(u32, u32, Option<f32>)],
) {
    let p = partitions as usize;
    let mut blocks: Vec<Vec<Vec<u8>>> = vec![vec![Vec::new(); p]; p];

    let block = vertices / partitions as u64;
    let part_of = |v: u32| -> usize {
        let idx = (v as u64 / block.max(1)) as usize;
        idx.min(p - 1)
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
            std::fs::write(dir.join(format!("block-{i}-{j}")), &blocks[i][j]).unwrap();
        }
    }
}
