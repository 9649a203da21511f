/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The on-disk edge record and its decoding.

/// Vertex identifier. Fixed at 32 bits, matching the grid format's typical
/// on-disk width.
pub type VertexId = u32;

/// Edge count, wide enough to index the largest grids the format supports.
pub type EdgeId = u64;

/// Edge weight, present only in weighted graphs.
pub type Weight = f32;

/// Whether a grid stores unweighted or weighted edges. Any `meta` value
/// other than 0 is treated as "weighted", matching the source format
/// (anything nonzero means 12288-byte pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    Unweighted,
    Weighted,
}

impl EdgeType {
    /// Size in bytes of one edge record.
    pub const fn edge_unit(self) -> u64 {
        match self {
            EdgeType::Unweighted => 2 * std::mem::size_of::<VertexId>() as u64,
            EdgeType::Weighted => {
                2 * std::mem::size_of::<VertexId>() as u64 + std::mem::size_of::<Weight>() as u64
            }
        }
    }

    /// Page size pairs with `edge_unit` so page-aligned reads decode
    /// cleanly: 4096 for unweighted graphs, 12288 (a multiple of both 4096
    /// and the 12-byte weighted record) for weighted ones.
    pub const fn page_size(self) -> u64 {
        match self {
            EdgeType::Unweighted => 4096,
            EdgeType::Weighted => 12288,
        }
    }
}

/// A decoded edge record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: Option<Weight>,
}

impl Edge {
    /// Decode one edge starting at byte `pos` of `buffer`. Caller
    /// guarantees `pos + edge_type.edge_unit() <= buffer.len()`.
    #[inline]
    pub fn decode(buffer: &[u8], pos: usize, edge_type: EdgeType) -> Edge {
        let source = u32::from_le_bytes(buffer[pos..pos + 4].try_into().unwrap());
        let target = u32::from_le_bytes(buffer[pos + 4..pos + 8].try_into().unwrap());
        let weight = match edge_type {
            EdgeType::Unweighted => None,
            EdgeType::Weighted => Some(f32::from_le_bytes(
                buffer[pos + 8..pos + 12].try_into().unwrap(),
            )),
        };
        Edge {
            source,
            target,
            weight,
        }
    }

    /// Decode every whole edge in `buffer`, starting at `buffer[start_pos]`
    /// (the straddle offset `offset % edge_unit` computed by the caller),
    /// stopping once fewer than `edge_unit` bytes remain.
    pub fn decode_all(
        buffer: &[u8],
        start_pos: usize,
        edge_type: EdgeType,
    ) -> impl Iterator<Item = Edge> + '_ {
        let unit = edge_type.edge_unit() as usize;
        let len = buffer.len();
        (start_pos..len)
            .step_by(unit)
            .take_while(move |&pos| pos + unit <= len)
            .map(move |pos| Edge::decode(buffer, pos, edge_type))
    }
}
