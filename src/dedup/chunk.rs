use std::collections::HashSet;

use crate::stats::Report;
use crate::threading::{Chunk, ChunkResult};

/// Keeps the first record of every distinct sequence within one chunk,
/// preserving chunk order.
pub fn dedup_chunk(chunk: Chunk) -> ChunkResult {
    let total = chunk.data.len();

    let keep: Vec<bool> = {
        let mut seen: HashSet<&str> = HashSet::with_capacity(total);
        chunk.data.iter().map(|r| seen.insert(r.rec.seq.as_str())).collect()
    };

    let data: Vec<_> = chunk
        .data
        .into_iter()
        .zip(keep)
        .filter_map(|(r, k)| k.then_some(r))
        .collect();

    let report = Report {
        chunks: 1,
        total_reads: total as u64,
        locally_unique: data.len() as u64,
        unique: 0,
    };
    ChunkResult { id: chunk.id, data, report }
}
