use candle_core::Tensor;
use rayon::prelude::*;

use crate::{embedding::EmbeddingStore, error::Result};

/// A chunk with its MaxSim score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedChunk {
    pub chunk_id: u64,
    pub score: f32,
}

/// Score candidates by ColBERT MaxSim and sort them best first.
///
/// Candidates without a stored embedding are dropped. Scoring errors are
/// propagated.
pub fn rerank(
    query_embedding: &Tensor,
    candidate_ids: &[u64],
    store: &EmbeddingStore,
) -> Result<Vec<RankedChunk>> {
    let mut ranked = candidate_ids
        .par_iter()
        .filter_map(|&chunk_id| {
            let doc = store.get(chunk_id)?;
            Some(maxsim(query_embedding, doc).map(|score| RankedChunk {
                chunk_id,
                score,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}

/// Sum over query tokens of the best dot product against any document
/// token. `query` is `[Q, D]`, `doc` is `[T, D]`.
fn maxsim(query: &Tensor, doc: &Tensor) -> Result<f32> {
    let similarities = query.matmul(&doc.t()?)?;
    Ok(similarities.max(1)?.sum_all()?.to_scalar::<f32>()?)
}
