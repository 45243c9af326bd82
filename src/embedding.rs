use std::collections::HashMap;

use candle_core::Tensor;

use crate::{error::Result, model_manager::ModelManager};

/// Per-chunk ColBERT token embeddings (`[tokens, dim]` tensors), keyed by
/// chunk id. Lives in memory for the duration of the run.
#[derive(Debug, Default)]
pub struct EmbeddingStore {
    embeddings: HashMap<u64, Tensor>,
}

impl EmbeddingStore {
    pub fn insert(&mut self, chunk_id: u64, embedding: Tensor) {
        self.embeddings.insert(chunk_id, embedding);
    }

    pub fn get(&self, chunk_id: u64) -> Option<&Tensor> {
        self.embeddings.get(&chunk_id)
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Ids of every stored chunk, sorted.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.embeddings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Encode one batch of `(chunk_id, text)` pairs and store the results.
///
/// Returns the number of chunks embedded.
pub fn embed_and_store(
    model: &mut ModelManager,
    store: &mut EmbeddingStore,
    batch: &[(u64, String)],
) -> Result<usize> {
    if batch.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
    let embeddings = model.encode_documents(&texts)?;
    let (batch_size, _tokens, _dim) = embeddings.dims3()?;

    for (i, (chunk_id, _)) in batch.iter().enumerate().take(batch_size) {
        store.insert(*chunk_id, embeddings.get(i)?);
    }

    Ok(batch_size.min(batch.len()))
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    #[test]
    fn ids_are_sorted() {
        let mut store = EmbeddingStore::default();
        for id in [7u64, 2, 5] {
            let t = Tensor::zeros((1, 2), candle_core::DType::F32, &Device::Cpu)
                .unwrap();
            store.insert(id, t);
        }
        assert_eq!(store.ids(), vec![2, 5, 7]);
        assert_eq!(store.len(), 3);
        assert!(store.get(5).is_some());
        assert!(store.get(1).is_none());
    }
}
