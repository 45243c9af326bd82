use std::collections::HashMap;

use crate::{
    backend::{Backend, QueryEngine},
    chunking::{ChunkingConfig, chunk_id, chunk_text},
    doc_id::DocumentId,
    embedding::{EmbeddingStore, embed_and_store},
    error::{Error, Result},
    loader::Document,
    model_manager::ModelManager,
    search::LocalQueryEngine,
    synthesis::{LlmSettings, OllamaClient, SynthesizingEngine},
    tantivy_index::KeywordIndex,
};

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_TOP_K: usize = 5;

/// How chunks are scored at query time.
#[derive(Debug)]
pub enum Embedder {
    /// BM25 only; no model is loaded.
    KeywordOnly,
    Colbert(ModelManager),
}

/// One indexed window of a document.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub doc_id: DocumentId,
    pub path: String,
    pub title: String,
    pub text: String,
    /// Position of the chunk within its document.
    pub index: usize,
}

/// Everything the local query engine searches. Chunks are keyed by
/// [`chunk_id`] of their document id and position.
#[derive(Debug)]
pub struct LocalIndex {
    pub(crate) keyword: KeywordIndex,
    pub(crate) chunks: HashMap<u64, ChunkRecord>,
    pub(crate) embeddings: EmbeddingStore,
    pub(crate) embedder: Embedder,
}

impl LocalIndex {
    pub fn chunk(&self, chunk_id: u64) -> Option<&ChunkRecord> {
        self.chunks.get(&chunk_id)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn embedded_count(&self) -> usize {
        self.embeddings.len()
    }
}

/// In-process backend: tantivy keyword index plus optional ColBERT
/// embeddings, all held in memory. With `llm` set, answers are written by
/// that model from the retrieved passages.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    pub keyword_only: bool,
    pub batch_size: usize,
    pub top_k: usize,
    /// Characters shared by adjacent chunks.
    pub chunk_overlap: usize,
    pub llm: Option<LlmSettings>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self {
            keyword_only: false,
            batch_size: DEFAULT_BATCH_SIZE,
            top_k: DEFAULT_TOP_K,
            chunk_overlap: 0,
            llm: None,
        }
    }
}

impl LocalBackend {
    fn chunking_config(&self, embedder: &Embedder) -> Result<ChunkingConfig> {
        let base = match embedder {
            Embedder::Colbert(model) => ChunkingConfig::for_model(model.model_id()),
            Embedder::KeywordOnly => ChunkingConfig::default(),
        };
        if self.chunk_overlap >= base.chunk_size {
            return Err(Error::IndexBuild(format!(
                "chunk overlap {} must be smaller than the chunk size {}",
                self.chunk_overlap, base.chunk_size
            )));
        }
        Ok(ChunkingConfig {
            overlap: self.chunk_overlap,
            ..base
        })
    }
}

impl Backend for LocalBackend {
    type Embedder = Embedder;
    type Index = LocalIndex;
    type Engine = Box<dyn QueryEngine>;

    fn resolve_embedder(&mut self, model: &str) -> Result<Embedder> {
        if self.keyword_only {
            tracing::info!("keyword-only mode, skipping embedding model");
            return Ok(Embedder::KeywordOnly);
        }
        let mut manager = ModelManager::with_model_id(model);
        manager.load()?;
        Ok(Embedder::Colbert(manager))
    }

    fn build_index(
        &mut self,
        documents: Vec<Document>,
        mut embedder: Embedder,
    ) -> Result<LocalIndex> {
        let config = self.chunking_config(&embedder)?;

        let mut order = Vec::new();
        let mut chunks = HashMap::new();
        for doc in documents {
            for chunk in chunk_text(&doc.text, config) {
                let id = chunk_id(doc.id.numeric, chunk.index);
                let record = ChunkRecord {
                    doc_id: doc.id.clone(),
                    path: doc.relative_path.clone(),
                    title: doc.title.clone(),
                    text: chunk.text,
                    index: chunk.index,
                };
                if chunks.insert(id, record).is_some() {
                    return Err(Error::IndexBuild(format!(
                        "duplicate chunk id for {}",
                        doc.relative_path
                    )));
                }
                order.push(id);
            }
        }
        tracing::info!(chunks = chunks.len(), "indexing chunks");

        let keyword = KeywordIndex::open_in_ram()?;
        let mut writer = keyword.writer()?;
        for id in &order {
            let chunk = &chunks[id];
            keyword.add_chunk(&writer, *id, &chunk.title, &chunk.text)?;
        }
        writer.commit()?;
        keyword.reload()?;

        let mut embeddings = EmbeddingStore::default();
        if let Embedder::Colbert(model) = &mut embedder {
            let batch_size = self.batch_size.max(1);
            let pairs: Vec<(u64, String)> = order
                .iter()
                .map(|id| (*id, chunks[id].text.clone()))
                .collect();
            for batch in pairs.chunks(batch_size) {
                embed_and_store(model, &mut embeddings, batch)?;
                tracing::debug!(
                    embedded = embeddings.len(),
                    total = pairs.len(),
                    "embedding chunks"
                );
            }
            tracing::info!(embedded = embeddings.len(), "embeddings ready");
        }

        Ok(LocalIndex {
            keyword,
            chunks,
            embeddings,
            embedder,
        })
    }

    fn query_engine(&mut self, index: LocalIndex) -> Result<Box<dyn QueryEngine>> {
        if self.top_k == 0 {
            return Err(Error::QueryEngineInit(
                "top-k must be at least 1".into(),
            ));
        }
        let passages = LocalQueryEngine::new(index, self.top_k);

        match &self.llm {
            None => Ok(Box::new(passages)),
            Some(settings) => {
                let client = OllamaClient::new(settings)?;
                tracing::info!(
                    model = %settings.model,
                    url = %settings.base_url,
                    "answers generated by Ollama"
                );
                Ok(Box::new(SynthesizingEngine::new(passages, client)))
            }
        }
    }
}
