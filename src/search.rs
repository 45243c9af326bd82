use std::fmt::Write as _;

use crate::{
    backend::{QueryEngine, Response, Source},
    error::Result,
    index::{Embedder, LocalIndex},
    reranker,
    text_util::extract_snippet,
};

/// Candidates fetched by the keyword stage before reranking.
pub const FIRST_STAGE_LIMIT: usize = 1000;

/// A retrieved chunk with its final rank and score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Passage {
    pub rank: usize,
    pub score: f32,
    pub chunk_id: u64,
}

/// Query engine over a [`LocalIndex`].
#[derive(Debug)]
pub struct LocalQueryEngine {
    index: LocalIndex,
    top_k: usize,
}

impl LocalQueryEngine {
    pub fn new(index: LocalIndex, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

impl QueryEngine for LocalQueryEngine {
    fn query(&mut self, text: &str) -> Result<Response> {
        let passages = execute_search(&mut self.index, text, self.top_k)?;
        Ok(build_response(&self.index, text, &passages))
    }
}

/// Run the retrieval pipeline.
///
/// 1. Fuzzy BM25 over chunks (top [`FIRST_STAGE_LIMIT`])
/// 2. ColBERT MaxSim rerank, unless keyword-only; when BM25 finds nothing,
///    every embedded chunk is scored instead
/// 3. Keep the best `top_k`
pub fn execute_search(
    index: &mut LocalIndex,
    query: &str,
    top_k: usize,
) -> Result<Vec<Passage>> {
    let hits = index.keyword.search_fuzzy(query, FIRST_STAGE_LIMIT)?;

    let scored: Vec<(u64, f32)> = match &mut index.embedder {
        Embedder::KeywordOnly => {
            hits.iter().map(|h| (h.chunk_id, h.score)).collect()
        }
        Embedder::Colbert(model) => {
            let candidates: Vec<u64> = if hits.is_empty() {
                index.embeddings.ids()
            } else {
                hits.iter().map(|h| h.chunk_id).collect()
            };
            if candidates.is_empty() {
                return Ok(Vec::new());
            }
            let query_embedding = model.encode_query(query)?;
            reranker::rerank(&query_embedding, &candidates, &index.embeddings)?
                .into_iter()
                .map(|r| (r.chunk_id, r.score))
                .collect()
        }
    };

    Ok(scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (chunk_id, score))| Passage {
            rank: i + 1,
            score,
            chunk_id,
        })
        .collect())
}

fn build_response(
    index: &LocalIndex,
    query: &str,
    passages: &[Passage],
) -> Response {
    if passages.is_empty() {
        return Response::text("No matching passages found.");
    }

    let mut answer = String::new();
    let mut sources = Vec::with_capacity(passages.len());

    for p in passages {
        let Some(chunk) = index.chunk(p.chunk_id) else {
            continue;
        };
        let _ = writeln!(
            answer,
            "{:>2}. [{:.3}] {} {} - {}",
            p.rank, p.score, chunk.path, chunk.doc_id, chunk.title
        );
        if let Some(snippet) = extract_snippet(&chunk.text, query) {
            for line in snippet.lines() {
                let _ = writeln!(answer, "    {line}");
            }
        }
        sources.push(Source {
            rank: p.rank,
            score: p.score,
            path: chunk.path.clone(),
            title: chunk.title.clone(),
            chunk: chunk.index,
            text: chunk.text.clone(),
        });
    }

    Response { answer, sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::Backend,
        doc_id::DocumentId,
        index::LocalBackend,
        loader::Document,
    };

    fn engine_with_docs(top_k: usize) -> Box<dyn QueryEngine> {
        let docs = [
            (
                "notes/rust-guide.md",
                "The Rust Programming Language",
                "Rust is a systems programming language focused on safety, \
                 concurrency, and performance.",
            ),
            (
                "notes/python-intro.md",
                "Introduction to Python",
                "Python is a high-level interpreted programming language \
                 known for its readability.",
            ),
            (
                "kitchen/cooking-pasta.md",
                "How to Cook Pasta",
                "Boil water in a large pot.\nAdd salt.\nCook the pasta \
                 according to package directions.",
            ),
            (
                "garden/gardening.md",
                "Gardening Tips",
                "Water your plants regularly. Use compost for healthy soil.",
            ),
        ];
        let documents = docs
            .iter()
            .map(|(path, title, text)| Document {
                id: DocumentId::new(path),
                path: path.into(),
                relative_path: path.to_string(),
                title: title.to_string(),
                text: text.to_string(),
            })
            .collect();

        let mut backend = LocalBackend {
            keyword_only: true,
            top_k,
            ..Default::default()
        };
        let index = backend.build_index(documents, Embedder::KeywordOnly).unwrap();
        backend.query_engine(index).unwrap()
    }

    #[test]
    fn best_match_ranks_first() {
        let mut engine = engine_with_docs(5);
        let response = engine.query("rust programming").unwrap();

        assert_eq!(response.sources[0].path, "notes/rust-guide.md");
        assert!(response.answer.contains("notes/rust-guide.md"));
    }

    #[test]
    fn ranks_are_sequential_and_scores_descend() {
        let mut engine = engine_with_docs(5);
        let response = engine.query("programming language").unwrap();

        assert!(response.sources.len() >= 2);
        for (i, s) in response.sources.iter().enumerate() {
            assert_eq!(s.rank, i + 1);
        }
        for pair in response.sources.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn top_k_bounds_the_sources() {
        let mut engine = engine_with_docs(1);
        let response = engine.query("programming").unwrap();
        assert_eq!(response.sources.len(), 1);
    }

    #[test]
    fn answer_includes_snippet_of_matching_line() {
        let mut engine = engine_with_docs(5);
        let response = engine.query("salt").unwrap();
        assert_eq!(response.sources.len(), 1);
        assert!(response.answer.contains("Add salt."));
    }

    #[test]
    fn sources_carry_chunk_position_and_text() {
        let mut engine = engine_with_docs(5);
        let response = engine.query("compost").unwrap();

        assert_eq!(response.sources.len(), 1);
        let source = &response.sources[0];
        assert_eq!(source.chunk, 0);
        assert!(source.text.contains("Use compost"));
        let id = DocumentId::new("garden/gardening.md");
        assert!(response.answer.contains(&id.to_string()));
    }

    #[test]
    fn no_match_gives_a_plain_answer() {
        let mut engine = engine_with_docs(5);
        let response = engine.query("xyzzy_nonexistent_12345").unwrap();
        assert!(response.sources.is_empty());
        assert_eq!(response.answer, "No matching passages found.");
    }
}
