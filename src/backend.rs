//! Capability interface between the orchestration and the engine that
//! embeds, indexes and answers queries.
//!
//! The orchestration only sees these traits, so ingestion and the
//! interactive loop can run against an in-memory fake as easily as against
//! [`crate::index::LocalBackend`].

use std::{fmt, io::Write};

use crate::{error::Result, loader::Document};

/// Builds an index from loaded documents and derives a query engine from it.
pub trait Backend {
    /// Resolved embedding model (or service handle).
    type Embedder;
    /// Opaque index produced by [`Backend::build_index`].
    type Index;
    type Engine: QueryEngine;

    /// Resolve a model identifier to an embedder.
    fn resolve_embedder(&mut self, model: &str) -> Result<Self::Embedder>;

    /// Build the index, taking ownership of the document collection.
    fn build_index(
        &mut self,
        documents: Vec<Document>,
        embedder: Self::Embedder,
    ) -> Result<Self::Index>;

    fn query_engine(&mut self, index: Self::Index) -> Result<Self::Engine>;
}

/// Answers free-text queries.
pub trait QueryEngine {
    fn query(&mut self, text: &str) -> Result<Response>;

    /// Answer `text`, writing the answer to `out` as it is produced.
    ///
    /// Engines that generate incrementally override this to stream; the
    /// default writes the finished answer in one go.
    fn answer(&mut self, text: &str, out: &mut dyn Write) -> Result<Response> {
        let response = self.query(text)?;
        write!(out, "{response}")?;
        Ok(response)
    }
}

impl<E: QueryEngine + ?Sized> QueryEngine for Box<E> {
    fn query(&mut self, text: &str) -> Result<Response> {
        (**self).query(text)
    }

    fn answer(&mut self, text: &str, out: &mut dyn Write) -> Result<Response> {
        (**self).answer(text, out)
    }
}

/// A passage that contributed to a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub rank: usize,
    pub score: f32,
    /// Document path relative to the data folder.
    pub path: String,
    pub title: String,
    /// Position of the passage's chunk within its document.
    pub chunk: usize,
    /// The passage text.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl Response {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.answer.trim_end())
    }
}
