//! Splitting long documents into windows that are indexed and embedded
//! separately.
//!
//! Sizes are measured in characters, approximating four characters per
//! token for English text.

use std::path::Path;

use serde::Deserialize;

const CHARS_PER_TOKEN: usize = 4;

const DEFAULT_DOCUMENT_TOKENS: usize = 1024;

/// Default chunk size in characters (~1024 tokens).
pub const DEFAULT_CHUNK_SIZE: usize = DEFAULT_DOCUMENT_TOKENS * CHARS_PER_TOKEN;

/// How far back from the hard cut to look for whitespace.
const BOUNDARY_LOOKBACK: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SentenceTransformersConfig {
    document_length: Option<usize>,
}

impl ChunkingConfig {
    /// Derive the chunk size from a local model directory's
    /// `config_sentence_transformers.json`, if present.
    ///
    /// Remote model IDs and directories without the file get the defaults.
    pub fn for_model(model_id: &str) -> Self {
        let config_path =
            Path::new(model_id).join("config_sentence_transformers.json");
        let document_length = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| {
                serde_json::from_str::<SentenceTransformersConfig>(&s).ok()
            })
            .and_then(|c| c.document_length);

        match document_length {
            Some(tokens) => Self {
                chunk_size: tokens.saturating_mul(CHARS_PER_TOKEN).max(1),
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

/// A window of a document's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Zero-based position within the document.
    pub index: usize,
    /// Byte offset of the chunk start in the original text.
    pub start_offset: usize,
}

/// Split `text` into chunks of at most `config.chunk_size` characters,
/// preferring to cut at whitespace. Whitespace-only windows are dropped.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<Chunk> {
    // Byte offset of every char boundary, plus the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let size = config.chunk_size.max(1);

    if char_count <= size {
        return vec![Chunk {
            text: text.to_string(),
            index: 0,
            start_offset: 0,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_count {
        let hard_end = (start + size).min(char_count);
        let end = if hard_end < char_count {
            soft_boundary(text, &bounds, start, hard_end)
        } else {
            hard_end
        };

        let slice = &text[bounds[start]..bounds[end]];
        if !slice.trim().is_empty() {
            chunks.push(Chunk {
                text: slice.to_string(),
                index: chunks.len(),
                start_offset: bounds[start],
            });
        }

        if hard_end == char_count {
            break;
        }
        // Restart from the actual cut so soft boundaries leave no gaps.
        start = end.saturating_sub(config.overlap).max(start + 1);
        // Fold a short tail into the previous window instead of emitting it.
        if char_count - start < size / 4 {
            if let Some(last) = chunks.last_mut() {
                let from = last.start_offset;
                last.text = text[from..].to_string();
            }
            break;
        }
    }

    chunks
}

/// Char index just past the last whitespace in the lookback window before
/// `hard_end`, or `hard_end` when there is none.
fn soft_boundary(
    text: &str,
    bounds: &[usize],
    start: usize,
    hard_end: usize,
) -> usize {
    let floor = hard_end.saturating_sub(BOUNDARY_LOOKBACK).max(start + 1);
    (floor..hard_end)
        .rev()
        .find(|&i| {
            text[bounds[i]..bounds[i + 1]]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        })
        .map(|i| i + 1)
        .unwrap_or(hard_end)
}

/// Key for chunk `chunk_index` of the document with numeric id `base_id`.
///
/// Format: `base_id XOR (chunk_index << 48)`. Chunk 0 keeps the base id.
pub fn chunk_id(base_id: u64, chunk_index: usize) -> u64 {
    if chunk_index == 0 {
        base_id
    } else {
        base_id ^ ((chunk_index as u64) << 48)
    }
}
