//! Optional answer synthesis.
//!
//! The passages retrieved for a query are handed to a local Ollama model as
//! context, and its answer is streamed to the terminal as it is generated.

use std::{
    fmt::Write as _,
    io::{BufRead, BufReader, Write},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    backend::{QueryEngine, Response, Source},
    error::{Error, Result},
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Environment variable that overrides the Ollama base URL.
pub const OLLAMA_URL_ENV_VAR: &str = "DELVE_OLLAMA_URL";

/// Generation on CPU-only machines can take minutes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(360);

/// Which model writes answers, and where it is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
}

/// A text generator that streams its output.
pub trait AnswerModel {
    /// Complete `prompt`, writing each fragment to `out` as it arrives.
    /// Returns the full completion.
    fn generate(&self, prompt: &str, out: &mut dyn Write) -> Result<String>;
}

/// Blocking client for Ollama's `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: reqwest::Url,
    model: String,
    http: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

impl OllamaClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let url = format!(
            "{}/api/generate",
            settings.base_url.trim_end_matches('/')
        );
        let endpoint = reqwest::Url::parse(&url).map_err(|e| {
            Error::Config(format!(
                "invalid Ollama URL '{}': {e}",
                settings.base_url
            ))
        })?;
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            endpoint,
            model: settings.model.clone(),
            http,
        })
    }
}

impl AnswerModel for OllamaClient {
    fn generate(&self, prompt: &str, out: &mut dyn Write) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: true,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Generation(format!(
                "Ollama returned {status}: {}",
                body.trim()
            )));
        }

        read_stream(BufReader::new(response), out)
    }
}

/// Decode Ollama's newline-delimited JSON stream, echoing each fragment.
fn read_stream(reader: impl BufRead, out: &mut dyn Write) -> Result<String> {
    let mut answer = String::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: GenerateChunk = serde_json::from_str(&line).map_err(|e| {
            Error::Generation(format!("malformed stream line: {e}"))
        })?;
        if let Some(message) = chunk.error {
            return Err(Error::Generation(message));
        }

        out.write_all(chunk.response.as_bytes())?;
        out.flush()?;
        answer.push_str(&chunk.response);

        if chunk.done {
            return Ok(answer);
        }
    }

    Err(Error::Generation(
        "stream ended before the answer was complete".into(),
    ))
}

/// Question-answering prompt over the retrieved passages.
pub fn build_prompt(query: &str, sources: &[Source]) -> String {
    let mut context = String::new();
    for source in sources {
        let _ = writeln!(
            context,
            "path: {}\ntitle: {}\n\n{}\n",
            source.path,
            source.title,
            source.text.trim()
        );
    }

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\
         ---------------------\n\
         Given the context information and not prior knowledge, \
         answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

/// Retrieves passages with `retriever`, then lets `model` answer from them.
pub struct SynthesizingEngine<E, M> {
    retriever: E,
    model: M,
}

impl<E, M> SynthesizingEngine<E, M> {
    pub fn new(retriever: E, model: M) -> Self {
        Self { retriever, model }
    }
}

impl<E: QueryEngine, M: AnswerModel> QueryEngine for SynthesizingEngine<E, M> {
    fn query(&mut self, text: &str) -> Result<Response> {
        self.answer(text, &mut std::io::sink())
    }

    fn answer(&mut self, text: &str, out: &mut dyn Write) -> Result<Response> {
        let retrieved = self.retriever.query(text)?;
        // Nothing to ground an answer in.
        if retrieved.sources.is_empty() {
            write!(out, "{retrieved}")?;
            return Ok(retrieved);
        }

        tracing::debug!(passages = retrieved.sources.len(), "generating answer");
        let prompt = build_prompt(text, &retrieved.sources);
        let answer = self.model.generate(&prompt, out)?;

        Ok(Response {
            answer,
            sources: retrieved.sources,
        })
    }
}
