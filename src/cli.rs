use std::path::PathBuf;

use clap::Parser;

use crate::{
    app::Settings,
    index::{DEFAULT_BATCH_SIZE, DEFAULT_TOP_K, LocalBackend},
    ingestion::FailurePolicy,
    model_manager::{DEFAULT_MODEL_ID, MODEL_ENV_VAR},
    synthesis::{DEFAULT_OLLAMA_URL, LlmSettings, OLLAMA_URL_ENV_VAR},
};

#[derive(Debug, Parser)]
#[command(
    name = "delve",
    version,
    about = "Index a folder of documents and query it interactively"
)]
pub struct Cli {
    /// Folder whose documents (and all subfolders) are indexed
    pub data_folder: PathBuf,

    /// Embedding model: a HuggingFace model ID or a local model directory
    #[arg(long, env = MODEL_ENV_VAR, default_value = DEFAULT_MODEL_ID)]
    pub model: String,

    /// Number of passages returned per query
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// What to do when a folder fails to load
    #[arg(long, value_enum, default_value_t = FailurePolicy::Fail)]
    pub on_error: FailurePolicy,

    /// Skip the embedding model and answer from keyword search only
    #[arg(long)]
    pub bm25_only: bool,

    /// Chunks embedded per model call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Characters shared by adjacent chunks of a long document
    #[arg(long, default_value_t = 0)]
    pub chunk_overlap: usize,

    /// Ollama model that writes answers from the retrieved passages
    /// (passages are printed as-is when omitted)
    #[arg(long, value_name = "MODEL")]
    pub llm: Option<String>,

    /// Base URL of the Ollama server used by --llm
    #[arg(long, env = OLLAMA_URL_ENV_VAR, default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            data_folder: self.data_folder.clone(),
            model: self.model.clone(),
            on_error: self.on_error,
        }
    }

    pub fn backend(&self) -> LocalBackend {
        LocalBackend {
            keyword_only: self.bm25_only,
            batch_size: self.batch_size,
            top_k: self.top_k,
            chunk_overlap: self.chunk_overlap,
            llm: self.llm.as_ref().map(|model| LlmSettings {
                model: model.clone(),
                base_url: self.ollama_url.clone(),
            }),
        }
    }
}
