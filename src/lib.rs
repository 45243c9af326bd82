//! delve - index a folder tree of documents and query it from the terminal.
//!
//! Every directory under the data folder is loaded, the documents are
//! chunked and indexed for keyword search via
//! [Tantivy](https://github.com/quickwit-oss/tantivy), and embedded with a
//! [ColBERT](https://github.com/stanford-futuredata/ColBERT) model for
//! reranking. Queries are then answered in an interactive loop, either with
//! the best-matching passages or, with `--llm`, by a local Ollama model that
//! writes an answer from them.
//!
//! # Quick start
//!
//! ```no_run
//! use delve::{
//!     app::{self, Settings},
//!     index::LocalBackend,
//!     ingestion::FailurePolicy,
//!     loader::FsLoader,
//!     progress,
//! };
//!
//! let settings = Settings {
//!     data_folder: "/path/to/data".into(),
//!     model: "lightonai/GTE-ModernColBERT-v1".to_string(),
//!     on_error: FailurePolicy::Fail,
//! };
//! let loader = FsLoader::new(&settings.data_folder);
//! let mut backend = LocalBackend::default();
//!
//! app::run(
//!     &settings,
//!     &loader,
//!     &mut backend,
//!     progress::terminal_or_silent,
//!     std::io::stdin().lock(),
//!     std::io::stdout().lock(),
//! )
//! .unwrap();
//! ```

pub mod app;
pub mod backend;
pub mod chunking;
pub mod cli;
pub mod doc_id;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod loader;
pub mod model_manager;
pub mod progress;
pub mod repl;
pub mod reranker;
pub mod search;
pub mod synthesis;
pub mod tantivy_index;
pub mod text_util;
pub mod walker;

pub use backend::{Backend, QueryEngine, Response};
pub use error::{Error, Result};
pub use index::LocalBackend;
pub use loader::{Document, DocumentLoader, FsLoader};
