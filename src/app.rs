use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use crate::{
    backend::Backend,
    error::{Error, Result},
    ingestion::{self, FailurePolicy},
    loader::DocumentLoader,
    progress::Progress,
    repl::{self, LoopSummary},
    walker,
};

/// Run-wide settings fixed at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_folder: PathBuf,
    pub model: String,
    pub on_error: FailurePolicy,
}

/// Startup pipeline: enumerate directories, ingest, resolve the embedder,
/// build the index and derive the query engine.
///
/// `progress` receives the directory count and returns the reporter for the
/// ingestion loop. Every failure here is fatal for the run and is returned
/// as one of the startup error kinds.
pub fn build_engine<B, P>(
    settings: &Settings,
    loader: &dyn DocumentLoader,
    backend: &mut B,
    progress: P,
) -> Result<B::Engine>
where
    B: Backend,
    P: FnOnce(usize) -> Box<dyn Progress>,
{
    let directories = walker::list_directories(&settings.data_folder)?;
    tracing::info!(
        root = %settings.data_folder.display(),
        directories = directories.len(),
        "found directories"
    );

    let mut reporter = progress(directories.len());
    let report = ingestion::ingest_directories(
        &directories,
        loader,
        reporter.as_mut(),
        settings.on_error,
    )?;
    drop(reporter);
    tracing::info!(
        documents = report.documents.len(),
        directories = report.directories,
        skipped = report.skipped.len(),
        "ingestion complete"
    );

    let embedder = backend.resolve_embedder(&settings.model).map_err(|e| {
        match e {
            Error::UnknownModel { .. } => e,
            other => Error::UnknownModel {
                model: settings.model.clone(),
                reason: other.to_string(),
            },
        }
    })?;

    let index = backend
        .build_index(report.documents, embedder)
        .map_err(|e| match e {
            Error::IndexBuild(_) => e,
            other => Error::IndexBuild(other.to_string()),
        })?;

    backend.query_engine(index).map_err(|e| match e {
        Error::QueryEngineInit(_) => e,
        other => Error::QueryEngineInit(other.to_string()),
    })
}

/// Build the engine, then serve queries from `input` until `exit`.
pub fn run<B, P, R, W>(
    settings: &Settings,
    loader: &dyn DocumentLoader,
    backend: &mut B,
    progress: P,
    input: R,
    output: W,
) -> Result<LoopSummary>
where
    B: Backend,
    P: FnOnce(usize) -> Box<dyn Progress>,
    R: BufRead,
    W: Write,
{
    let mut engine = build_engine(settings, loader, backend, progress)?;
    let summary = repl::run(&mut engine, input, output)?;
    tracing::debug!(
        queries = summary.queries,
        failures = summary.failures,
        "session ended"
    );
    Ok(summary)
}
