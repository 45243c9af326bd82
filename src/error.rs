use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid data folder {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("unknown model '{model}': {reason}")]
    UnknownModel { model: String, reason: String },

    #[error("failed to load documents from {}: {source}", directory.display())]
    Ingestion {
        directory: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to build index: {0}")]
    IndexBuild(String),

    #[error("failed to create query engine: {0}")]
    QueryEngineInit(String),

    #[error("query failed: {0}")]
    QueryExecution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("answer generation failed: {0}")]
    Generation(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Process exit status for this error when it ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidPath { .. } => 2,
            Error::UnknownModel { .. } => 3,
            Error::Ingestion { .. } => 4,
            Error::IndexBuild(_) => 5,
            Error::QueryEngineInit(_) => 6,
            _ => 1,
        }
    }

    pub(crate) fn invalid_path(
        path: impl Into<PathBuf>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failures_have_distinct_exit_codes() {
        let errors = [
            Error::invalid_path("/nope", "does not exist"),
            Error::UnknownModel {
                model: "m".into(),
                reason: "missing".into(),
            },
            Error::Ingestion {
                directory: "/data/a".into(),
                source: Box::new(Error::Config("bad".into())),
            },
            Error::IndexBuild("x".into()),
            Error::QueryEngineInit("x".into()),
        ];

        let mut codes: Vec<u8> = errors.iter().map(Error::exit_code).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn ingestion_error_names_directory_and_cause() {
        let err = Error::Ingestion {
            directory: "/data/broken".into(),
            source: Box::new(Error::Config("not valid UTF-8".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/broken"));
        assert!(msg.contains("not valid UTF-8"));
    }
}
