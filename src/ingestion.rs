use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    loader::{Document, DocumentLoader},
    progress::Progress,
};

/// What to do when loading one directory fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Abort ingestion with an error naming the directory.
    #[default]
    Fail,
    /// Log a warning and continue with the remaining directories.
    Skip,
}

/// Outcome of a completed ingestion pass.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub documents: Vec<Document>,
    /// Number of directories processed, including skipped ones.
    pub directories: usize,
    /// Directories whose load failed under [`FailurePolicy::Skip`].
    pub skipped: Vec<PathBuf>,
}

/// Load documents from every directory in order, advancing `progress` once
/// per directory.
pub fn ingest_directories(
    directories: &[PathBuf],
    loader: &dyn DocumentLoader,
    progress: &mut dyn Progress,
    policy: FailurePolicy,
) -> Result<IngestionReport> {
    let mut report = IngestionReport::default();

    for directory in directories {
        match loader.load(directory) {
            Ok(docs) => {
                tracing::debug!(
                    directory = %directory.display(),
                    count = docs.len(),
                    "loaded documents"
                );
                report.documents.extend(docs);
            }
            Err(e) => match policy {
                FailurePolicy::Fail => {
                    return Err(Error::Ingestion {
                        directory: directory.clone(),
                        source: Box::new(e),
                    });
                }
                FailurePolicy::Skip => {
                    tracing::warn!(
                        directory = %directory.display(),
                        error = %e,
                        "skipping directory"
                    );
                    report.skipped.push(directory.clone());
                }
            },
        }

        report.directories += 1;
        advisory(directory, progress.advance());
    }

    if let Err(e) = progress.finish() {
        tracing::debug!(error = %e, "progress reporter failed");
    }

    Ok(report)
}

fn advisory(directory: &Path, result: std::io::Result<()>) {
    if let Err(e) = result {
        tracing::debug!(
            directory = %directory.display(),
            error = %e,
            "progress reporter failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;
    use crate::doc_id::DocumentId;

    #[derive(Default)]
    struct FakeLoader {
        docs: HashMap<PathBuf, usize>,
        failing: Vec<PathBuf>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl DocumentLoader for FakeLoader {
        fn load(&self, directory: &Path) -> Result<Vec<Document>> {
            self.calls.borrow_mut().push(directory.to_path_buf());
            if self.failing.iter().any(|d| d == directory) {
                return Err(Error::Config("unreadable file".into()));
            }
            let n = self.docs.get(directory).copied().unwrap_or(0);
            Ok((0..n)
                .map(|i| {
                    let rel = format!("{}/{i}.md", directory.display());
                    Document {
                        id: DocumentId::new(&rel),
                        path: directory.join(format!("{i}.md")),
                        relative_path: rel,
                        title: format!("doc {i}"),
                        text: "content".into(),
                    }
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct Counter {
        advanced: usize,
        finished: bool,
    }

    impl Progress for Counter {
        fn advance(&mut self) -> std::io::Result<()> {
            self.advanced += 1;
            Ok(())
        }

        fn finish(&mut self) -> std::io::Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    struct Broken;

    impl Progress for Broken {
        fn advance(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("terminal gone"))
        }
    }

    fn dirs(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn accumulates_documents_and_advances_once_per_directory() {
        let directories = dirs(&["/data", "/data/a", "/data/b"]);
        let loader = FakeLoader {
            docs: HashMap::from([(PathBuf::from("/data/a"), 2)]),
            ..Default::default()
        };
        let mut progress = Counter::default();

        let report = ingest_directories(
            &directories,
            &loader,
            &mut progress,
            FailurePolicy::Fail,
        )
        .unwrap();

        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.directories, 3);
        assert_eq!(progress.advanced, 3);
        assert!(progress.finished);
        assert_eq!(*loader.calls.borrow(), directories);
    }

    #[test]
    fn empty_directory_still_advances() {
        let directories = dirs(&["/empty"]);
        let loader = FakeLoader::default();
        let mut progress = Counter::default();

        let report = ingest_directories(
            &directories,
            &loader,
            &mut progress,
            FailurePolicy::Fail,
        )
        .unwrap();

        assert!(report.documents.is_empty());
        assert_eq!(progress.advanced, 1);
    }

    #[test]
    fn fail_policy_stops_at_first_failure() {
        let directories = dirs(&["/data", "/data/bad", "/data/c"]);
        let loader = FakeLoader {
            failing: dirs(&["/data/bad"]),
            ..Default::default()
        };
        let mut progress = Counter::default();

        let err = ingest_directories(
            &directories,
            &loader,
            &mut progress,
            FailurePolicy::Fail,
        )
        .unwrap_err();

        match err {
            Error::Ingestion { directory, source } => {
                assert_eq!(directory, PathBuf::from("/data/bad"));
                assert!(source.to_string().contains("unreadable file"));
            }
            other => panic!("expected ingestion error, got {other:?}"),
        }
        assert_eq!(loader.calls.borrow().len(), 2);
        assert_eq!(progress.advanced, 1);
    }

    #[test]
    fn skip_policy_continues_past_failures() {
        let directories = dirs(&["/data", "/data/bad", "/data/c"]);
        let loader = FakeLoader {
            docs: HashMap::from([(PathBuf::from("/data/c"), 1)]),
            failing: dirs(&["/data/bad"]),
            ..Default::default()
        };
        let mut progress = Counter::default();

        let report = ingest_directories(
            &directories,
            &loader,
            &mut progress,
            FailurePolicy::Skip,
        )
        .unwrap();

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.skipped, dirs(&["/data/bad"]));
        assert_eq!(progress.advanced, 3);
    }

    #[test]
    fn broken_reporter_does_not_abort() {
        let directories = dirs(&["/data", "/data/a"]);
        let loader = FakeLoader {
            docs: HashMap::from([(PathBuf::from("/data/a"), 1)]),
            ..Default::default()
        };

        let report = ingest_directories(
            &directories,
            &loader,
            &mut Broken,
            FailurePolicy::Fail,
        )
        .unwrap();

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.directories, 2);
    }
}
