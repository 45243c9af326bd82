use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    doc_id::DocumentId,
    error::{Error, Result},
    walker::{self, DiscoveredFile},
};

/// A document loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Path relative to the data folder, used for display.
    pub relative_path: String,
    pub title: String,
    pub text: String,
}

/// Loads the documents that live directly inside one directory.
pub trait DocumentLoader {
    fn load(&self, directory: &Path) -> Result<Vec<Document>>;
}

/// Reads supported text files from the filesystem.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// `root` is the data folder; document paths are displayed relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, file: &DiscoveredFile) -> Result<Option<Document>> {
        let bytes = std::fs::read(&file.absolute_path)?;
        let text = String::from_utf8(bytes).map_err(|_| {
            Error::Config(format!(
                "{} is not valid UTF-8",
                file.path.display()
            ))
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let relative_path = file
            .path
            .strip_prefix(&self.root)
            .unwrap_or(&file.path)
            .to_string_lossy()
            .to_string();

        Ok(Some(Document {
            id: DocumentId::new(&relative_path),
            title: extract_title(&text, &file.path),
            path: file.absolute_path.clone(),
            relative_path,
            text,
        }))
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self, directory: &Path) -> Result<Vec<Document>> {
        let files = walker::discover_files(directory)?;

        // Read in parallel; collecting into Result keeps the first failure.
        let loaded: Vec<Option<Document>> =
            files.par_iter().map(|file| self.read(file)).collect::<Result<_>>()?;

        Ok(loaded.into_iter().flatten().collect())
    }
}

/// Extract a title from file content.
///
/// Looks for the first markdown heading (line starting with `# `).
/// Falls back to the filename without extension.
fn extract_title(content: &str, file_path: &Path) -> String {
    for line in content.lines() {
        if let Some(heading) = line.trim().strip_prefix("# ") {
            let title = heading.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }

    file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_title_from_heading() {
        let content = "# My Document\n\nSome body text.";
        assert_eq!(extract_title(content, Path::new("file.md")), "My Document");
    }

    #[test]
    fn extract_title_skips_empty_heading() {
        let content = "# \n\nSome text with no real heading.";
        assert_eq!(extract_title(content, Path::new("notes.md")), "notes");
    }

    #[test]
    fn loads_documents_with_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("a");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("hello.md"), "# Hello\n\nGreetings.").unwrap();
        std::fs::write(sub.join("rust.txt"), "Rust is a language.").unwrap();

        let loader = FsLoader::new(tmp.path());
        let docs = loader.load(&sub).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].relative_path, "a/hello.md");
        assert_eq!(docs[0].title, "Hello");
        assert_eq!(docs[0].id, DocumentId::new("a/hello.md"));
        assert_eq!(docs[1].title, "rust");
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(tmp.path());
        assert!(loader.load(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn blank_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("blank.md"), "  \n\n").unwrap();
        let loader = FsLoader::new(tmp.path());
        assert!(loader.load(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_fails_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let loader = FsLoader::new(tmp.path());
        let err = loader.load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("bad.txt"));
    }
}
