use std::{
    fs::ReadDir,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// A document file found directly inside a directory.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path as found in the directory (not canonicalized).
    pub path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

/// Supported file extensions for document discovery.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["md", "markdown", "txt", "rst", "org"];

/// List every directory at or below `root`, including `root` itself.
///
/// The root comes first and the remaining entries are sorted, so two calls
/// over an unchanged tree return the same list. Symlinked directories are not
/// followed. Only a root that cannot be listed is an error.
pub fn list_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root)
        .map_err(|e| Error::invalid_path(root, e))?;
    if !meta.is_dir() {
        return Err(Error::invalid_path(root, "not a directory"));
    }
    let entries =
        std::fs::read_dir(root).map_err(|e| Error::invalid_path(root, e))?;

    let mut found = Vec::new();
    collect_subdirectories(entries, &mut found);
    found.sort();

    let mut directories = Vec::with_capacity(found.len() + 1);
    directories.push(root.to_path_buf());
    directories.extend(found);
    Ok(directories)
}

/// A subdirectory that cannot be listed is still returned, so loading it
/// fails under the ingestion failure policy, but nothing below it is.
fn collect_subdirectories(entries: ReadDir, found: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        // file_type() does not follow symlinks, so linked directories are
        // skipped here.
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping entry of unknown type"
                );
                continue;
            }
        }

        match std::fs::read_dir(&path) {
            Ok(children) => collect_subdirectories(children, found),
            Err(e) => tracing::warn!(
                directory = %path.display(),
                error = %e,
                "cannot list directory, not descending into it"
            ),
        }
        found.push(path);
    }
}

/// List supported document files directly inside `dir` (no recursion).
///
/// Skips hidden files (names starting with `.`) and broken symlinks.
pub fn discover_files(dir: &Path) -> Result<Vec<DiscoveredFile>> {
    let mut results = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;

        let absolute_path = if file_type.is_symlink() {
            match path.canonicalize() {
                Ok(p) if p.is_file() => p,
                _ => continue,
            }
        } else if file_type.is_file() {
            path.canonicalize()?
        } else {
            continue;
        };

        if is_supported(&path) {
            results.push(DiscoveredFile {
                path,
                absolute_path,
            });
        }
    }

    results.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(results)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}
