//! Pipeline file discovery

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Pipelines directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
}

/// Find pipeline files in `dir` with the given extension, sorted by path
///
/// Only the top level is scanned unless `recursive` is set. Entries that
/// cannot be inspected are logged and skipped.
pub fn discover_pipelines(dir: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let extension = extension.trim_start_matches('.');
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), "").unwrap();
        fs::write(dir.path().join("a.xml"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("folder.xml")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.xml"), "").unwrap();

        let files = discover_pipelines(dir.path(), "xml", false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);

        let all = discover_pipelines(dir.path(), ".xml", true).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&dir.path().join("nested/c.xml")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = discover_pipelines(Path::new("/no/such/pipelines"), "xml", false).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingDirectory(_)));
    }
}
