//! Corpus loading from the local filesystem
//!
//! - a directory: every regular file below it is one document, in path order
//! - a `.json` file: a JSON array of strings
//! - any other file: one document per non-empty line

use crate::{LsaError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Load an ordered corpus from `path`
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let documents = if path.is_dir() {
        load_directory(path)?
    } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
        load_json(path)?
    } else {
        load_lines(path)?
    };

    if documents.is_empty() {
        return Err(LsaError::config(format!(
            "corpus at {} contains no documents",
            path.display()
        )));
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

fn load_directory(dir: &Path) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| LsaError::other(format!("walking {}: {}", dir.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Non UTF-8 bytes are replaced rather than rejected
        let bytes = fs::read(entry.path())?;
        documents.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(documents)
}

fn load_json(file: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(file)?;
    let documents: Vec<String> = serde_json::from_str(&content)?;
    Ok(documents)
}

fn load_lines(file: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(file)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_directory_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second document").unwrap();
        fs::write(dir.path().join("a.txt"), "first document").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "third document").unwrap();

        let corpus = load_corpus(dir.path()).unwrap();
        assert_eq!(
            corpus,
            vec!["first document", "second document", "third document"]
        );
    }

    #[test]
    fn test_load_json_array() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"["alpha beta", "gamma delta"]"#).unwrap();

        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_load_json_rejects_non_strings() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[1, 2, 3]"#).unwrap();

        let err = load_corpus(file.path()).unwrap_err();
        assert!(matches!(err, LsaError::Serialization(_)));
    }

    #[test]
    fn test_load_lines_skips_blank() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one line").unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "another line").unwrap();

        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus, vec!["one line", "another line"]);
    }

    #[test]
    fn test_empty_corpus_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(dir.path()).unwrap_err();
        assert!(matches!(err, LsaError::Configuration(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_corpus("/nonexistent/corpus.txt").unwrap_err();
        assert!(matches!(err, LsaError::Io(_)));
    }
}
