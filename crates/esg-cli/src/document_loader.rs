use std::path::{Path, PathBuf};

use esg_session::SubjectDocument;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SkippedDocument {
    pub(crate) path: PathBuf,
    pub(crate) reason: String,
}

#[derive(Debug, Default)]
pub(crate) struct LoadedDocuments {
    pub(crate) documents: Vec<SubjectDocument>,
    pub(crate) skipped: Vec<SkippedDocument>,
}

/// Reads every path into memory. Unreadable paths are skipped, not fatal.
pub(crate) async fn load_documents<P: AsRef<Path>>(paths: &[P]) -> LoadedDocuments {
    let mut loaded = LoadedDocuments::default();
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(bytes) => loaded
                .documents
                .push(SubjectDocument::new(document_file_name(path), bytes)),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable document");
                loaded.skipped.push(SkippedDocument {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                });
            }
        }
    }
    loaded
}

fn document_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::load_documents;

    #[tokio::test]
    async fn functional_load_documents_reads_files_and_skips_missing() {
        let temp = tempdir().expect("tempdir");
        let report = temp.path().join("acme-2024.pdf");
        std::fs::write(&report, b"%PDF-1.7").expect("write report");
        let missing = temp.path().join("missing.pdf");

        let loaded = load_documents(&[report, missing.clone()]).await;
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.documents[0].file_name, "acme-2024.pdf");
        assert_eq!(loaded.documents[0].bytes, b"%PDF-1.7".to_vec());
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].path, missing);
    }

    #[tokio::test]
    async fn regression_load_documents_skips_directories() {
        let temp = tempdir().expect("tempdir");
        let loaded = load_documents(&[PathBuf::from(temp.path())]).await;
        assert!(loaded.documents.is_empty());
        assert_eq!(loaded.skipped.len(), 1);
    }
}
