// LogViewer - app/ingest.rs
//
// Upload path: read log files, parse them, and save each as a new
// collection in the store.

use crate::app::store::LogStore;
use crate::core::parser;
use crate::platform::fs;
use crate::util::constants::LOG_FILE_EXTENSION;
use crate::util::error::IngestError;
use std::path::{Path, PathBuf};

/// Summary of one successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Name the caller asked for (the uploaded file's name).
    pub requested_name: String,

    /// Name the collection was stored under; differs when a suffix was added.
    pub stored_name: String,

    /// Records parsed and saved.
    pub records: usize,

    /// Non-blank lines that did not parse.
    pub lines_skipped: u64,
}

/// Parse `text` and save the records under `name` (made unique).
///
/// Text with no parseable lines is still saved, as an empty collection.
pub async fn ingest_text(
    store: &dyn LogStore,
    name: &str,
    text: &str,
) -> Result<IngestReport, IngestError> {
    let parsed = parser::parse_content(text);
    let stored_name = store
        .save(name, &parsed.records)
        .await
        .map_err(|source| IngestError::Store {
            name: name.to_string(),
            source,
        })?;

    tracing::info!(
        requested = name,
        stored = %stored_name,
        records = parsed.records.len(),
        skipped = parsed.lines_skipped,
        "Log file stored"
    );

    Ok(IngestReport {
        requested_name: name.to_string(),
        stored_name,
        records: parsed.records.len(),
        lines_skipped: parsed.lines_skipped,
    })
}

/// Upload each file in `paths`, in order.
///
/// Runs sequentially so two uploads with the same file name get suffixes in
/// the order given. One failure does not stop the rest.
pub async fn ingest_files(
    store: &dyn LogStore,
    paths: &[PathBuf],
) -> Vec<Result<IngestReport, IngestError>> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let result = ingest_path(store, path).await;
        if let Err(ref e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Upload failed");
        }
        results.push(result);
    }
    results
}

async fn ingest_path(store: &dyn LogStore, path: &Path) -> Result<IngestReport, IngestError> {
    let name = fs::file_name_of(path).ok_or_else(|| IngestError::NoFileName {
        path: path.to_path_buf(),
    })?;
    let text = fs::read_file_lossy(path)
        .await
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    ingest_text(store, &name, &text).await
}

/// Whether `path` uses the `.slg` log file convention. Advisory only.
pub fn has_log_extension(path: &Path) -> bool {
    fs::has_extension(path, LOG_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::MemoryStore;
    use crate::util::error::StoreError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ingest_text_parses_and_saves() {
        let store = MemoryStore::new();
        let text = "10:00:00,000 INFO up\nnoise\n10:00:01,000 ERROR down\n\n";
        let report = ingest_text(&store, "app.slg", text).await.unwrap();
        assert_eq!(report.stored_name, "app.slg");
        assert_eq!(report.records, 2);
        assert_eq!(report.lines_skipped, 1);

        let loaded = store.load_all("app.slg").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].message, "down");
    }

    #[tokio::test]
    async fn test_same_name_gets_suffix() {
        let store = MemoryStore::new();
        let first = ingest_text(&store, "x.slg", "").await.unwrap();
        let second = ingest_text(&store, "x.slg", "").await.unwrap();
        assert_eq!(first.stored_name, "x.slg");
        assert_eq!(second.stored_name, "x.slg_1");
        assert_eq!(second.requested_name, "x.slg");
        assert_eq!(second.records, 0);
        assert!(store.load_all("x.slg_1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let store = MemoryStore::without_listing();
        let err = ingest_text(&store, "x.slg", "").await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Store {
                source: StoreError::Unsupported { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_ingest_files_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.slg");
        std::fs::write(&good, "10:00:00,000 WARN careful\n").unwrap();
        let missing = dir.path().join("missing.slg");

        let store = MemoryStore::new();
        let results = ingest_files(&store, &[missing, good.clone(), good]).await;
        assert!(matches!(results[0], Err(IngestError::Read { .. })));
        assert_eq!(results[1].as_ref().unwrap().stored_name, "good.slg");
        assert_eq!(results[2].as_ref().unwrap().stored_name, "good.slg_1");
    }

    #[test]
    fn test_has_log_extension() {
        assert!(has_log_extension(Path::new("a/b/server.slg")));
        assert!(!has_log_extension(Path::new("server.txt")));
    }
}
