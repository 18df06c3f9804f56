// LogViewer - app/store.rs
//
// Durable per-file record collections.
//
// The `LogStore` trait is the only persistence surface the rest of the crate
// sees; a store is constructed by the host and injected into the session.
//
// `FileStore` keeps one JSON Lines file per collection:
//   <store dir>/log_<hex(name)>.jsonl          names up to 64 bytes
//   <store dir>/log_sha256_<digest>.jsonl      longer names
// The first line of every file is a header carrying the collection name, so
// digest-named files can still be listed. File names stay bounded whatever
// the user named the upload. Collections are written to a sibling temp
// file, synced, then renamed into place, so a crash mid-save never leaves a
// half-written collection visible.
//
// Single-writer assumption: nothing here locks. Two saves of the same name
// racing each other may both pick the same suffix; callers serialise
// save/delete per name (a `Session` does so by taking `&mut self`).

use crate::core::model::LogRecord;
use crate::util::constants::{
    COLLECTION_DIGEST_MARKER, COLLECTION_EXTENSION, COLLECTION_PREFIX, COLLECTION_TEMP_EXTENSION,
    MAX_HEX_NAME_LEN, MAX_NAME_SUFFIX,
};
use crate::util::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// A record as persisted, with its store-assigned sequence key.
///
/// The key is bookkeeping only; it is never used for ordering or display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: u64,
    #[serde(flatten)]
    pub record: LogRecord,
}

/// Borrowing twin of [`StoredRecord`] so saving does not clone messages.
#[derive(Serialize)]
struct StoredRecordRef<'a> {
    key: u64,
    #[serde(flatten)]
    record: &'a LogRecord,
}

/// First line of a collection file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectionHeader<'a> {
    #[serde(borrow)]
    name: std::borrow::Cow<'a, str>,
}

/// What a directory entry's file name says about the collection in it.
#[derive(Debug, PartialEq, Eq)]
enum CollectionFile {
    /// Name recovered from the hex-encoded file name.
    Named(String),
    /// Named by digest; the name is in the header line.
    Digest,
}

/// Persistence capability for named log collections.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist `records` as a new collection.
    ///
    /// If `name` is taken, `_1`, `_2`, ... is appended until the name is
    /// free. Returns the name actually used.
    async fn save(&self, name: &str, records: &[LogRecord]) -> Result<String, StoreError>;

    /// All collection names currently stored.
    async fn list_names(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Every record saved under `name`, in storage order.
    async fn load_all(&self, name: &str) -> Result<Vec<LogRecord>, StoreError>;

    /// Remove the collection. Deleting an absent name succeeds.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// First of `name`, `name_1`, `name_2`, ... not present in `existing`.
pub fn unique_name(name: &str, existing: &BTreeSet<String>) -> Result<String, StoreError> {
    if !existing.contains(name) {
        return Ok(name.to_string());
    }
    (1..=MAX_NAME_SUFFIX)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !existing.contains(candidate))
        .ok_or_else(|| StoreError::NameExhausted {
            name: name.to_string(),
            max: MAX_NAME_SUFFIX,
        })
}

// =============================================================================
// FileStore
// =============================================================================

/// Durable store backed by a directory of JSON Lines files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store collections under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        let mut stem = hex::encode(name.as_bytes());
        if stem.len() > MAX_HEX_NAME_LEN {
            stem = format!(
                "{COLLECTION_DIGEST_MARKER}{}",
                hex::encode(Sha256::digest(name.as_bytes()))
            );
        }
        self.dir
            .join(format!("{COLLECTION_PREFIX}{stem}.{COLLECTION_EXTENSION}"))
    }

    /// Classify a directory entry's file name.
    /// `None` for anything that is not a finished collection file.
    fn classify_file(file_name: &str) -> Option<CollectionFile> {
        let stem = file_name
            .strip_prefix(COLLECTION_PREFIX)?
            .strip_suffix(COLLECTION_EXTENSION)?
            .strip_suffix('.')?;
        if let Some(digest) = stem.strip_prefix(COLLECTION_DIGEST_MARKER) {
            let valid = digest.len() == 64 && hex::decode(digest).is_ok();
            return valid.then_some(CollectionFile::Digest);
        }
        let bytes = hex::decode(stem).ok()?;
        String::from_utf8(bytes).ok().map(CollectionFile::Named)
    }

    /// Collection name from the header line of the file at `path`.
    async fn read_header_name(path: &Path) -> io::Result<Option<String>> {
        let file = tokio::fs::File::open(path).await?;
        let mut first = String::new();
        BufReader::new(file).read_line(&mut first).await?;
        Ok(serde_json::from_str::<CollectionHeader>(first.trim_end())
            .ok()
            .map(|header| header.name.into_owned()))
    }

    fn io_error(path: &Path, operation: &'static str) -> impl FnOnce(io::Error) -> StoreError {
        let path = path.to_path_buf();
        move |source| StoreError::Io {
            path,
            operation,
            source,
        }
    }

    fn encode(name: &str, records: &[LogRecord]) -> Result<Vec<u8>, StoreError> {
        let serialize_error = |source| StoreError::Serialize {
            name: name.to_string(),
            source,
        };

        let mut body = Vec::new();
        let header = CollectionHeader { name: name.into() };
        serde_json::to_writer(&mut body, &header).map_err(serialize_error)?;
        body.push(b'\n');

        for (idx, record) in records.iter().enumerate() {
            let line = StoredRecordRef {
                key: idx as u64 + 1,
                record,
            };
            serde_json::to_writer(&mut body, &line).map_err(serialize_error)?;
            body.push(b'\n');
        }
        Ok(body)
    }

    /// Write `body` to `path` atomically (write temp, sync, rename).
    async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension(COLLECTION_TEMP_EXTENSION);

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(Self::io_error(&tmp, "create"))?;
        file.write_all(body)
            .await
            .map_err(Self::io_error(&tmp, "write"))?;
        file.sync_all()
            .await
            .map_err(Self::io_error(&tmp, "sync"))?;
        drop(file);

        if let Err(source) = tokio::fs::rename(&tmp, path).await {
            // Clean up the temp file on failure; ignore any secondary error.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                operation: "rename",
                source,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for FileStore {
    async fn save(&self, name: &str, records: &[LogRecord]) -> Result<String, StoreError> {
        let existing = self.list_names().await?;
        let assigned = unique_name(name, &existing)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(Self::io_error(&self.dir, "create store directory"))?;

        let body = Self::encode(&assigned, records)?;
        let path = self.collection_path(&assigned);
        Self::write_atomic(&path, &body).await?;

        tracing::info!(
            requested = name,
            name = %assigned,
            records = records.len(),
            path = %path.display(),
            "Log file saved"
        );
        Ok(assigned)
    }

    async fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let unsupported = |source: io::Error| StoreError::Unsupported {
            operation: "listing stored files",
            source: Some(source),
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // Nothing saved yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(unsupported(e)),
        };

        let mut names = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(unsupported)? {
            let file_name = entry.file_name();
            match file_name.to_str().and_then(Self::classify_file) {
                Some(CollectionFile::Named(name)) => {
                    names.insert(name);
                }
                Some(CollectionFile::Digest) => match Self::read_header_name(&entry.path()).await {
                    Ok(Some(name)) => {
                        names.insert(name);
                    }
                    Ok(None) => {
                        tracing::warn!(file = ?file_name, "Skipping collection without a header");
                    }
                    Err(err) => {
                        tracing::warn!(file = ?file_name, %err, "Skipping unreadable collection");
                    }
                },
                None => {}
            }
        }
        Ok(names)
    }

    async fn load_all(&self, name: &str) -> Result<Vec<LogRecord>, StoreError> {
        let path = self.collection_path(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path,
                    operation: "read",
                    source,
                })
            }
        };

        let mut lines = content.lines().enumerate().peekable();
        let header = lines
            .peek()
            .and_then(|&(_, first)| serde_json::from_str::<CollectionHeader>(first).ok());
        if let Some(header) = header {
            // A digest-named file must belong to the name asked for.
            if header.name != name {
                return Err(StoreError::NotFound {
                    name: name.to_string(),
                });
            }
            lines.next();
        }

        let mut records = Vec::new();
        for (line_idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(line) {
                Ok(stored) => records.push(stored.record),
                Err(err) => {
                    tracing::warn!(
                        %err,
                        name,
                        line_number = line_idx + 1,
                        "Skipping corrupt stored record"
                    );
                }
            }
        }

        tracing::debug!(name, records = records.len(), "Log file loaded");
        Ok(records)
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.collection_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(name, "Log file deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(name, "Delete of absent log file ignored");
                Ok(())
            }
            Err(source) => Err(StoreError::Io {
                path,
                operation: "delete",
                source,
            }),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Process-local store. Same contract as [`FileStore`] except durability:
/// contents vanish with the value.
#[derive(Debug)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<StoredRecord>>>,
    listing_supported: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(BTreeMap::new()),
            listing_supported: true,
        }
    }

    /// A store whose name listing is unavailable, like a storage backend
    /// that cannot enumerate its collections. `save` fails too, because it
    /// needs the listing to pick a unique name.
    pub fn without_listing() -> Self {
        Self {
            listing_supported: false,
            ..Self::new()
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn save(&self, name: &str, records: &[LogRecord]) -> Result<String, StoreError> {
        let existing = self.list_names().await?;
        let assigned = unique_name(name, &existing)?;
        let stored = records
            .iter()
            .enumerate()
            .map(|(idx, record)| StoredRecord {
                key: idx as u64 + 1,
                record: record.clone(),
            })
            .collect();
        self.collections.lock().await.insert(assigned.clone(), stored);
        tracing::debug!(name = %assigned, records = records.len(), "Log file saved in memory");
        Ok(assigned)
    }

    async fn list_names(&self) -> Result<BTreeSet<String>, StoreError> {
        if !self.listing_supported {
            return Err(StoreError::Unsupported {
                operation: "listing stored files",
                source: None,
            });
        }
        Ok(self.collections.lock().await.keys().cloned().collect())
    }

    async fn load_all(&self, name: &str) -> Result<Vec<LogRecord>, StoreError> {
        self.collections
            .lock()
            .await
            .get(name)
            .map(|stored| stored.iter().map(|s| s.record.clone()).collect())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.collections.lock().await.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;
    use crate::core::parser;
    use tempfile::TempDir;

    fn sample() -> Vec<LogRecord> {
        parser::parse(
            "2024-01-01 10:00:05,500 ERROR fail\n\
             2024-01-01 10:00:00,000 INFO start\n\
             10:00:02,000 WARN {\"nested\": \"json\"}\n",
        )
    }

    fn sorted_copy(records: &[LogRecord]) -> Vec<LogRecord> {
        let mut copy = records.to_vec();
        copy.sort_by(|a, b| {
            (a.timestamp.as_str(), &a.message).cmp(&(b.timestamp.as_str(), &b.message))
        });
        copy
    }

    /// Contract checks shared by every implementation.
    async fn check_contract(store: &dyn LogStore) {
        let records = sample();

        // Round-trip equal as a multiset.
        let name = store.save("app.slg", &records).await.unwrap();
        assert_eq!(name, "app.slg");
        let loaded = store.load_all("app.slg").await.unwrap();
        assert_eq!(sorted_copy(&loaded), sorted_copy(&records));

        // Collisions get suffixed names.
        assert_eq!(store.save("app.slg", &records[..1]).await.unwrap(), "app.slg_1");
        assert_eq!(store.save("app.slg", &[]).await.unwrap(), "app.slg_2");
        let names = store.list_names().await.unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["app.slg", "app.slg_1", "app.slg_2"]
        );
        assert_eq!(store.load_all("app.slg_1").await.unwrap().len(), 1);
        assert!(store.load_all("app.slg_2").await.unwrap().is_empty());

        // Unknown names are an error, not an empty result.
        assert!(matches!(
            store.load_all("missing").await,
            Err(StoreError::NotFound { .. })
        ));

        // Delete removes the whole collection and is idempotent.
        store.delete("app.slg").await.unwrap();
        store.delete("app.slg").await.unwrap();
        assert!(!store.list_names().await.unwrap().contains("app.slg"));
        assert!(matches!(
            store.load_all("app.slg").await,
            Err(StoreError::NotFound { .. })
        ));

        // The freed name is reused.
        assert_eq!(store.save("app.slg", &records).await.unwrap(), "app.slg");
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        check_contract(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store_contract() {
        let dir = TempDir::new().unwrap();
        check_contract(&FileStore::new(dir.path().join("logs"))).await;
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let records = sample();
        FileStore::new(dir.path())
            .save("persist.slg", &records)
            .await
            .unwrap();

        let reopened = FileStore::new(dir.path());
        assert!(reopened.list_names().await.unwrap().contains("persist.slg"));
        assert_eq!(reopened.load_all("persist.slg").await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_file_store_handles_awkward_names() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let name = "../etc/passwd 日志 .slg";
        assert_eq!(store.save(name, &sample()).await.unwrap(), name);
        assert!(store.list_names().await.unwrap().contains(name));
        // Nothing escaped the store directory.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_file_store_missing_dir_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("not-yet"));
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_unlistable_dir_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"not a directory").unwrap();
        let store = FileStore::new(&file);
        assert!(matches!(
            store.list_names().await,
            Err(StoreError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_lines_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.save("a.slg", &sample()).await.unwrap();

        let path = store.collection_path("a.slg");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&path, content).unwrap();
        std::fs::write(dir.path().join("README.txt"), b"unrelated").unwrap();
        std::fs::write(dir.path().join("log_zz.jsonl"), b"").unwrap();

        assert_eq!(store.load_all("a.slg").await.unwrap().len(), 3);
        let names = store.list_names().await.unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a.slg"]);
    }

    #[tokio::test]
    async fn test_persisted_lines_carry_sequence_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.save("k.slg", &sample()).await.unwrap();
        let content = std::fs::read_to_string(store.collection_path("k.slg")).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(r#"{"name":"k.slg"}"#));
        let stored: Vec<StoredRecord> = lines.map(|l| serde_json::from_str(l).unwrap()).collect();
        let keys: Vec<u64> = stored.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(stored[0].record.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_memory_store_without_listing() {
        let store = MemoryStore::without_listing();
        assert!(matches!(
            store.list_names().await,
            Err(StoreError::Unsupported { source: None, .. })
        ));
        assert!(store.save("x", &sample()).await.is_err());
        store.delete("x").await.unwrap();
    }

    #[test]
    fn test_unique_name_suffixes() {
        let existing: BTreeSet<String> = ["a", "a_1", "a_3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_name("b", &existing).unwrap(), "b");
        assert_eq!(unique_name("a", &existing).unwrap(), "a_2");
    }

    #[test]
    fn test_classify_file_rejects_temp_and_foreign_files() {
        let encoded = hex::encode("x.slg");
        assert_eq!(
            FileStore::classify_file(&format!("log_{encoded}.jsonl")),
            Some(CollectionFile::Named("x.slg".to_string()))
        );
        assert_eq!(FileStore::classify_file(&format!("log_{encoded}.jsonl.tmp")), None);
        assert_eq!(FileStore::classify_file("other.jsonl"), None);

        let digest = "ab".repeat(32);
        assert_eq!(
            FileStore::classify_file(&format!("log_sha256_{digest}.jsonl")),
            Some(CollectionFile::Digest)
        );
        assert_eq!(FileStore::classify_file("log_sha256_abcd.jsonl"), None);
    }

    #[tokio::test]
    async fn test_file_store_long_names_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let long = format!("{}.slg", "日".repeat(70));
        assert!(long.len() >= 200);
        let records = sample();

        assert_eq!(store.save(&long, &records).await.unwrap(), long);
        assert_eq!(store.save(&long, &[]).await.unwrap(), format!("{long}_1"));
        store.save("short.slg", &records).await.unwrap();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let file_name = entry.unwrap().file_name();
            assert!(file_name.len() < 100, "unbounded file name {file_name:?}");
        }

        let reopened = FileStore::new(dir.path());
        let names: Vec<_> = reopened.list_names().await.unwrap().into_iter().collect();
        assert_eq!(names, vec!["short.slg".to_string(), long.clone(), format!("{long}_1")]);
        assert_eq!(reopened.load_all(&long).await.unwrap(), records);
        assert!(reopened.load_all(&format!("{long}_1")).await.unwrap().is_empty());

        reopened.delete(&long).await.unwrap();
        assert!(matches!(
            reopened.load_all(&long).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(!reopened.list_names().await.unwrap().contains(&long));
    }

    #[tokio::test]
    async fn test_file_store_rejects_header_of_another_name() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let long = "x".repeat(100);
        store.save(&long, &sample()).await.unwrap();

        // Same file presented under a different long name.
        let other = "y".repeat(100);
        std::fs::rename(store.collection_path(&long), store.collection_path(&other)).unwrap();
        assert!(matches!(
            store.load_all(&other).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
