//! In-memory record collection backed by a JSON snapshot.
//!
//! The store is pure data access. It never talks to the network; the
//! orchestrator decides when to persist and when to post.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Content, Record, RecordId};
use crate::status::StatusSink;
use crate::store::file::{read_json, write_json};
use crate::store::seed::default_records;

/// Snapshot entry as found on disk.
///
/// Older or hand-edited snapshots may lack the sync metadata; [`load`]
/// normalizes those fields.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(alias = "quote")]
    text: String,
    #[serde(alias = "author")]
    category: String,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    synced: Option<bool>,
}

impl StoredRecord {
    fn normalize(self, now: DateTime<Utc>) -> Record {
        let content = Content::new(self.text, self.category);
        match self.id {
            Some(id) => Record {
                id,
                content,
                updated_at: self.updated_at.unwrap_or(now),
                // Loaded-but-unmarked data is assumed previously synced.
                synced: self.synced.unwrap_or(true),
            },
            // No id means the remote never confirmed it.
            None => Record {
                id: RecordId::new_local(),
                content,
                updated_at: self.updated_at.unwrap_or(now),
                synced: false,
            },
        }
    }
}

/// One entry handed over by an import collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    #[serde(default, alias = "quote")]
    pub text: Option<String>,
    #[serde(default, alias = "author")]
    pub category: Option<String>,
}

impl ImportEntry {
    /// Build an entry from known values.
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            category: Some(category.into()),
        }
    }

    /// Validate and convert into content.
    ///
    /// # Errors
    ///
    /// Returns `Error::RequiredField` naming the first missing field.
    pub fn into_content(self) -> Result<Content> {
        let text = non_blank(self.text).ok_or_else(|| Error::RequiredField("text".into()))?;
        let category =
            non_blank(self.category).ok_or_else(|| Error::RequiredField("category".into()))?;
        Ok(Content::new(text, category))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of [`RecordStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new unsynced record was appended.
    Added(Record),
    /// An unsynced record with identical content is already waiting to be
    /// posted; nothing was appended.
    Duplicate(Record),
}

impl AddOutcome {
    /// The new or existing record.
    #[must_use]
    pub const fn record(&self) -> &Record {
        match self {
            Self::Added(record) | Self::Duplicate(record) => record,
        }
    }
}

/// Statistics for an import batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Entries appended as new unsynced records.
    pub added: usize,
    /// Entries skipped because identical content is already pending.
    pub duplicates: usize,
    /// Entries skipped as malformed or for missing or blank fields.
    pub invalid: usize,
}

impl ImportStats {
    /// Total entries seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.added + self.duplicates + self.invalid
    }
}

/// Owner of the record collection and its persisted snapshot.
pub struct RecordStore {
    path: PathBuf,
    records: Vec<Record>,
    dirty: bool,
    sink: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("records", &self.records.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Reconstruct records from the snapshot at `path`.
///
/// Returns `(records, seeded)`; `seeded` is true when no snapshot existed and
/// the default collection was returned instead.
///
/// # Errors
///
/// Returns `Error::CorruptSnapshot` if the file cannot be parsed and
/// `Error::Io` if it cannot be read.
pub fn load(path: &Path) -> Result<(Vec<Record>, bool)> {
    let stored: Option<Vec<StoredRecord>> = read_json(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
            Error::CorruptSnapshot {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
        _ => Error::Io(e),
    })?;

    let Some(stored) = stored else {
        debug!(path = %path.display(), "No snapshot found, using default records");
        return Ok((default_records(), true));
    };

    let now = Utc::now();
    let records = stored.into_iter().map(|r| r.normalize(now)).collect();
    Ok((records, false))
}

impl RecordStore {
    /// Open the store at `path`, loading or seeding the collection.
    ///
    /// A seeded store starts dirty so the first persist writes the snapshot.
    ///
    /// # Errors
    ///
    /// See [`load`].
    pub fn open(path: impl Into<PathBuf>, sink: Arc<dyn StatusSink>) -> Result<Self> {
        let path = path.into();
        let (records, seeded) = load(&path)?;
        debug!(path = %path.display(), count = records.len(), seeded, "Opened record store");
        Ok(Self {
            path,
            records,
            dirty: seeded,
            sink,
        })
    }

    /// Snapshot location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in slot order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access to the slots. The slot count cannot change.
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Replace the collection with a reconciled one.
    ///
    /// Returns whether anything changed; an unchanged collection does not
    /// mark the store dirty.
    pub fn replace(&mut self, records: Vec<Record>) -> bool {
        if records == self.records {
            return false;
        }
        self.records = records;
        self.dirty = true;
        true
    }

    /// Flag the in-memory state as not yet written.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True if the in-memory state differs from the last successful persist.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Overwrite the snapshot with the full collection.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the write fails. The in-memory state is kept
    /// and the store stays dirty so the next attempt retries.
    pub fn persist(&mut self) -> Result<()> {
        match write_json(&self.path, &self.records) {
            Ok(()) => {
                self.dirty = false;
                self.sink
                    .notify(&format!("Saved {} records", self.records.len()), false);
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(path = %self.path.display(), error = %e, "Persist failed");
                let err = Error::Storage {
                    path: self.path.clone(),
                    message: e.to_string(),
                };
                self.sink.notify(&err.to_string(), true);
                Err(err)
            }
        }
    }

    /// Append a new unsynced record with a local-pending id.
    ///
    /// Does not persist or post.
    ///
    /// # Errors
    ///
    /// Returns `Error::RequiredField` if `text` or `category` is blank.
    pub fn add(&mut self, content: Content) -> Result<AddOutcome> {
        let content = ImportEntry {
            text: Some(content.text),
            category: Some(content.category),
        }
        .into_content()?;

        if let Some(existing) = self
            .records
            .iter()
            .find(|r| r.is_pending_post() && r.content == content)
        {
            debug!(id = %existing.id, "Identical content already pending");
            return Ok(AddOutcome::Duplicate(existing.clone()));
        }

        let record = Record::new_local(content);
        debug!(id = %record.id, "Added record");
        self.records.push(record.clone());
        self.dirty = true;
        Ok(AddOutcome::Added(record))
    }

    /// Add a batch of imported entries, skipping invalid ones.
    pub fn import(&mut self, entries: impl IntoIterator<Item = ImportEntry>) -> ImportStats {
        let mut stats = ImportStats::default();

        for (index, entry) in entries.into_iter().enumerate() {
            let content = match entry.into_content() {
                Ok(content) => content,
                Err(e) => {
                    debug!(index, error = %e, "Skipping import entry");
                    stats.invalid += 1;
                    continue;
                }
            };

            match self.add(content) {
                Ok(AddOutcome::Added(_)) => stats.added += 1,
                Ok(AddOutcome::Duplicate(_)) => stats.duplicates += 1,
                Err(_) => stats.invalid += 1,
            }
        }

        stats
    }

    /// Number of records not known to match the remote.
    #[must_use]
    pub fn unsynced_count(&self) -> usize {
        self.records.iter().filter(|r| !r.synced).count()
    }

    /// Records matching `keyword` (case-insensitive, over text and category)
    /// and, if given, exactly in `category` (case-insensitive).
    ///
    /// A missing or blank keyword matches everything.
    #[must_use]
    pub fn filter(&self, keyword: Option<&str>, category: Option<&str>) -> Vec<&Record> {
        let keyword = keyword
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());
        let category = category.map(|c| c.trim().to_lowercase());

        self.records
            .iter()
            .filter(|r| keyword.as_deref().is_none_or(|k| r.content.matches(k)))
            .filter(|r| {
                category
                    .as_deref()
                    .is_none_or(|c| r.content.category.to_lowercase() == c)
            })
            .collect()
    }

    /// A random record from the filtered view.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(
        &self,
        keyword: Option<&str>,
        category: Option<&str>,
        rng: &mut R,
    ) -> Option<&Record> {
        self.filter(keyword, category).choose(rng).copied()
    }

    /// Distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.content.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemorySink;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> (RecordStore, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let store = RecordStore::open(dir.path().join("records.json"), sink.clone()).unwrap();
        (store, sink)
    }

    #[test]
    fn test_open_without_snapshot_seeds_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = open_store(&temp_dir);

        assert!(!store.records().is_empty());
        assert!(store.is_dirty());
        assert_eq!(store.unsynced_count(), 0);
    }

    #[test]
    fn test_load_normalizes_missing_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(
            &path,
            r#"[
                {"id": 12, "text": "A", "category": "X"},
                {"quote": "B", "author": "Y"},
                {"id": "local-1", "text": "C", "category": "Z", "synced": false,
                 "updatedAt": "2025-01-20T10:00:00Z"}
            ]"#,
        )
        .unwrap();

        let (records, seeded) = load(&path).unwrap();
        assert!(!seeded);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, RecordId::Remote(12));
        assert!(records[0].synced);

        assert!(records[1].id.is_pending());
        assert!(!records[1].synced);
        assert_eq!(records[1].content, Content::new("B", "Y"));

        assert!(!records[2].synced);
        assert_eq!(records[2].updated_at.to_rfc3339(), "2025-01-20T10:00:00+00:00");
    }

    #[test]
    fn test_load_corrupt_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, "[{\"text\": ").unwrap();

        assert!(matches!(load(&path), Err(Error::CorruptSnapshot { .. })));
    }

    #[test]
    fn test_persist_round_trips_and_notifies() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, sink) = open_store(&temp_dir);
        store.add(Content::new("New", "Cat")).unwrap();
        store.persist().unwrap();

        assert!(!store.is_dirty());
        assert!(sink.contains("Saved"));

        let (reloaded, seeded) = load(store.path()).unwrap();
        assert!(!seeded);
        assert_eq!(reloaded, store.records());
    }

    #[test]
    fn test_persist_failure_keeps_state_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the snapshot file should be makes the rename fail.
        let path = temp_dir.path().join("records.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let sink = Arc::new(MemorySink::new());
        let mut store = RecordStore {
            path,
            records: default_records(),
            dirty: false,
            sink: sink.clone(),
        };

        let result = store.persist();
        assert!(matches!(result, Err(Error::Storage { .. })));
        assert!(store.is_dirty());
        assert_eq!(store.records().len(), default_records().len());
        assert_eq!(sink.errors().len(), 1);
    }

    #[test]
    fn test_add_marks_unsynced_and_dedups_pending() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, _) = open_store(&temp_dir);
        let before = store.records().len();

        let first = store.add(Content::new("A", "X")).unwrap();
        assert!(matches!(first, AddOutcome::Added(_)));
        assert!(!first.record().synced);
        assert!(first.record().id.is_pending());

        let second = store.add(Content::new("A", "X")).unwrap();
        assert!(matches!(second, AddOutcome::Duplicate(_)));
        assert_eq!(second.record().id, first.record().id);
        assert_eq!(store.records().len(), before + 1);
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, _) = open_store(&temp_dir);

        let result = store.add(Content::new("text", "   "));
        assert!(matches!(result, Err(Error::RequiredField(f)) if f == "category"));
    }

    #[test]
    fn test_import_skips_invalid_entries() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, _) = open_store(&temp_dir);

        let stats = store.import(vec![
            ImportEntry::new("One", "A"),
            ImportEntry {
                text: Some("No category".into()),
                category: None,
            },
            ImportEntry::new("", "B"),
            ImportEntry::new("One", "A"),
            ImportEntry::new("Two", "B"),
        ]);

        assert_eq!(stats.added, 2);
        assert_eq!(stats.invalid, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.total(), 5);
        assert_eq!(store.unsynced_count(), 2);
    }

    #[test]
    fn test_replace_detects_changes() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, _) = open_store(&temp_dir);
        store.persist().unwrap();

        let same = store.records().to_vec();
        assert!(!store.replace(same));
        assert!(!store.is_dirty());

        let mut changed = store.records().to_vec();
        changed[0].synced = false;
        assert!(store.replace(changed));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_filter_and_categories() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = open_store(&temp_dir);

        let all = store.filter(None, None);
        assert_eq!(all.len(), store.records().len());
        assert_eq!(store.filter(Some("   "), None).len(), all.len());

        let hungry = store.filter(Some("HUNGRY"), None);
        assert_eq!(hungry.len(), 1);

        let perseverance = store.filter(None, Some("perseverance"));
        assert_eq!(perseverance.len(), 3);

        let categories = store.categories();
        let mut sorted = categories.clone();
        sorted.sort_unstable();
        assert_eq!(categories, sorted);
        assert!(categories.contains(&"Work"));
    }

    #[test]
    fn test_random_respects_filter() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = open_store(&temp_dir);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            let record = store.random(None, Some("Work"), &mut rng).unwrap();
            assert_eq!(record.content.category, "Work");
        }
        assert!(store.random(Some("no such quote"), None, &mut rng).is_none());
    }
}
