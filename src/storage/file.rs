//! File-backed note store
//!
//! The whole collection lives in one pretty-printed JSON array. Every change
//! rewrites the file from a background task; callers never wait on disk I/O.
//! A crash before the task finishes can lose the latest change.

use super::{LoadReport, NoteStore, StorageError, StorageKind, StorageResult};
use crate::note::{fresh_id, NewNote, Note};
use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Note store persisted as a JSON document
pub struct FileNoteStore {
    path: PathBuf,
    notes: Vec<Note>,
    writer: SnapshotWriter,
}

impl FileNoteStore {
    /// Create a store backed by `path`; nothing is read until `initialize`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            writer: SnapshotWriter::new(path.clone()),
            path,
            notes: Vec::new(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of background writes not yet awaited
    pub fn pending_writes(&self) -> usize {
        self.writer.pending.iter().filter(|h| !h.is_finished()).count()
    }

    fn load(&self) -> StorageResult<Vec<Note>> {
        let content = std::fs::read_to_string(&self.path)?;
        let notes = serde_json::from_str(&content)?;
        Ok(notes)
    }

    fn save(&mut self) {
        match serde_json::to_string_pretty(&self.notes) {
            Ok(json) => self.writer.submit(json),
            Err(e) => tracing::error!("Failed to serialize notes for {:?}: {}", self.path, e),
        }
    }
}

impl NoteStore for FileNoteStore {
    fn kind(&self) -> StorageKind {
        StorageKind::File
    }

    fn initialize(&mut self) -> LoadReport {
        match self.load() {
            Ok(notes) => {
                warn_duplicate_ids(&self.path, &notes);
                self.notes = notes;
                LoadReport::Loaded {
                    count: self.notes.len(),
                }
            }
            Err(StorageError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No notes file at {:?} yet, starting empty", self.path);
                self.notes.clear();
                LoadReport::StartedEmpty {
                    cause: e.to_string(),
                }
            }
            Err(e) => {
                // The next change rewrites the file, so the old content is lost.
                tracing::warn!(
                    "Could not load notes from {:?}, starting empty and replacing it on the next change: {}",
                    self.path,
                    e
                );
                self.notes.clear();
                LoadReport::StartedEmpty {
                    cause: e.to_string(),
                }
            }
        }
    }

    fn add_note(&mut self, new_note: NewNote) -> Note {
        let id = fresh_id(|candidate| self.notes.iter().any(|n| n.id == candidate));
        let note = new_note.into_note(id);
        self.notes.push(note.clone());
        self.save();
        note
    }

    fn search_notes(&mut self, query: &str) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|note| note.matches(query))
            .cloned()
            .collect()
    }

    fn get_all_notes(&mut self) -> Vec<Note> {
        self.notes.clone()
    }

    fn delete_note(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);

        if self.notes.len() != before {
            self.save();
            true
        } else {
            false
        }
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.writer.flush())
    }
}

/// Ids are not deduplicated on load; `delete_note` removes every copy.
fn warn_duplicate_ids(path: &Path, notes: &[Note]) {
    let mut seen = HashSet::with_capacity(notes.len());
    let duplicates: Vec<&str> = notes
        .iter()
        .filter(|note| !seen.insert(note.id.as_str()))
        .map(|note| note.id.as_str())
        .collect();

    if !duplicates.is_empty() {
        tracing::warn!(
            "Notes file {:?} holds {} duplicate id(s): {}",
            path,
            duplicates.len(),
            duplicates.join(", ")
        );
    }
}

/// Fire-and-forget writer for full-collection snapshots
///
/// Snapshots are numbered; a task whose snapshot is older than the last one
/// written skips its write.
struct SnapshotWriter {
    path: PathBuf,
    generation: u64,
    written: Arc<Mutex<u64>>,
    pending: Vec<JoinHandle<()>>,
}

impl SnapshotWriter {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            generation: 0,
            written: Arc::new(Mutex::new(0)),
            pending: Vec::new(),
        }
    }

    fn submit(&mut self, json: String) {
        self.generation += 1;
        self.pending.retain(|h| !h.is_finished());

        let path = self.path.clone();
        let generation = self.generation;
        let written = Arc::clone(&self.written);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(async move {
                    let mut last = written.lock().await;
                    if *last > generation {
                        return;
                    }
                    match write_snapshot(&path, &json).await {
                        Ok(()) => *last = generation,
                        Err(e) => tracing::error!("Failed to save notes to {:?}: {}", path, e),
                    }
                });
                self.pending.push(task);
            }
            Err(_) => {
                // No runtime to spawn on, write inline.
                let mut last = written.blocking_lock();
                match write_snapshot_blocking(&path, &json) {
                    Ok(()) => *last = generation,
                    Err(e) => tracing::error!("Failed to save notes to {:?}: {}", path, e),
                }
            }
        }
    }

    async fn flush(&mut self) {
        for task in std::mem::take(&mut self.pending) {
            if let Err(e) = task.await {
                tracing::warn!("Note save task did not complete: {}", e);
            }
        }
    }
}

async fn write_snapshot(path: &Path, json: &str) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn write_snapshot_blocking(path: &Path, json: &str) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageFactory, StorageOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts events at WARN or ERROR
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn warnings_during<F: FnOnce()>(f: F) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber =
            tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    fn store_in(dir: &TempDir) -> FileNoteStore {
        FileNoteStore::new(dir.path().join("notes.json"))
    }

    fn read_saved(dir: &TempDir) -> Vec<Note> {
        let content = std::fs::read_to_string(dir.path().join("notes.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_initialize_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let report = store.initialize();
        assert!(matches!(report, LoadReport::StartedEmpty { .. }));
        assert!(store.get_all_notes().is_empty());
    }

    #[test]
    fn test_initialize_malformed_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.json"), "{ not json").unwrap();
        let mut store = store_in(&dir);

        let report = store.initialize();
        assert!(matches!(report, LoadReport::StartedEmpty { .. }));
        assert!(store.get_all_notes().is_empty());
    }

    #[test]
    fn test_missing_file_is_not_a_warning() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let warnings = warnings_during(|| {
            store.initialize();
        });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_truncated_file_warns_before_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","text":"precious","timestamp":"2025-01-15T10:00:00.000Z"},"#,
        )
        .unwrap();
        let options = StorageOptions {
            file_path: Some(path.clone()),
            db_path: None,
        };

        let warnings = warnings_during(|| {
            let (mut store, report) = StorageFactory::open(StorageKind::File, &options);
            assert!(matches!(report, LoadReport::StartedEmpty { .. }));
            store.add_note(NewNote::new("replacement"));
        });

        assert!(warnings >= 1);
        assert_eq!(read_saved(&dir).len(), 1);
    }

    #[test]
    fn test_duplicate_ids_on_load_warn() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"[
                {"id":"a","text":"first","timestamp":"2025-01-15T10:00:00.000Z"},
                {"id":"b","text":"other","timestamp":"2025-01-15T10:00:00.000Z"},
                {"id":"a","text":"second","timestamp":"2025-01-15T10:00:00.000Z"}
            ]"#,
        )
        .unwrap();
        let mut store = store_in(&dir);

        let mut report = None;
        let warnings = warnings_during(|| report = Some(store.initialize()));

        assert_eq!(warnings, 1);
        assert_eq!(report, Some(LoadReport::Loaded { count: 3 }));
    }

    #[test]
    fn test_unique_ids_on_load_do_not_warn() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"[{"id":"a","text":"hello","timestamp":"2025-01-15T10:00:00.000Z"}]"#,
        )
        .unwrap();
        let mut store = store_in(&dir);

        let warnings = warnings_during(|| {
            store.initialize();
        });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_initialize_loads_existing_notes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"[{"id":"a","text":"hello","timestamp":"2025-01-15T10:00:00.000Z"}]"#,
        )
        .unwrap();
        let mut store = store_in(&dir);

        assert_eq!(store.initialize(), LoadReport::Loaded { count: 1 });
        assert_eq!(store.search_notes("HELLO").len(), 1);
    }

    #[test]
    fn test_save_without_runtime_writes_inline() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        let note = store.add_note(NewNote::new("sync write"));

        assert_eq!(store.pending_writes(), 0);
        assert_eq!(read_saved(&dir), vec![note]);
    }

    #[tokio::test]
    async fn test_add_is_persisted_after_flush() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        let note = store.add_note(NewNote::new("background write"));
        store.flush().await;

        assert_eq!(read_saved(&dir), vec![note]);
    }

    #[tokio::test]
    async fn test_rapid_writes_keep_latest_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        for i in 0..20 {
            store.add_note(NewNote::new(format!("note {i}")));
        }
        store.flush().await;

        assert_eq!(read_saved(&dir).len(), 20);
    }

    #[tokio::test]
    async fn test_delete_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        let a = store.add_note(NewNote::new("a"));
        let b = store.add_note(NewNote::new("b"));
        assert!(store.delete_note(&a.id));
        store.flush().await;

        assert_eq!(read_saved(&dir), vec![b]);
    }

    #[tokio::test]
    async fn test_delete_unknown_does_not_write() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        assert!(!store.delete_note("missing"));
        store.flush().await;

        assert!(!dir.path().join("notes.json").exists());
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("notes.json");
        let mut store = FileNoteStore::new(&path);
        store.initialize();

        store.add_note(NewNote::new("nested"));
        store.flush().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("notes.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = FileNoteStore::new(&path);
        store.initialize();

        let note = store.add_note(NewNote::new("still here"));
        store.flush().await;

        assert_eq!(store.get_all_notes(), vec![note]);
    }

    #[tokio::test]
    async fn test_saved_file_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize();

        store.add_note(NewNote::new("pretty"));
        store.flush().await;

        let content = std::fs::read_to_string(dir.path().join("notes.json")).unwrap();
        assert!(content.starts_with("[\n  {"));
    }
}
