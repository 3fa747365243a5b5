//! Note storage
//!
//! One contract, [`NoteStore`], with three interchangeable backends:
//!
//! - `memory`: process-local, nothing persisted
//! - `file`: a pretty-printed JSON array rewritten in the background after every change
//! - `database`: a SQLite table with an in-memory cache refreshed before each read
//!
//! [`StorageFactory`] picks exactly one backend at startup. Nothing above it
//! knows which backend is active.

#[cfg(feature = "database")]
mod database;
mod error;
mod file;
mod memory;

#[cfg(feature = "database")]
pub use database::DatabaseNoteStore;
pub use error::{StorageError, StorageResult};
pub use file::FileNoteStore;
pub use memory::MemoryNoteStore;

use crate::config::path_resolver;
use crate::note::{NewNote, Note};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;

/// Default file name for the file backend
pub const DEFAULT_FILE_NAME: &str = "notes.json";

/// Default file name for the database backend
pub const DEFAULT_DB_NAME: &str = "notes.db";

/// Outcome of [`NoteStore::initialize`]
///
/// Initialization never fails; a store that could not load its durable
/// copy starts empty and says why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// Notes were loaded from the durable store
    Loaded {
        /// Number of notes loaded
        count: usize,
    },
    /// The store started with no notes
    StartedEmpty {
        /// Why nothing was loaded
        cause: String,
    },
}

impl LoadReport {
    /// Number of notes held after initialization
    pub fn count(&self) -> usize {
        match self {
            LoadReport::Loaded { count } => *count,
            LoadReport::StartedEmpty { .. } => 0,
        }
    }

    /// Emit the report as a diagnostic
    pub fn log(&self, kind: StorageKind) {
        match self {
            LoadReport::Loaded { count } => {
                tracing::info!("Loaded {} notes from {} storage", count, kind)
            }
            LoadReport::StartedEmpty { cause } => {
                tracing::info!("Starting with empty {} storage: {}", kind, cause)
            }
        }
    }
}

/// Contract shared by every note backend
///
/// None of the note operations return errors: persistence failures are
/// logged and the in-memory state stays authoritative.
pub trait NoteStore: Send {
    /// Which backend this is
    fn kind(&self) -> StorageKind;

    /// Prepare durable resources and load existing notes
    fn initialize(&mut self) -> LoadReport;

    /// Store a new note and return it with its id and timestamp filled in
    fn add_note(&mut self, new_note: NewNote) -> Note;

    /// Notes whose text or tags contain `query`, ignoring case, in insertion order
    fn search_notes(&mut self, query: &str) -> Vec<Note>;

    /// Copy of every note in insertion order
    fn get_all_notes(&mut self) -> Vec<Note>;

    /// Remove the note with `id`; returns whether one was removed
    fn delete_note(&mut self, id: &str) -> bool;

    /// Wait for background writes that are already in flight
    fn flush(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// JSON document on disk
    File,
    /// Process memory only
    Memory,
    /// SQLite database
    #[default]
    Database,
}

impl StorageKind {
    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::File => "file",
            StorageKind::Memory => "memory",
            StorageKind::Database => "database",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            "database" | "sqlite" => Ok(StorageKind::Database),
            other => Err(format!(
                "Unknown storage backend '{}'. Valid backends: file, memory, database",
                other
            )),
        }
    }
}

/// Backend-specific locations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageOptions {
    /// JSON file for the file backend
    pub file_path: Option<PathBuf>,
    /// Database file for the database backend
    pub db_path: Option<PathBuf>,
}

impl StorageOptions {
    /// File path, or `<data dir>/notes.json`
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| path_resolver::data_dir().join(DEFAULT_FILE_NAME))
    }

    /// Database path, or `<data dir>/notes.db`
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| path_resolver::data_dir().join(DEFAULT_DB_NAME))
    }
}

/// Construction-time backend chooser
pub struct StorageFactory;

impl StorageFactory {
    /// Construct the backend for `kind`
    ///
    /// Never fails: if the database engine is unavailable the file backend
    /// is built instead. The returned store is not yet initialized.
    pub fn create(kind: StorageKind, options: &StorageOptions) -> Box<dyn NoteStore> {
        match kind {
            StorageKind::Memory => Box::new(MemoryNoteStore::new()),
            StorageKind::File => Box::new(FileNoteStore::new(options.resolved_file_path())),
            StorageKind::Database => {
                Self::database_or_file(Self::create_database(options), options)
            }
        }
    }

    /// Construct and initialize the backend for `kind`
    pub fn open(kind: StorageKind, options: &StorageOptions) -> (Box<dyn NoteStore>, LoadReport) {
        let mut store = Self::create(kind, options);
        let report = store.initialize();
        report.log(store.kind());
        (store, report)
    }

    #[cfg(feature = "database")]
    fn create_database(options: &StorageOptions) -> StorageResult<Box<dyn NoteStore>> {
        let store = DatabaseNoteStore::new(options.resolved_db_path())?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "database"))]
    fn create_database(_options: &StorageOptions) -> StorageResult<Box<dyn NoteStore>> {
        Err(StorageError::EngineUnavailable(
            "built without the `database` feature".to_string(),
        ))
    }

    fn database_or_file(
        database: StorageResult<Box<dyn NoteStore>>,
        options: &StorageOptions,
    ) -> Box<dyn NoteStore> {
        match database {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Failed to create database storage, falling back to file: {e}");
                Box::new(FileNoteStore::new(options.resolved_file_path()))
            }
        }
    }
}
