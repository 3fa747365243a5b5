//! SQLite note store
//!
//! Notes live in a single `notes` table. Inserts and deletes are written
//! before the call returns. Reads rescan the table into an in-memory cache
//! so results always reflect the durable state.

use super::{LoadReport, NoteStore, StorageError, StorageKind, StorageResult};
use crate::note::{fresh_id, NewNote, Note};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Oldest SQLite release accepted by the engine probe (3.8.3, first with CTEs)
const MIN_SQLITE_VERSION: i32 = 3_008_003;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    tags TEXT
)";

/// Note store backed by a SQLite database file
pub struct DatabaseNoteStore {
    path: PathBuf,
    conn: Option<Connection>,
    cache: Vec<Note>,
}

impl DatabaseNoteStore {
    /// Create a store for the database at `path`
    ///
    /// Only checks that the SQLite engine is usable; the file is opened by
    /// `initialize`.
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        probe_engine()?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            conn: None,
            cache: Vec::new(),
        })
    }

    /// Create a store on a private in-memory database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        probe_engine()?;
        let conn = Connection::open_in_memory()?;
        conn.execute(CREATE_TABLE_SQL, [])?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Some(conn),
            cache: Vec::new(),
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a database connection is open; `false` means cache-only mode
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Count rows in the table
    pub fn row_count(&self) -> StorageResult<usize> {
        let Some(conn) = &self.conn else {
            return Ok(self.cache.len());
        };
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Look up one note by id directly in the table
    pub fn get_note(&self, id: &str) -> StorageResult<Option<Note>> {
        let Some(conn) = &self.conn else {
            return Ok(self.cache.iter().find(|n| n.id == id).cloned());
        };
        let row = conn
            .query_row(
                "SELECT id, text, timestamp, tags FROM notes WHERE id = ?",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(id, text, timestamp, tags)| Note {
            tags: decode_tags(&id, tags.as_deref()),
            id,
            text,
            timestamp,
        }))
    }

    fn open(&self) -> StorageResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.execute(CREATE_TABLE_SQL, [])?;
        Ok(conn)
    }

    fn scan(conn: &Connection) -> StorageResult<Vec<Note>> {
        let mut stmt = conn.prepare("SELECT id, text, timestamp, tags FROM notes ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let (id, text, timestamp, tags) = row?;
            notes.push(Note {
                tags: decode_tags(&id, tags.as_deref()),
                id,
                text,
                timestamp,
            });
        }
        Ok(notes)
    }

    /// Reload the cache from the table; keeps the old cache if the scan fails
    fn refresh(&mut self) {
        let Some(conn) = &self.conn else {
            return;
        };
        match Self::scan(conn) {
            Ok(notes) => self.cache = notes,
            Err(e) => tracing::warn!("Failed to refresh note cache from {:?}: {}", self.path, e),
        }
    }

    fn insert(conn: &Connection, note: &Note) -> StorageResult<()> {
        let tags = note.tags.as_ref().map(serde_json::to_string).transpose()?;
        conn.execute(
            "INSERT INTO notes (id, text, timestamp, tags) VALUES (?, ?, ?, ?)",
            params![note.id, note.text, note.timestamp, tags],
        )?;
        Ok(())
    }

    fn id_taken(&self, candidate: &str) -> bool {
        if self.cache.iter().any(|n| n.id == candidate) {
            return true;
        }
        match self.get_note(candidate) {
            Ok(found) => found.is_some(),
            Err(_) => false,
        }
    }
}

impl NoteStore for DatabaseNoteStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Database
    }

    fn initialize(&mut self) -> LoadReport {
        // Already connected (in-memory stores, repeated calls): reload only.
        if let Some(conn) = &self.conn {
            return match Self::scan(conn) {
                Ok(notes) => {
                    self.cache = notes;
                    LoadReport::Loaded {
                        count: self.cache.len(),
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to reload notes from {:?}: {}", self.path, e);
                    self.cache.clear();
                    LoadReport::StartedEmpty {
                        cause: e.to_string(),
                    }
                }
            };
        }

        let loaded = self
            .open()
            .and_then(|conn| Self::scan(&conn).map(|notes| (conn, notes)));

        match loaded {
            Ok((conn, notes)) => {
                self.conn = Some(conn);
                self.cache = notes;
                LoadReport::Loaded {
                    count: self.cache.len(),
                }
            }
            Err(e) => {
                tracing::error!(
                    "Failed to open note database {:?}, notes will not be persisted: {}",
                    self.path,
                    e
                );
                self.conn = None;
                self.cache.clear();
                LoadReport::StartedEmpty {
                    cause: e.to_string(),
                }
            }
        }
    }

    fn add_note(&mut self, new_note: NewNote) -> Note {
        let id = fresh_id(|candidate| self.id_taken(candidate));
        let note = new_note.into_note(id);

        match &self.conn {
            Some(conn) => match Self::insert(conn, &note) {
                Ok(()) => self.cache.push(note.clone()),
                // Returned to the caller but neither stored nor cached.
                Err(e) => tracing::warn!("Failed to insert note {}: {}", note.id, e),
            },
            None => self.cache.push(note.clone()),
        }

        note
    }

    fn search_notes(&mut self, query: &str) -> Vec<Note> {
        self.refresh();
        self.cache
            .iter()
            .filter(|note| note.matches(query))
            .cloned()
            .collect()
    }

    fn get_all_notes(&mut self) -> Vec<Note> {
        self.refresh();
        self.cache.clone()
    }

    fn delete_note(&mut self, id: &str) -> bool {
        let Some(conn) = &self.conn else {
            let before = self.cache.len();
            self.cache.retain(|note| note.id != id);
            return self.cache.len() != before;
        };

        match conn.execute("DELETE FROM notes WHERE id = ?", params![id]) {
            Ok(affected) if affected > 0 => {
                self.cache.retain(|note| note.id != id);
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("Failed to delete note {}: {}", id, e);
                false
            }
        }
    }
}

fn probe_engine() -> StorageResult<()> {
    let version = rusqlite::version_number();
    if version < MIN_SQLITE_VERSION {
        return Err(StorageError::EngineUnavailable(format!(
            "SQLite {} is older than the required 3.8.3",
            rusqlite::version()
        )));
    }
    Connection::open_in_memory()
        .map(|_| ())
        .map_err(|e| StorageError::EngineUnavailable(e.to_string()))
}

fn decode_tags(id: &str, raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(tags) => Some(tags),
        Err(e) => {
            tracing::warn!("Ignoring malformed tags on note {}: {}", id, e);
            None
        }
    }
}
