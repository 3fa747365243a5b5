//! Ephemeral note store
//!
//! Holds notes in process memory only. Everything is lost on exit.

use super::{LoadReport, NoteStore, StorageKind};
use crate::note::{fresh_id, NewNote, Note};

/// Note store without any durable medium
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: Vec<Note>,
}

impl MemoryNoteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes held
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl NoteStore for MemoryNoteStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    fn initialize(&mut self) -> LoadReport {
        LoadReport::StartedEmpty {
            cause: "memory storage is not persisted".to_string(),
        }
    }

    fn add_note(&mut self, new_note: NewNote) -> Note {
        let id = fresh_id(|candidate| self.notes.iter().any(|n| n.id == candidate));
        let note = new_note.into_note(id);
        self.notes.push(note.clone());
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
        self.notes.len() != before
    }
}
