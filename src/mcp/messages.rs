//! Tool response text

use crate::note::Note;

/// Server name reported to MCP clients
pub const SERVER_NAME: &str = "PersonalMemoryServer";

/// Reply when a search or listing is empty
pub const NO_NOTES_FOUND: &str = "No matching notes found.";

/// URI of the resource exposing every note
pub const ALL_NOTES_URI: &str = "notes://all";

/// Name of the resource exposing every note
pub const ALL_NOTES_NAME: &str = "all_notes";

/// Reply to `store_note`
pub fn note_stored(note: &Note) -> String {
    format!("Note stored with ID: {} at {}.", note.id, note.timestamp)
}

/// Reply to a successful `delete_note`
pub fn note_deleted(id: &str) -> String {
    format!("Note with ID {} successfully deleted.", id)
}

/// Reply to `delete_note` for an unknown id
pub fn note_not_found(id: &str) -> String {
    format!("No note with ID {} found.", id)
}

/// Pretty JSON array of notes
pub fn notes_json(notes: &[Note]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(notes)
}

/// Pretty JSON array of notes, or [`NO_NOTES_FOUND`] when there are none
pub fn notes_or_empty(notes: &[Note]) -> serde_json::Result<String> {
    if notes.is_empty() {
        Ok(NO_NOTES_FOUND.to_string())
    } else {
        notes_json(notes)
    }
}
