//! Note data structures
//!
//! Defines the note record passed between the storage backends and the server.

use super::id::current_timestamp;
use serde::{Deserialize, Serialize};

/// A stored note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Unique note identifier, assigned at creation
    pub id: String,
    /// Note body
    pub text: String,
    /// ISO-8601 timestamp, caller supplied or creation time
    pub timestamp: String,
    /// Optional tags; `None` and an empty list are distinct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Input for creating a note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    /// Note body
    pub text: String,
    /// Timestamp to record; defaults to now when absent or empty
    pub timestamp: Option<String>,
    /// Optional tags
    pub tags: Option<Vec<String>>,
}

impl NewNote {
    /// Create input with just a body
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: None,
            tags: None,
        }
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Build the note under the given id, defaulting the timestamp
    pub fn into_note(self, id: String) -> Note {
        let timestamp = self
            .timestamp
            .filter(|ts| !ts.is_empty())
            .unwrap_or_else(current_timestamp);

        Note {
            id,
            text: self.text,
            timestamp,
            tags: self.tags,
        }
    }
}

impl Note {
    /// Check whether the text or any tag contains `query`, ignoring case
    ///
    /// An empty query matches every note.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        contains_lowercase(&self.text, &query)
            || self
                .tags
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|tag| contains_lowercase(tag, &query))
    }
}

fn contains_lowercase(source: &str, lowered_query: &str) -> bool {
    source.to_lowercase().contains(lowered_query)
}
