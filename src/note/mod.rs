//! Note module
//!
//! This module defines the note record shared by every storage backend,
//! along with identifier generation and the search predicate.

mod id;
mod record;

pub use id::{current_timestamp, fresh_id, generate_id};
pub use record::{NewNote, Note};
