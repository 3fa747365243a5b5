//! personal-memory: Personal note-taking MCP server
//!
//! This library stores short notes and exposes them to MCP clients through
//! four tools: store, search, list, and delete.
//!
//! # Features
//!
//! - Three interchangeable storage backends behind one trait
//! - Case-insensitive substring search over note text and tags
//! - Database backend with automatic fallback to the file backend
//! - MCP server over stdio
//!
//! # Modules
//!
//! - `note`: Note record, id generation, and the search predicate
//! - `storage`: Storage trait, backends, and the backend factory
//! - `config`: Configuration file, environment, and path resolution
//! - `mcp`: MCP server implementation

pub mod config;
pub mod mcp;
pub mod note;
pub mod storage;

// Re-export commonly used types
pub use note::{NewNote, Note};
pub use storage::{LoadReport, NoteStore, StorageFactory, StorageKind, StorageOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
