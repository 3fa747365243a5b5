//! MCP server module
//!
//! This module exposes note storage to MCP clients over stdio.

pub mod messages;
mod server;

pub use server::{
    DeleteNoteParams, NotesMcpServer, RetrieveNotesParams, SharedNoteStore, StoreNoteParams,
};
