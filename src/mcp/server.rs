//! MCP server implementation
//!
//! Exposes the note store as MCP tools plus a `notes://all` resource. The
//! server never learns which storage backend is active.

use super::messages::{self, ALL_NOTES_NAME, ALL_NOTES_URI, SERVER_NAME};
use crate::note::NewNote;
use crate::storage::NoteStore;
use rmcp::{
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
        PaginatedRequestParam, RawResource, ReadResourceRequestParam, ReadResourceResult,
        ResourceContents, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, RoleServer, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage handle shared between tool invocations
pub type SharedNoteStore = Arc<Mutex<Box<dyn NoteStore>>>;

/// MCP server for personal notes
#[derive(Clone)]
pub struct NotesMcpServer {
    storage: SharedNoteStore,
}

/// Request parameters for store_note tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StoreNoteParams {
    /// Note text to store
    pub note: String,
    /// ISO-8601 timestamp (default: now)
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Optional tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Request parameters for retrieve_notes tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RetrieveNotesParams {
    /// Case-insensitive text to look for in note text and tags
    #[serde(default)]
    pub query: String,
}

/// Request parameters for delete_note tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteNoteParams {
    /// ID of the note to delete
    pub id: String,
}

fn render_error(e: serde_json::Error) -> rmcp::Error {
    rmcp::Error::internal_error(format!("Failed to render notes: {}", e), None)
}

#[tool(tool_box)]
impl NotesMcpServer {
    /// Wrap an initialized store
    pub fn new(store: Box<dyn NoteStore>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(store)),
        }
    }

    /// Shared handle to the underlying store
    pub fn storage(&self) -> SharedNoteStore {
        Arc::clone(&self.storage)
    }

    /// Store a note
    #[tool(description = "Store a personal note with an optional timestamp and tags")]
    async fn store_note(
        &self,
        #[tool(aggr)] params: StoreNoteParams,
    ) -> Result<CallToolResult, rmcp::Error> {
        let new_note = NewNote {
            text: params.note,
            timestamp: params.timestamp,
            tags: params.tags,
        };
        let note = self.storage.lock().await.add_note(new_note);
        tracing::debug!("Stored note {}", note.id);

        Ok(CallToolResult::success(vec![Content::text(
            messages::note_stored(&note),
        )]))
    }

    /// Search notes
    #[tool(description = "Retrieve notes whose text or tags contain the query (case-insensitive)")]
    async fn retrieve_notes(
        &self,
        #[tool(aggr)] params: RetrieveNotesParams,
    ) -> Result<CallToolResult, rmcp::Error> {
        let matches = self.storage.lock().await.search_notes(&params.query);
        tracing::debug!("Query '{}' matched {} notes", params.query, matches.len());

        let output = messages::notes_or_empty(&matches).map_err(render_error)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// List every note
    #[tool(description = "Get all stored notes")]
    async fn get_all_notes(&self) -> Result<CallToolResult, rmcp::Error> {
        let notes = self.storage.lock().await.get_all_notes();

        let output = messages::notes_or_empty(&notes).map_err(render_error)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Delete a note
    #[tool(description = "Delete a note by its ID")]
    async fn delete_note(
        &self,
        #[tool(aggr)] params: DeleteNoteParams,
    ) -> Result<CallToolResult, rmcp::Error> {
        let deleted = self.storage.lock().await.delete_note(&params.id);

        let output = if deleted {
            messages::note_deleted(&params.id)
        } else {
            messages::note_not_found(&params.id)
        };
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool(tool_box)]
impl ServerHandler for NotesMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Personal memory server: store, search, list, and delete notes".into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: crate::VERSION.to_string(),
            },
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, rmcp::Error> {
        let mut resource = RawResource::new(ALL_NOTES_URI, ALL_NOTES_NAME.to_string());
        resource.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![resource.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, rmcp::Error> {
        if uri != ALL_NOTES_URI {
            return Err(rmcp::Error::resource_not_found(
                format!("Unknown resource: {}", uri),
                None,
            ));
        }

        let notes = self.storage.lock().await.get_all_notes();
        let text = messages::notes_json(&notes).map_err(render_error)?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}
