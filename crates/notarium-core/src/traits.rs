//! Service trait seams toward the REST backend.
//!
//! These traits define the interfaces the client core depends on, enabling
//! pluggable transports and testability without a live backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// KNOWLEDGE BASE DIRECTORY
// =============================================================================

/// Fields the user supplies when creating or editing a knowledge base.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseDraft {
    pub title: String,
    pub description: String,
}

/// Read/write access to the user's knowledge bases.
#[async_trait]
pub trait KnowledgeBaseDirectory: Send + Sync {
    /// List all knowledge bases owned by the current user.
    async fn list(&self) -> Result<Vec<KnowledgeBase>>;

    /// Search knowledge bases by keyword (title or description).
    async fn search(&self, keyword: &str) -> Result<Vec<KnowledgeBase>>;

    /// Create a knowledge base.
    async fn create(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase>;

    /// Update title/description of an existing knowledge base.
    async fn update(&self, id: i64, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase>;

    /// Delete a knowledge base and everything in it.
    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// NOTE STORE
// =============================================================================

/// Fields the client sends when creating or saving a note.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub knowledge_base_id: i64,
}

/// Note CRUD against the backend.
///
/// `update` returns the server's canonical note, which may differ from what
/// was sent if the server normalizes content; callers must adopt it as the
/// new persisted snapshot.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List the notes of a knowledge base (content may be omitted).
    async fn list(&self, knowledge_base_id: i64) -> Result<Vec<Note>>;

    /// Search a knowledge base's notes by keyword.
    async fn search(&self, knowledge_base_id: i64, keyword: &str) -> Result<Vec<Note>>;

    /// Fetch a full note by id.
    async fn get(&self, id: i64) -> Result<Note>;

    /// Create a note.
    async fn create(&self, draft: NoteDraft) -> Result<Note>;

    /// Persist a note, returning the server's canonical copy.
    async fn update(&self, id: i64, draft: NoteDraft) -> Result<Note>;

    /// Delete a note.
    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// RAG
// =============================================================================

/// Retrieval-augmented answering over selected knowledge bases.
#[async_trait]
pub trait RagService: Send + Sync {
    /// Answer a question against the given scope, retrieving `top_k` chunks.
    async fn answer(
        &self,
        question: &str,
        knowledge_base_ids: &[i64],
        top_k: u32,
    ) -> Result<RagAnswer>;
}

/// Vector-index maintenance for knowledge bases.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Index new/changed notes of a knowledge base.
    async fn update_index(&self, knowledge_base_id: i64) -> Result<IndexUpdateResult>;

    /// Drop and rebuild the whole index (dimension changes etc.).
    async fn force_update_index(&self, knowledge_base_id: i64) -> Result<IndexUpdateResult>;
}
