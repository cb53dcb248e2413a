//! Core data models for the notarium client.
//!
//! These types mirror the backend's wire format: camelCase field names and
//! `yyyy-MM-dd HH:mm:ss` timestamps without a zone designator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Serde adapter for the backend's `yyyy-MM-dd HH:mm:ss` timestamps.
pub mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => NaiveDateTime::parse_from_str(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

// =============================================================================
// KNOWLEDGE BASE TYPES
// =============================================================================

/// A knowledge base: a named collection of notes with an optional vector index.
///
/// Identity (`id`) is immutable; all other fields are refreshed wholesale
/// from the backend on list reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub note_count: i32,
    #[serde(default, with = "wire_time")]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default, with = "wire_time")]
    pub update_time: Option<NaiveDateTime>,
    /// Last time the vector index was rebuilt; `None` until first indexing.
    #[serde(default, with = "wire_time")]
    pub index_update_time: Option<NaiveDateTime>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note within a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    /// Full Markdown content. List endpoints may omit it.
    #[serde(default)]
    pub content: String,
    pub knowledge_base_id: i64,
    #[serde(default, with = "wire_time")]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default, with = "wire_time")]
    pub update_time: Option<NaiveDateTime>,
}

// =============================================================================
// AUTH TYPES
// =============================================================================

/// Authenticated principal. The backend never serializes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Response body of a successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// =============================================================================
// RAG TYPES
// =============================================================================

/// Answer to a RAG query, with the retrieved source chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    pub answer: String,
    #[serde(default)]
    pub relevant_documents: Vec<RelevantDocument>,
}

/// A retrieved chunk backing a RAG answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantDocument {
    pub note_id: i64,
    pub note_title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// Outcome of a knowledge-base index update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexUpdateResult {
    pub knowledge_base_id: i64,
    #[serde(default)]
    pub inserted_count: i32,
    #[serde(default)]
    pub updated_count: i32,
    #[serde(default)]
    pub skipped_count: i32,
    #[serde(default)]
    pub deleted_count: i32,
    #[serde(default)]
    pub details: Vec<NoteIndexDetail>,
}

/// Per-note detail line of an index update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteIndexDetail {
    pub note_id: i64,
    pub note_title: String,
    pub action: String,
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Success code used by the backend's uniform response envelope.
pub const ENVELOPE_OK: i32 = 200;

/// The backend's uniform response wrapper: `{code, message, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// True when the backend reported success.
    pub fn is_success(&self) -> bool {
        self.code == ENVELOPE_OK
    }
}
