//! Note endpoints.

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use notarium_core::{Note, NoteDraft, NoteStore, Result};

use crate::client::ApiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotePayload<'a> {
    title: &'a str,
    content: &'a str,
    knowledge_base_id: i64,
}

impl<'a> From<&'a NoteDraft> for NotePayload<'a> {
    fn from(draft: &'a NoteDraft) -> Self {
        Self {
            title: &draft.title,
            content: &draft.content,
            knowledge_base_id: draft.knowledge_base_id,
        }
    }
}

/// Client for `/api/notes`.
#[derive(Clone)]
pub struct NoteClient {
    api: ApiClient,
}

impl NoteClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NoteStore for NoteClient {
    async fn list(&self, knowledge_base_id: i64) -> Result<Vec<Note>> {
        self.api
            .get_data(
                "/notes",
                &[("knowledgeBaseId", knowledge_base_id.to_string())],
            )
            .await
    }

    async fn search(&self, knowledge_base_id: i64, keyword: &str) -> Result<Vec<Note>> {
        self.api
            .get_data(
                "/notes/search",
                &[
                    ("knowledgeBaseId", knowledge_base_id.to_string()),
                    ("keyword", keyword.to_string()),
                ],
            )
            .await
    }

    async fn get(&self, id: i64) -> Result<Note> {
        self.api.get_data(&format!("/notes/{}", id), &[]).await
    }

    async fn create(&self, draft: NoteDraft) -> Result<Note> {
        self.api.post_data("/notes", &NotePayload::from(&draft)).await
    }

    #[instrument(skip(self, draft), fields(component = "notes", op = "update", note_id = id, content_len = draft.content.len()))]
    async fn update(&self, id: i64, draft: NoteDraft) -> Result<Note> {
        self.api
            .put_data(&format!("/notes/{}", id), &NotePayload::from(&draft))
            .await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete_unit(&format!("/notes/{}", id)).await
    }
}
