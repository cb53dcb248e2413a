//! Knowledge-base endpoints.

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use notarium_core::{KnowledgeBase, KnowledgeBaseDirectory, KnowledgeBaseDraft, Result};

use crate::client::ApiClient;

#[derive(Serialize)]
struct KnowledgeBasePayload<'a> {
    title: &'a str,
    description: &'a str,
}

/// Client for `/api/knowledge-bases`.
#[derive(Clone)]
pub struct KnowledgeBaseClient {
    api: ApiClient,
}

impl KnowledgeBaseClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl KnowledgeBaseDirectory for KnowledgeBaseClient {
    #[instrument(skip(self), fields(component = "knowledge_bases", op = "list"))]
    async fn list(&self) -> Result<Vec<KnowledgeBase>> {
        self.api.get_data("/knowledge-bases", &[]).await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<KnowledgeBase>> {
        self.api
            .get_data(
                "/knowledge-bases/search",
                &[("keyword", keyword.to_string())],
            )
            .await
    }

    async fn create(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        self.api
            .post_data(
                "/knowledge-bases",
                &KnowledgeBasePayload {
                    title: &draft.title,
                    description: &draft.description,
                },
            )
            .await
    }

    async fn update(&self, id: i64, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        self.api
            .put_data(
                &format!("/knowledge-bases/{}", id),
                &KnowledgeBasePayload {
                    title: &draft.title,
                    description: &draft.description,
                },
            )
            .await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.api
            .delete_unit(&format!("/knowledge-bases/{}", id))
            .await
    }
}
