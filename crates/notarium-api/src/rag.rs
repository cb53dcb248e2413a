//! RAG answering and index maintenance endpoints.

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use notarium_core::{IndexService, IndexUpdateResult, RagAnswer, RagService, Result};

use crate::client::ApiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagQueryPayload<'a> {
    question: &'a str,
    knowledge_base_ids: &'a [i64],
    top_k: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIndexPayload {
    knowledge_base_id: i64,
}

/// Client for `/api/rag`.
#[derive(Clone)]
pub struct RagClient {
    api: ApiClient,
}

impl RagClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RagService for RagClient {
    #[instrument(skip(self, question), fields(component = "rag", op = "answer", scope_len = knowledge_base_ids.len(), top_k))]
    async fn answer(
        &self,
        question: &str,
        knowledge_base_ids: &[i64],
        top_k: u32,
    ) -> Result<RagAnswer> {
        self.api
            .post_data(
                "/rag/answer",
                &RagQueryPayload {
                    question,
                    knowledge_base_ids,
                    top_k,
                },
            )
            .await
    }
}

#[async_trait]
impl IndexService for RagClient {
    async fn update_index(&self, knowledge_base_id: i64) -> Result<IndexUpdateResult> {
        self.api
            .post_data("/rag/updateIndex", &UpdateIndexPayload { knowledge_base_id })
            .await
    }

    async fn force_update_index(&self, knowledge_base_id: i64) -> Result<IndexUpdateResult> {
        self.api
            .post_data(
                "/rag/forceUpdateIndex",
                &UpdateIndexPayload { knowledge_base_id },
            )
            .await
    }
}
