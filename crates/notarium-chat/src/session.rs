//! The chat session: directory state, selection, and the send pipeline.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use notarium_core::{
    resolve_mentions, Error, KnowledgeBase, KnowledgeBaseDirectory, RagAnswer, RagService, Result,
    SelectionSet,
};

use crate::transcript::{render_answer, ChatEntry};

/// Result of one successful question/answer round trip.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// The question as sent (mentions stripped, trimmed).
    pub question: String,
    /// The scope the question was answered against.
    pub knowledge_base_ids: Vec<i64>,
    /// The raw backend answer.
    pub answer: RagAnswer,
    /// The answer with its deduplicated reference list appended.
    pub rendered: String,
}

/// Session state for the chat page: the knowledge-base list, the user's
/// selection, and the transcript, owned by one controller instead of
/// free-standing page globals.
pub struct ChatSession {
    directory: Arc<dyn KnowledgeBaseDirectory>,
    rag: Arc<dyn RagService>,
    knowledge_bases: Vec<KnowledgeBase>,
    selection: SelectionSet,
    transcript: Vec<ChatEntry>,
    top_k: u32,
}

impl ChatSession {
    pub fn new(
        directory: Arc<dyn KnowledgeBaseDirectory>,
        rag: Arc<dyn RagService>,
        top_k: u32,
    ) -> Self {
        Self {
            directory,
            rag,
            knowledge_bases: Vec::new(),
            selection: SelectionSet::new(),
            transcript: Vec::new(),
            top_k,
        }
    }

    /// Refresh the knowledge-base list wholesale from the backend.
    ///
    /// The selection survives a refresh; it is cleared only when the whole
    /// session is rebuilt.
    pub async fn reload_directory(&mut self) -> Result<&[KnowledgeBase]> {
        self.knowledge_bases = self.directory.list().await?;
        debug!(count = self.knowledge_bases.len(), "Knowledge bases reloaded");
        Ok(&self.knowledge_bases)
    }

    pub fn knowledge_bases(&self) -> &[KnowledgeBase] {
        &self.knowledge_bases
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Toggle a knowledge base in the ambient scope.
    /// Returns whether the id is selected after the call.
    pub fn toggle_selection(&mut self, id: i64) -> Result<bool> {
        if !self.knowledge_bases.iter().any(|kb| kb.id == id) {
            return Err(Error::InvalidInput(format!("unknown knowledge base {}", id)));
        }
        Ok(self.selection.toggle(id))
    }

    /// Human-readable summary of the ambient scope.
    pub fn selection_summary(&self) -> String {
        if self.selection.is_empty() {
            return "all".to_string();
        }
        let titles: Vec<&str> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| {
                self.knowledge_bases
                    .iter()
                    .find(|kb| kb.id == *id)
                    .map(|kb| kb.title.as_str())
            })
            .collect();
        titles.join(", ")
    }

    /// Send a question through mention resolution and the RAG service.
    ///
    /// Invalid input (an empty message, a message that is empty once its
    /// mentions are stripped, or an empty effective scope) is rejected
    /// locally and never reaches the backend. A service failure is recorded
    /// as an assistant-side transcript entry and returned to the caller;
    /// the user's entry stays in the transcript.
    #[instrument(skip(self, message), fields(component = "chat", op = "send"))]
    pub async fn send(&mut self, message: &str) -> Result<ChatTurn> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("message is empty".to_string()));
        }

        let scope = resolve_mentions(trimmed, &self.knowledge_bases, &self.selection);
        if scope.clean_message.is_empty() {
            return Err(Error::InvalidInput(
                "message is empty once mentions are removed".to_string(),
            ));
        }
        if scope.knowledge_base_ids.is_empty() {
            return Err(Error::InvalidInput(
                "select at least one knowledge base".to_string(),
            ));
        }

        self.transcript
            .push(ChatEntry::user(scope.clean_message.clone()));

        match self
            .rag
            .answer(&scope.clean_message, &scope.knowledge_base_ids, self.top_k)
            .await
        {
            Ok(answer) => {
                let rendered = render_answer(&answer);
                self.transcript.push(ChatEntry::assistant(rendered.clone()));
                info!(
                    scope_len = scope.knowledge_base_ids.len(),
                    sources = answer.relevant_documents.len(),
                    "Question answered"
                );
                Ok(ChatTurn {
                    question: scope.clean_message,
                    knowledge_base_ids: scope.knowledge_base_ids,
                    answer,
                    rendered,
                })
            }
            Err(e) => {
                self.transcript.push(ChatEntry::assistant(format!(
                    "Sorry, something went wrong answering that: {}",
                    e
                )));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ChatRole;
    use notarium_core::mock::{MockDirectory, MockRagService};
    use notarium_core::RelevantDocument;

    fn kb(id: i64, title: &str) -> KnowledgeBase {
        KnowledgeBase {
            id,
            title: title.to_string(),
            description: String::new(),
            note_count: 0,
            create_time: None,
            update_time: None,
            index_update_time: None,
        }
    }

    async fn session_with(
        bases: Vec<KnowledgeBase>,
        rag: MockRagService,
    ) -> (ChatSession, MockRagService) {
        let mut session = ChatSession::new(
            Arc::new(MockDirectory::new(bases)),
            Arc::new(rag.clone()),
            5,
        );
        session.reload_directory().await.unwrap();
        (session, rag)
    }

    fn work_and_home() -> Vec<KnowledgeBase> {
        vec![kb(1, "Work"), kb(2, "Home")]
    }

    #[tokio::test]
    async fn test_empty_message_rejected_locally() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        let err = session.send("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(rag.answer_call_count(), 0);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_mention_only_message_rejected_locally() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        let err = session.send("@Work @Home").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(rag.answer_call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_knowledge_bases_rejected_locally() {
        let (mut session, rag) = session_with(vec![], MockRagService::new()).await;
        let err = session.send("hello").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(rag.answer_call_count(), 0);
    }

    #[tokio::test]
    async fn test_mention_scope_reaches_the_service() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        let turn = session.send("@Work what is the policy").await.unwrap();
        assert_eq!(turn.question, "what is the policy");
        assert_eq!(turn.knowledge_base_ids, vec![1]);
        assert_eq!(rag.seen_scopes(), vec![vec![1]]);
    }

    #[tokio::test]
    async fn test_duplicate_mentions_passed_through_unchanged() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        session.send("@Home compare @Work against @Home").await.unwrap();
        assert_eq!(rag.seen_scopes(), vec![vec![2, 1, 2]]);
    }

    #[tokio::test]
    async fn test_selection_is_the_fallback_scope() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        session.toggle_selection(2).unwrap();
        session.send("what is the policy").await.unwrap();
        assert_eq!(rag.seen_scopes(), vec![vec![2]]);
    }

    #[tokio::test]
    async fn test_empty_selection_falls_back_to_all() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        session.send("what is the policy").await.unwrap();
        assert_eq!(rag.seen_scopes(), vec![vec![1, 2]]);
    }

    #[tokio::test]
    async fn test_turn_renders_deduplicated_references() {
        let answer = RagAnswer {
            answer: "Use the VPN.".to_string(),
            relevant_documents: vec![
                RelevantDocument {
                    note_id: 4,
                    note_title: "IT policy".to_string(),
                    content: "vpn".to_string(),
                    score: 0.8,
                },
                RelevantDocument {
                    note_id: 4,
                    note_title: "IT policy".to_string(),
                    content: "more vpn".to_string(),
                    score: 0.7,
                },
            ],
        };
        let (mut session, _rag) =
            session_with(work_and_home(), MockRagService::new().with_answer(answer)).await;
        let turn = session.send("how do I connect").await.unwrap();
        assert_eq!(turn.rendered, "Use the VPN.\n\nReferences:\n1. IT policy\n");
    }

    #[tokio::test]
    async fn test_service_failure_recorded_and_returned() {
        let (mut session, rag) = session_with(work_and_home(), MockRagService::new()).await;
        rag.fail_next(1);

        let err = session.send("hello").await.unwrap_err();
        assert!(err.is_transient());

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert!(transcript[1].body.contains("something went wrong"));
    }

    #[tokio::test]
    async fn test_transcript_accumulates_turns() {
        let (mut session, _rag) = session_with(work_and_home(), MockRagService::new()).await;
        session.send("first").await.unwrap();
        session.send("second").await.unwrap();
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_toggle_selection_rejects_unknown_id() {
        let (mut session, _rag) = session_with(work_and_home(), MockRagService::new()).await;
        assert!(session.toggle_selection(99).is_err());
        assert!(session.toggle_selection(1).unwrap());
        assert!(!session.toggle_selection(1).unwrap());
    }

    #[tokio::test]
    async fn test_selection_summary() {
        let (mut session, _rag) = session_with(work_and_home(), MockRagService::new()).await;
        assert_eq!(session.selection_summary(), "all");
        session.toggle_selection(2).unwrap();
        session.toggle_selection(1).unwrap();
        assert_eq!(session.selection_summary(), "Home, Work");
    }

    #[tokio::test]
    async fn test_selection_survives_directory_reload() {
        let (mut session, _rag) = session_with(work_and_home(), MockRagService::new()).await;
        session.toggle_selection(1).unwrap();
        session.reload_directory().await.unwrap();
        assert!(session.selection().contains(1));
    }
}
