//! Scripted in-memory service mocks for deterministic testing.
//!
//! Every mock records its calls for assertion and fails on request via an
//! explicit script rather than a random failure rate, so tests stay
//! reproducible.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;

/// One recorded service call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<MockCall>>,
}

impl CallLog {
    fn record(&self, operation: &str, input: impl Into<String>) {
        self.calls.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.into(),
        });
    }

    fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

// =============================================================================
// NOTE STORE
// =============================================================================

/// In-memory [`NoteStore`] with call logging and scripted failures.
#[derive(Clone, Default)]
pub struct MockNoteStore {
    notes: Arc<Mutex<HashMap<i64, Note>>>,
    next_id: Arc<Mutex<i64>>,
    fail_next: Arc<Mutex<u32>>,
    latency_ms: u64,
    normalizer: Option<Arc<dyn Fn(&str) -> String + Send + Sync>>,
    log: Arc<CallLog>,
    updates_in_flight: Arc<Mutex<u32>>,
    max_updates_in_flight: Arc<Mutex<u32>>,
}

impl MockNoteStore {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(Mutex::new(1)),
            ..Self::default()
        }
    }

    /// Seed the store with existing notes.
    pub fn with_notes(self, notes: Vec<Note>) -> Self {
        {
            let mut map = self.notes.lock().unwrap();
            let mut next = self.next_id.lock().unwrap();
            for note in notes {
                *next = (*next).max(note.id + 1);
                map.insert(note.id, note);
            }
        }
        self
    }

    /// Simulate server-side content normalization on save.
    pub fn with_normalizer(
        mut self,
        normalizer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Simulated latency for every operation.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Script the next `n` mutating calls to fail with a network error.
    pub fn fail_next(&self, n: u32) {
        *self.fail_next.lock().unwrap() = n;
    }

    /// Content currently persisted for a note.
    pub fn stored_content(&self, id: i64) -> Option<String> {
        self.notes.lock().unwrap().get(&id).map(|n| n.content.clone())
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.log.calls()
    }

    pub fn update_call_count(&self) -> usize {
        self.log.count("update")
    }

    /// Highest number of update calls that were ever in flight at once.
    pub fn max_updates_in_flight(&self) -> u32 {
        *self.max_updates_in_flight.lock().unwrap()
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    fn take_scripted_failure(&self) -> bool {
        let mut remaining = self.fail_next.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl NoteStore for MockNoteStore {
    async fn list(&self, knowledge_base_id: i64) -> Result<Vec<Note>> {
        self.log.record("list", knowledge_base_id.to_string());
        self.simulate_latency().await;
        let mut notes: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.knowledge_base_id == knowledge_base_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.id);
        Ok(notes)
    }

    async fn search(&self, knowledge_base_id: i64, keyword: &str) -> Result<Vec<Note>> {
        self.log.record("search", keyword);
        let notes = self.list(knowledge_base_id).await?;
        Ok(notes
            .into_iter()
            .filter(|n| n.title.contains(keyword) || n.content.contains(keyword))
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Note> {
        self.log.record("get", id.to_string());
        self.simulate_latency().await;
        self.notes
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))
    }

    async fn create(&self, draft: NoteDraft) -> Result<Note> {
        self.log.record("create", draft.title.clone());
        self.simulate_latency().await;
        if self.take_scripted_failure() {
            return Err(Error::Request("simulated network failure".to_string()));
        }
        let mut next = self.next_id.lock().unwrap();
        let note = Note {
            id: *next,
            title: draft.title,
            content: draft.content,
            knowledge_base_id: draft.knowledge_base_id,
            create_time: None,
            update_time: None,
        };
        *next += 1;
        self.notes.lock().unwrap().insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: i64, draft: NoteDraft) -> Result<Note> {
        self.log.record("update", draft.content.clone());
        {
            let mut in_flight = self.updates_in_flight.lock().unwrap();
            *in_flight += 1;
            let mut max = self.max_updates_in_flight.lock().unwrap();
            *max = (*max).max(*in_flight);
        }
        self.simulate_latency().await;
        *self.updates_in_flight.lock().unwrap() -= 1;

        if self.take_scripted_failure() {
            return Err(Error::Request("simulated network failure".to_string()));
        }
        let content = match &self.normalizer {
            Some(normalize) => normalize(&draft.content),
            None => draft.content.clone(),
        };
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))?;
        note.title = draft.title;
        note.content = content;
        note.knowledge_base_id = draft.knowledge_base_id;
        Ok(note.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.log.record("delete", id.to_string());
        self.simulate_latency().await;
        if self.take_scripted_failure() {
            return Err(Error::Request("simulated network failure".to_string()));
        }
        self.notes
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))
    }
}

// =============================================================================
// KNOWLEDGE BASE DIRECTORY
// =============================================================================

/// Fixed-list [`KnowledgeBaseDirectory`] mock.
#[derive(Clone, Default)]
pub struct MockDirectory {
    bases: Arc<Mutex<Vec<KnowledgeBase>>>,
    log: Arc<CallLog>,
}

impl MockDirectory {
    pub fn new(bases: Vec<KnowledgeBase>) -> Self {
        Self {
            bases: Arc::new(Mutex::new(bases)),
            log: Arc::default(),
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.log.count("list")
    }
}

#[async_trait]
impl KnowledgeBaseDirectory for MockDirectory {
    async fn list(&self) -> Result<Vec<KnowledgeBase>> {
        self.log.record("list", "");
        Ok(self.bases.lock().unwrap().clone())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<KnowledgeBase>> {
        self.log.record("search", keyword);
        Ok(self
            .bases
            .lock()
            .unwrap()
            .iter()
            .filter(|kb| kb.title.contains(keyword) || kb.description.contains(keyword))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        self.log.record("create", draft.title.clone());
        let mut bases = self.bases.lock().unwrap();
        let id = bases.iter().map(|kb| kb.id).max().unwrap_or(0) + 1;
        let kb = KnowledgeBase {
            id,
            title: draft.title,
            description: draft.description,
            note_count: 0,
            create_time: None,
            update_time: None,
            index_update_time: None,
        };
        bases.push(kb.clone());
        Ok(kb)
    }

    async fn update(&self, id: i64, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        self.log.record("update", id.to_string());
        let mut bases = self.bases.lock().unwrap();
        let kb = bases
            .iter_mut()
            .find(|kb| kb.id == id)
            .ok_or_else(|| Error::NotFound(format!("knowledge base {}", id)))?;
        kb.title = draft.title;
        kb.description = draft.description;
        Ok(kb.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.log.record("delete", id.to_string());
        let mut bases = self.bases.lock().unwrap();
        let before = bases.len();
        bases.retain(|kb| kb.id != id);
        if bases.len() == before {
            return Err(Error::NotFound(format!("knowledge base {}", id)));
        }
        Ok(())
    }
}

// =============================================================================
// RAG SERVICE
// =============================================================================

/// Scripted [`RagService`] mock with per-question answers and a call log.
#[derive(Clone, Default)]
pub struct MockRagService {
    default_answer: Arc<Mutex<RagAnswer>>,
    answers: Arc<Mutex<HashMap<String, RagAnswer>>>,
    fail_next: Arc<Mutex<u32>>,
    log: Arc<CallLog>,
    scopes: Arc<Mutex<Vec<Vec<i64>>>>,
}

impl MockRagService {
    pub fn new() -> Self {
        let service = Self::default();
        *service.default_answer.lock().unwrap() = RagAnswer {
            answer: "Mock answer".to_string(),
            relevant_documents: vec![],
        };
        service
    }

    pub fn with_answer(self, answer: RagAnswer) -> Self {
        *self.default_answer.lock().unwrap() = answer;
        self
    }

    pub fn with_answer_for(self, question: impl Into<String>, answer: RagAnswer) -> Self {
        self.answers.lock().unwrap().insert(question.into(), answer);
        self
    }

    /// Script the next `n` queries to fail with a network error.
    pub fn fail_next(&self, n: u32) {
        *self.fail_next.lock().unwrap() = n;
    }

    pub fn answer_call_count(&self) -> usize {
        self.log.count("answer")
    }

    /// The knowledge-base scopes of each query, in call order.
    pub fn seen_scopes(&self) -> Vec<Vec<i64>> {
        self.scopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RagService for MockRagService {
    async fn answer(
        &self,
        question: &str,
        knowledge_base_ids: &[i64],
        _top_k: u32,
    ) -> Result<RagAnswer> {
        self.log.record("answer", question);
        self.scopes.lock().unwrap().push(knowledge_base_ids.to_vec());
        {
            let mut remaining = self.fail_next.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Request("simulated network failure".to_string()));
            }
        }
        if let Some(answer) = self.answers.lock().unwrap().get(question) {
            return Ok(answer.clone());
        }
        Ok(self.default_answer.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: &str, kb: i64) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            knowledge_base_id: kb,
        }
    }

    #[tokio::test]
    async fn test_note_store_create_get_update() {
        let store = MockNoteStore::new();
        let note = store.create(draft("a", "body", 1)).await.unwrap();
        assert_eq!(store.get(note.id).await.unwrap().content, "body");

        let updated = store.update(note.id, draft("a", "body2", 1)).await.unwrap();
        assert_eq!(updated.content, "body2");
        assert_eq!(store.stored_content(note.id).unwrap(), "body2");
    }

    #[tokio::test]
    async fn test_note_store_scripted_failure() {
        let store = MockNoteStore::new();
        let note = store.create(draft("a", "body", 1)).await.unwrap();

        store.fail_next(1);
        let err = store.update(note.id, draft("a", "x", 1)).await.unwrap_err();
        assert!(err.is_transient());

        // Failure script is consumed; the retry succeeds.
        store.update(note.id, draft("a", "x", 1)).await.unwrap();
        assert_eq!(store.update_call_count(), 2);
    }

    #[tokio::test]
    async fn test_note_store_normalizer() {
        let store = MockNoteStore::new().with_normalizer(|c| format!("{}\n", c.trim_end()));
        let note = store.create(draft("a", "", 1)).await.unwrap();
        let updated = store.update(note.id, draft("a", "text", 1)).await.unwrap();
        assert_eq!(updated.content, "text\n");
    }

    #[tokio::test]
    async fn test_rag_mock_records_scope() {
        let rag = MockRagService::new();
        rag.answer("q", &[1, 2], 5).await.unwrap();
        assert_eq!(rag.seen_scopes(), vec![vec![1, 2]]);
        assert_eq!(rag.answer_call_count(), 1);
    }
}
