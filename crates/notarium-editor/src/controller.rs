//! The editor reconciliation controller.
//!
//! Owns the binding between the shared editor surface and the one "current"
//! note, and keeps the note's persisted state consistent with its live text
//! under three triggers: edit-idle autosave, document switches, and session
//! teardown.
//!
//! ## State machine (per document session)
//!
//! ```text
//! Clean --edit--> Dirty --timer--> Saving --success--> Clean
//!   Dirty --edit--> Dirty (timer reset)
//!   Saving --failure--> Dirty (edits retained, no automatic re-arm)
//!   any --detach/discard--> Detached
//! ```
//!
//! The dirty predicate is exact string inequality between the live surface
//! text and the last persisted content; a trailing-newline difference counts
//! as dirty. Saves are serialized per controller, so at most one save is in
//! flight at any time and a slow save can never be overtaken by a newer one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use notarium_core::{defaults, Note, NoteDraft, NoteStore, Result};

use crate::dialog::DialogProvider;
use crate::status::{SaveStatus, StatusSink};
use crate::surface::EditorSurface;

/// Observable state of the current document session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document is bound.
    Detached,
    /// Live text equals the persisted snapshot.
    Clean,
    /// Live text differs from the persisted snapshot.
    Dirty,
    /// A save request is in flight.
    Saving,
}

struct Shared {
    store: Arc<dyn NoteStore>,
    surface: Arc<dyn EditorSurface>,
    status: Arc<dyn StatusSink>,
    /// Last persisted snapshot of the bound note (the server's canonical
    /// copy after each successful save).
    session: Mutex<Option<Note>>,
    /// Serializes saves: the at-most-one-in-flight guarantee.
    save_gate: AsyncMutex<()>,
    saving: AtomicBool,
    /// Debounce generation. Each edit (and each flush) bumps it; a timer
    /// whose generation is stale was superseded and must not save.
    epoch: AtomicU64,
}

impl Shared {
    fn is_dirty(&self) -> bool {
        let session = self.session.lock().expect("session lock poisoned");
        match session.as_ref() {
            Some(note) => self.surface.content() != note.content,
            None => false,
        }
    }

    /// Save the live content if it still differs from the snapshot.
    ///
    /// Callers race freely: the gate serializes them, and the dirty re-check
    /// behind the gate makes superfluous attempts no-ops.
    async fn save_current(&self) -> Result<()> {
        let _gate = self.save_gate.lock().await;

        let (id, draft) = {
            let session = self.session.lock().expect("session lock poisoned");
            let note = match session.as_ref() {
                Some(note) => note,
                None => return Ok(()),
            };
            let live = self.surface.content();
            if live == note.content {
                return Ok(());
            }
            (
                note.id,
                NoteDraft {
                    title: note.title.clone(),
                    content: live,
                    knowledge_base_id: note.knowledge_base_id,
                },
            )
        };

        self.saving.store(true, Ordering::SeqCst);
        self.status.status(SaveStatus::Saving);
        let result = self.store.update(id, draft).await;
        self.saving.store(false, Ordering::SeqCst);

        match result {
            Ok(canonical) => {
                let mut session = self.session.lock().expect("session lock poisoned");
                // The document may have been discarded while the save ran;
                // a canonical copy for a stale binding is dropped.
                if session.as_ref().map(|note| note.id) == Some(canonical.id) {
                    *session = Some(canonical);
                }
                self.status.status(SaveStatus::Saved);
                Ok(())
            }
            Err(e) => {
                warn!(note_id = id, error = %e, "Save failed, local edits retained");
                self.status.status(SaveStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Reconciliation controller for the shared editor surface.
///
/// Exclusively owns "current document" transitions; the embedding shell
/// reports keystrokes via [`notify_edit`](Self::notify_edit) and routes
/// navigation through [`bind_document`](Self::bind_document) /
/// [`detach`](Self::detach).
pub struct EditorController {
    shared: Arc<Shared>,
    dialogs: Arc<dyn DialogProvider>,
    quiet_period: Duration,
}

impl EditorController {
    pub fn new(
        store: Arc<dyn NoteStore>,
        surface: Arc<dyn EditorSurface>,
        status: Arc<dyn StatusSink>,
        dialogs: Arc<dyn DialogProvider>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                surface,
                status,
                session: Mutex::new(None),
                save_gate: AsyncMutex::new(()),
                saving: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            dialogs,
            quiet_period: Duration::from_millis(defaults::AUTOSAVE_QUIET_MS),
        }
    }

    /// Override the autosave quiet period.
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Id of the currently bound note, if any.
    pub fn current_note_id(&self) -> Option<i64> {
        self.shared
            .session
            .lock()
            .expect("session lock poisoned")
            .as_ref()
            .map(|note| note.id)
    }

    pub fn state(&self) -> SessionState {
        if self
            .shared
            .session
            .lock()
            .expect("session lock poisoned")
            .is_none()
        {
            return SessionState::Detached;
        }
        if self.shared.saving.load(Ordering::SeqCst) {
            return SessionState::Saving;
        }
        if self.shared.is_dirty() {
            SessionState::Dirty
        } else {
            SessionState::Clean
        }
    }

    /// Dirty predicate: exact inequality, no normalization.
    pub fn is_dirty(&self) -> bool {
        self.shared.is_dirty()
    }

    /// Bind a document to the surface, flushing the outgoing one first.
    ///
    /// When the outgoing flush fails the new document is NOT loaded: the
    /// failure has been surfaced and the caller decides whether to retry or
    /// [`discard`](Self::discard) before switching.
    pub async fn bind_document(&self, note: Note) -> Result<()> {
        if self.shared.is_dirty() {
            self.flush().await?;
        }
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        let content = note.content.clone();
        info!(note_id = note.id, "Binding document");
        *self.shared.session.lock().expect("session lock poisoned") = Some(note);
        self.shared.surface.set_content(&content);
        Ok(())
    }

    /// Report an edit on the surface: arms (or re-arms) the autosave timer.
    ///
    /// Edits during an in-flight save re-arm the timer as usual; the armed
    /// save then waits its turn behind the gate, so the document never has
    /// two saves in flight. Must be called from within a tokio runtime.
    pub fn notify_edit(&self) {
        if !self.shared.is_dirty() {
            return;
        }
        let armed_epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        let quiet_period = self.quiet_period;
        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if shared.epoch.load(Ordering::SeqCst) != armed_epoch {
                // A newer edit re-armed the timer, or a flush ran.
                return;
            }
            if let Err(e) = shared.save_current().await {
                debug!(error = %e, "Autosave failed; awaiting next edit or explicit flush");
            }
        });
    }

    /// Save now if dirty, cancelling any pending autosave timer.
    pub async fn flush(&self) -> Result<()> {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.save_current().await
    }

    /// Drop the session without saving and clear the surface.
    pub fn discard(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        *self.shared.session.lock().expect("session lock poisoned") = None;
        self.shared.surface.set_content("");
    }

    /// End the session (navigation away, shell shutdown).
    ///
    /// A dirty document is flushed first. When the flush fails the user is
    /// asked whether to discard; declining keeps the session bound and
    /// returns the save error, blocking the navigation rather than losing
    /// data silently.
    pub async fn detach(&self) -> Result<()> {
        if self.shared.is_dirty() {
            if let Err(e) = self.flush().await {
                let discard = self
                    .dialogs
                    .confirm(
                        "Unsaved changes",
                        &format!("Saving failed ({}). Discard unsaved changes and leave?", e),
                    )
                    .await;
                if !discard {
                    return Err(e);
                }
            }
        }
        self.discard();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::AutoDialogs;
    use crate::status::LogStatusSink;
    use crate::surface::BufferSurface;
    use notarium_core::mock::MockNoteStore;

    /// Status sink recording every transition for assertion.
    #[derive(Default)]
    struct RecordingStatusSink {
        seen: Mutex<Vec<SaveStatus>>,
    }

    impl RecordingStatusSink {
        fn seen(&self) -> Vec<SaveStatus> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl StatusSink for RecordingStatusSink {
        fn status(&self, status: SaveStatus) {
            self.seen.lock().unwrap().push(status);
        }
    }

    struct Harness {
        store: MockNoteStore,
        surface: Arc<BufferSurface>,
        status: Arc<RecordingStatusSink>,
        controller: EditorController,
    }

    const QUIET: Duration = Duration::from_millis(2000);

    async fn harness_with_dialogs(dialogs: AutoDialogs) -> (Harness, Note) {
        let store = MockNoteStore::new();
        let note = store
            .create(NoteDraft {
                title: "Plan".to_string(),
                content: "v0".to_string(),
                knowledge_base_id: 1,
            })
            .await
            .unwrap();
        let surface = Arc::new(BufferSurface::default());
        let status = Arc::new(RecordingStatusSink::default());
        let controller = EditorController::new(
            Arc::new(store.clone()),
            surface.clone(),
            status.clone(),
            Arc::new(dialogs),
        )
        .with_quiet_period(QUIET);
        (
            Harness {
                store,
                surface,
                status,
                controller,
            },
            note,
        )
    }

    async fn harness() -> (Harness, Note) {
        harness_with_dialogs(AutoDialogs::declining()).await
    }

    fn edit(h: &Harness, content: &str) {
        h.surface.replace(content);
        h.controller.notify_edit();
    }

    #[tokio::test]
    async fn test_bind_loads_content_and_state_is_clean() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();
        assert_eq!(h.surface.content(), "v0");
        assert_eq!(h.controller.state(), SessionState::Clean);
        assert_eq!(h.controller.current_note_id(), Some(note.id));
    }

    #[tokio::test]
    async fn test_unbound_controller_is_detached_and_never_dirty() {
        let (h, _note) = harness().await;
        assert_eq!(h.controller.state(), SessionState::Detached);
        h.surface.replace("stray text");
        assert!(!h.controller.is_dirty());
        h.controller.flush().await.unwrap();
        assert_eq!(h.store.update_call_count(), 0);
    }

    #[tokio::test]
    async fn test_dirty_predicate_is_exact_and_idempotent() {
        let (h, note) = harness().await;
        h.controller.bind_document(note).await.unwrap();

        assert!(!h.controller.is_dirty());
        // A trailing newline difference counts as dirty.
        h.surface.append("\n");
        assert!(h.controller.is_dirty());
        // Idempotent without an intervening edit.
        assert!(h.controller.is_dirty());
        assert_eq!(h.controller.state(), SessionState::Dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_rapid_edits_into_one_save() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();

        edit(&h, "v1");
        edit(&h, "v2");
        edit(&h, "v3");

        tokio::time::sleep(QUIET + Duration::from_millis(100)).await;

        assert_eq!(h.store.update_call_count(), 1);
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v3");
        assert_eq!(h.controller.state(), SessionState::Clean);
        assert_eq!(
            h.status.seen(),
            vec![SaveStatus::Saving, SaveStatus::Saved]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_edit_resets_the_timer() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();

        edit(&h, "v1");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        edit(&h, "v2");
        // 2500ms after the first edit, but only 1000ms after the second:
        // the reset timer must not have fired yet.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.store.update_call_count(), 0);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(h.store.update_call_count(), 1);
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_edit_without_changes_never_saves() {
        let (h, note) = harness().await;
        h.controller.bind_document(note).await.unwrap();

        h.controller.notify_edit();
        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(h.store.update_call_count(), 0);
        assert!(h.status.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_save_in_flight() {
        let (h, note) = harness().await;
        // Recreate the store with latency so a save stays in flight.
        let store = MockNoteStore::new().with_latency_ms(1000);
        let note = {
            let seeded = store.clone().with_notes(vec![note.clone()]);
            seeded.get(note.id).await.unwrap()
        };
        let controller = EditorController::new(
            Arc::new(store.clone()),
            h.surface.clone(),
            h.status.clone(),
            Arc::new(AutoDialogs::declining()),
        )
        .with_quiet_period(QUIET);
        controller.bind_document(note.clone()).await.unwrap();

        h.surface.replace("v1");
        controller.notify_edit();

        // Land mid-save: timer fired at 2000ms, save completes at 3000ms.
        tokio::time::sleep(Duration::from_millis(2200)).await;
        assert_eq!(controller.state(), SessionState::Saving);

        // Edits while saving re-arm the debounce but must not start a
        // second concurrent save.
        h.surface.replace("v2");
        controller.notify_edit();
        controller.notify_edit();
        controller.notify_edit();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.update_call_count(), 1);

        // First save settles, then the re-armed timer saves v2.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(store.update_call_count(), 2);
        assert_eq!(store.max_updates_in_flight(), 1);
        assert_eq!(store.stored_content(note.id).unwrap(), "v2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_reverts_to_dirty_and_keeps_edits() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();

        h.store.fail_next(1);
        edit(&h, "v1");
        tokio::time::sleep(QUIET + Duration::from_millis(100)).await;

        assert_eq!(h.controller.state(), SessionState::Dirty);
        assert_eq!(h.surface.content(), "v1");
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v0");
        assert!(matches!(
            h.status.seen().last(),
            Some(SaveStatus::Failed(_))
        ));

        // The timer is not re-armed by the failure itself.
        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(h.store.update_call_count(), 1);

        // An explicit flush retries with the live content.
        h.controller.flush().await.unwrap();
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v1");
        assert_eq!(h.controller.state(), SessionState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_cancels_pending_timer() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();

        edit(&h, "v1");
        h.controller.flush().await.unwrap();
        assert_eq!(h.store.update_call_count(), 1);

        // The armed timer must not fire a second save.
        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(h.store.update_call_count(), 1);
    }

    #[tokio::test]
    async fn test_server_normalization_becomes_the_snapshot() {
        let store = MockNoteStore::new().with_normalizer(|c| format!("{}\n", c));
        let note = store
            .create(NoteDraft {
                title: "Plan".to_string(),
                content: "v0".to_string(),
                knowledge_base_id: 1,
            })
            .await
            .unwrap();
        let surface = Arc::new(BufferSurface::default());
        let controller = EditorController::new(
            Arc::new(store.clone()),
            surface.clone(),
            Arc::new(LogStatusSink),
            Arc::new(AutoDialogs::declining()),
        );
        controller.bind_document(note.clone()).await.unwrap();

        surface.replace("v1");
        controller.flush().await.unwrap();

        // The canonical copy ("v1\n") replaced the snapshot wholesale, and
        // the live surface ("v1") now differs from it: dirty again, exactly
        // as the exact-inequality predicate demands.
        assert_eq!(store.stored_content(note.id).unwrap(), "v1\n");
        assert_eq!(controller.state(), SessionState::Dirty);
    }

    #[tokio::test]
    async fn test_switching_documents_flushes_outgoing_first() {
        let (h, note) = harness().await;
        let second = h
            .store
            .create(NoteDraft {
                title: "Second".to_string(),
                content: "second body".to_string(),
                knowledge_base_id: 1,
            })
            .await
            .unwrap();

        h.controller.bind_document(note.clone()).await.unwrap();
        h.surface.replace("v1");

        h.controller.bind_document(second.clone()).await.unwrap();

        // The outgoing edit was persisted before the surface was reloaded.
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v1");
        assert_eq!(h.surface.content(), "second body");
        assert_eq!(h.controller.current_note_id(), Some(second.id));
        assert_eq!(h.controller.state(), SessionState::Clean);
    }

    #[tokio::test]
    async fn test_failed_outgoing_flush_blocks_the_switch() {
        let (h, note) = harness().await;
        let second = h
            .store
            .create(NoteDraft {
                title: "Second".to_string(),
                content: "second body".to_string(),
                knowledge_base_id: 1,
            })
            .await
            .unwrap();

        h.controller.bind_document(note.clone()).await.unwrap();
        h.surface.replace("v1");

        h.store.fail_next(1);
        let err = h.controller.bind_document(second).await.unwrap_err();
        assert!(err.is_transient());

        // The outgoing document stays bound with its edits intact.
        assert_eq!(h.controller.current_note_id(), Some(note.id));
        assert_eq!(h.surface.content(), "v1");
        assert_eq!(h.controller.state(), SessionState::Dirty);
    }

    #[tokio::test]
    async fn test_detach_flushes_and_clears() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();
        h.surface.replace("v1");

        h.controller.detach().await.unwrap();
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v1");
        assert_eq!(h.controller.state(), SessionState::Detached);
        assert_eq!(h.surface.content(), "");
    }

    #[tokio::test]
    async fn test_detach_blocked_when_flush_fails_and_user_declines() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();
        h.surface.replace("v1");

        h.store.fail_next(1);
        let err = h.controller.detach().await.unwrap_err();
        assert!(err.is_transient());

        // Declining the discard keeps the session (and the edits) alive.
        assert_eq!(h.controller.state(), SessionState::Dirty);
        assert_eq!(h.surface.content(), "v1");
    }

    #[tokio::test]
    async fn test_detach_discards_when_flush_fails_and_user_confirms() {
        let (h, note) = harness_with_dialogs(AutoDialogs::confirming()).await;
        h.controller.bind_document(note.clone()).await.unwrap();
        h.surface.replace("v1");

        h.store.fail_next(1);
        h.controller.detach().await.unwrap();

        assert_eq!(h.controller.state(), SessionState::Detached);
        // The confirmed discard intentionally drops the edit.
        assert_eq!(h.store.stored_content(note.id).unwrap(), "v0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_pending_autosave() {
        let (h, note) = harness().await;
        h.controller.bind_document(note.clone()).await.unwrap();

        edit(&h, "v1");
        h.controller.discard();

        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(h.store.update_call_count(), 0);
        assert_eq!(h.controller.state(), SessionState::Detached);
        assert_eq!(h.surface.content(), "");
    }
}
