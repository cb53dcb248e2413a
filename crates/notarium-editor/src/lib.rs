//! # notarium-editor
//!
//! Reconciliation loop between a single externally-rendered document and its
//! persisted state: dirty tracking, debounced autosave, at-most-one in-flight
//! save per document, and safe hand-off when the bound document changes or
//! the session ends.
//!
//! The loop is pure coordination: the editing widget, the status indicator,
//! and the confirmation dialog are trait seams, so the whole crate is
//! testable without a rendering environment.

pub mod controller;
pub mod dialog;
pub mod status;
pub mod surface;

pub use controller::{EditorController, SessionState};
pub use dialog::{select_dialog_provider, AutoDialogs, DialogProvider, StdioDialogs};
pub use status::{LogStatusSink, SaveStatus, StatusSink};
pub use surface::{BufferSurface, EditorSurface};
