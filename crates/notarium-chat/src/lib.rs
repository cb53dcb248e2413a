//! # notarium-chat
//!
//! Chat session controller for RAG question answering: knowledge-base scope
//! derivation via `@mention` resolution, the send pipeline, and transcript
//! bookkeeping.

pub mod session;
pub mod transcript;

pub use session::{ChatSession, ChatTurn};
pub use transcript::{render_answer, ChatEntry, ChatRole};
