//! # notarium-api
//!
//! Typed REST clients for the notarium backend's `/api` surface.
//!
//! [`ApiClient`] owns the base URL, the bearer token, and envelope decoding;
//! the typed sub-clients ([`AuthClient`], [`KnowledgeBaseClient`],
//! [`NoteClient`], [`RagClient`]) implement the service traits from
//! `notarium-core` on top of it.

pub mod auth;
pub mod client;
pub mod config;
pub mod knowledge_bases;
pub mod notes;
pub mod rag;

pub use auth::AuthClient;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use knowledge_bases::KnowledgeBaseClient;
pub use notes::NoteClient;
pub use rag::RagClient;
