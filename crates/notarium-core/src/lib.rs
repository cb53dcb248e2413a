//! # notarium-core
//!
//! Core types, traits, and abstractions for the notarium client.
//!
//! This crate provides the domain models, the error type, the service trait
//! seams toward the REST backend, and the mention resolver that derives a
//! query's knowledge-base scope from free-text chat input.

pub mod defaults;
pub mod error;
pub mod mention;
pub mod models;
pub mod selection;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use mention::{resolve_mentions, MentionToken, ResolvedScope};
pub use models::*;
pub use selection::SelectionSet;
pub use traits::*;
