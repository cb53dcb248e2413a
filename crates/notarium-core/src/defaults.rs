//! Centralized default constants for the notarium client.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// BACKEND
// =============================================================================

/// Default base URL for the REST backend's `/api` surface.
pub const API_BASE_URL: &str = "http://127.0.0.1:8080/api";

/// Timeout for REST requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// RAG
// =============================================================================

/// Default number of retrieved chunks per RAG query.
pub const RAG_TOP_K: u32 = 5;

// =============================================================================
// EDITOR
// =============================================================================

/// Autosave quiet period: edits within this window collapse into one save.
pub const AUTOSAVE_QUIET_MS: u64 = 2000;
