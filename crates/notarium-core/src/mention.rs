//! Knowledge-base mention resolution for chat input.
//!
//! Chat messages may scope a query with `@Title` references. A mention
//! candidate is `@` followed by a run of space-separated words (multi-word
//! titles are allowed; a newline never extends a candidate). Each candidate
//! is resolved by exact, case-sensitive title match against the longest
//! word-prefix of the run, so `@Work what is the policy` resolves the title
//! `Work` and leaves the question intact.
//!
//! Resolution never fails: messages whose candidates all miss fall back to
//! the user's ambient selection, or to every known knowledge base when the
//! selection is empty.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::KnowledgeBase;
use crate::selection::SelectionSet;

/// A mention candidate: `@` then words separated by single space runs.
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([^\s@]+(?: +[^\s@]+)*)").expect("mention pattern is valid"));

/// A parsed `@` span within a raw message. Transient: constructed per
/// message and discarded after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken {
    /// The candidate text after `@`. For resolved tokens this is the
    /// matched title; for unresolved tokens, the full greedy run.
    pub raw_text: String,
    pub resolved_kb_id: Option<i64>,
    /// Byte offset of the `@` sign.
    pub start_offset: usize,
    /// Byte offset one past the end of `raw_text`.
    pub end_offset: usize,
}

/// The effective scope of a chat message after mention resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    /// The message with resolved mention spans removed and ends trimmed.
    pub clean_message: String,
    /// Scope ids in document order. Duplicates are preserved: mentioning
    /// the same title twice yields its id twice, and deduplication is the
    /// caller's concern.
    pub knowledge_base_ids: Vec<i64>,
}

/// Scan a message for mention tokens and resolve them against known titles.
///
/// Each greedy candidate is matched against titles by its longest exact
/// word-prefix, longest first, so a short title never swallows trailing
/// question text and a longer title still wins over its own prefix.
pub fn scan_mentions(message: &str, knowledge_bases: &[KnowledgeBase]) -> Vec<MentionToken> {
    // First occurrence wins for duplicate titles, matching list order.
    let mut by_title: HashMap<&str, i64> = HashMap::new();
    for kb in knowledge_bases {
        by_title.entry(kb.title.as_str()).or_insert(kb.id);
    }

    MENTION
        .captures_iter(message)
        .map(|caps| {
            let whole = caps.get(0).expect("match group 0 always present");
            let name = caps.get(1).expect("mention pattern has one group");

            // Try word prefixes of the run, longest first.
            let mut word_ends: Vec<usize> = Vec::new();
            let mut offset = name.start();
            for word in name.as_str().split(' ').filter(|w| !w.is_empty()) {
                // Words are separated by single space runs; find each word's
                // end by scanning forward from the previous one.
                let found = message[offset..]
                    .find(word)
                    .expect("split word occurs in source slice");
                offset += found + word.len();
                word_ends.push(offset);
            }

            for &end in word_ends.iter().rev() {
                let candidate = &message[name.start()..end];
                if let Some(&id) = by_title.get(candidate) {
                    return MentionToken {
                        raw_text: candidate.to_string(),
                        resolved_kb_id: Some(id),
                        start_offset: whole.start(),
                        end_offset: end,
                    };
                }
            }

            MentionToken {
                raw_text: name.as_str().to_string(),
                resolved_kb_id: None,
                start_offset: whole.start(),
                end_offset: whole.end(),
            }
        })
        .collect()
}

/// Resolve `@Title` mentions in a chat message into an effective scope.
///
/// - No mention candidates: the trimmed message with the fallback scope
///   (the selection, or all knowledge bases when the selection is empty).
/// - Some candidates resolve: resolved spans are stripped (in reverse
///   document order, so earlier removals cannot invalidate later offsets)
///   and their ids are collected in document order.
/// - Candidates exist but none resolve: every `@word` span is stripped as
///   defensive cleanup and the fallback scope applies.
///
/// Pure function; never errors.
pub fn resolve_mentions(
    message: &str,
    knowledge_bases: &[KnowledgeBase],
    selection: &SelectionSet,
) -> ResolvedScope {
    let fallback = || -> Vec<i64> {
        if selection.is_empty() {
            knowledge_bases.iter().map(|kb| kb.id).collect()
        } else {
            selection.ids().to_vec()
        }
    };

    let tokens = scan_mentions(message, knowledge_bases);
    if tokens.is_empty() {
        return ResolvedScope {
            clean_message: message.trim().to_string(),
            knowledge_base_ids: fallback(),
        };
    }

    let ids: Vec<i64> = tokens.iter().filter_map(|t| t.resolved_kb_id).collect();

    let mut cleaned = message.to_string();
    if ids.is_empty() {
        // Nothing resolved: strip the `@` and its first word from every
        // candidate, leaving any trailing words in the message.
        for token in tokens.iter().rev() {
            let first_word_len = token
                .raw_text
                .split(' ')
                .next()
                .map(str::len)
                .unwrap_or(token.raw_text.len());
            cleaned.replace_range(token.start_offset..token.start_offset + 1 + first_word_len, "");
        }
        return ResolvedScope {
            clean_message: cleaned.trim().to_string(),
            knowledge_base_ids: fallback(),
        };
    }

    for token in tokens.iter().rev() {
        if token.resolved_kb_id.is_some() {
            cleaned.replace_range(token.start_offset..token.end_offset, "");
        }
    }
    debug!(
        candidates = tokens.len(),
        resolved = ids.len(),
        "Resolved mention scope"
    );
    ResolvedScope {
        clean_message: cleaned.trim().to_string(),
        knowledge_base_ids: ids,
    }
}
