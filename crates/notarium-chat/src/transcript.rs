//! Transcript entries and answer rendering.

use chrono::{DateTime, Utc};

use notarium_core::RagAnswer;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One rendered message of the conversation.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    pub fn user(body: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(body: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Render an answer with its reference list.
///
/// Source titles are deduplicated in first-seen order: several retrieved
/// chunks of one note yield a single reference line.
pub fn render_answer(answer: &RagAnswer) -> String {
    let mut titles: Vec<&str> = Vec::new();
    for doc in &answer.relevant_documents {
        let title = if doc.note_title.is_empty() {
            "Untitled note"
        } else {
            doc.note_title.as_str()
        };
        if !titles.contains(&title) {
            titles.push(title);
        }
    }

    if titles.is_empty() {
        return answer.answer.clone();
    }

    let mut rendered = answer.answer.clone();
    rendered.push_str("\n\nReferences:\n");
    for (index, title) in titles.iter().enumerate() {
        rendered.push_str(&format!("{}. {}\n", index + 1, title));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use notarium_core::RelevantDocument;

    fn doc(title: &str) -> RelevantDocument {
        RelevantDocument {
            note_id: 1,
            note_title: title.to_string(),
            content: String::new(),
            score: 0.5,
        }
    }

    #[test]
    fn test_render_without_documents_is_answer_only() {
        let answer = RagAnswer {
            answer: "Plain answer".to_string(),
            relevant_documents: vec![],
        };
        assert_eq!(render_answer(&answer), "Plain answer");
    }

    #[test]
    fn test_render_deduplicates_titles_in_first_seen_order() {
        let answer = RagAnswer {
            answer: "A".to_string(),
            relevant_documents: vec![doc("Beta"), doc("Alpha"), doc("Beta"), doc("Alpha")],
        };
        assert_eq!(
            render_answer(&answer),
            "A\n\nReferences:\n1. Beta\n2. Alpha\n"
        );
    }

    #[test]
    fn test_render_untitled_fallback() {
        let answer = RagAnswer {
            answer: "A".to_string(),
            relevant_documents: vec![doc("")],
        };
        assert!(render_answer(&answer).contains("1. Untitled note"));
    }
}
