//! Confirmation-dialog seam.
//!
//! Two providers: an interactive terminal prompt, and a fixed-answer policy
//! for headless runs. The right one is picked once at startup from the
//! environment's capabilities, not per call.

use std::io::IsTerminal;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

/// Asks the user to confirm a destructive choice.
#[async_trait]
pub trait DialogProvider: Send + Sync {
    /// Returns `true` when the user confirms.
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Interactive provider: `[y/N]` line prompt on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioDialogs;

#[async_trait]
impl DialogProvider for StdioDialogs {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        let prompt = format!("{}: {} [y/N] ", title, message);
        // Stdin reads block, so hop off the async executor.
        tokio::task::spawn_blocking(move || {
            use std::io::{BufRead, Write};
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{}", prompt);
            let _ = stdout.flush();
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim(), "y" | "Y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

/// Headless provider answering every confirmation with a fixed policy.
#[derive(Debug, Clone, Copy)]
pub struct AutoDialogs {
    answer: bool,
}

impl AutoDialogs {
    /// Confirm everything (scripted batch runs).
    pub fn confirming() -> Self {
        Self { answer: true }
    }

    /// Decline everything: the safe default, since declining keeps data.
    pub fn declining() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl DialogProvider for AutoDialogs {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        warn!(title, message, answer = self.answer, "Auto-answered confirmation");
        self.answer
    }
}

/// Pick a provider for this process: interactive when stdin is a terminal,
/// otherwise the declining policy (never discards data unattended).
pub fn select_dialog_provider() -> Arc<dyn DialogProvider> {
    if std::io::stdin().is_terminal() {
        Arc::new(StdioDialogs)
    } else {
        Arc::new(AutoDialogs::declining())
    }
}
