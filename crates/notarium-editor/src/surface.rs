//! The external editing surface seam.

use std::sync::Mutex;

/// The externally-rendered editor widget holding the live document text.
///
/// The reconciliation controller is the sole writer of document transitions:
/// only it may call `set_content`. User keystrokes mutate the surface out of
/// band; the embedding shell reports them via
/// [`EditorController::notify_edit`](crate::EditorController::notify_edit).
pub trait EditorSurface: Send + Sync {
    /// The live document text.
    fn content(&self) -> String;

    /// Replace the live document text (document load, discard).
    fn set_content(&self, content: &str);
}

/// Plain in-memory surface, used by headless shells and tests.
#[derive(Default)]
pub struct BufferSurface {
    buffer: Mutex<String>,
}

impl BufferSurface {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            buffer: Mutex::new(content.into()),
        }
    }

    /// Simulate the user replacing the whole text.
    pub fn replace(&self, content: impl Into<String>) {
        *self.buffer.lock().expect("buffer lock poisoned") = content.into();
    }

    /// Simulate the user typing at the end of the document.
    pub fn append(&self, text: &str) {
        self.buffer.lock().expect("buffer lock poisoned").push_str(text);
    }
}

impl EditorSurface for BufferSurface {
    fn content(&self) -> String {
        self.buffer.lock().expect("buffer lock poisoned").clone()
    }

    fn set_content(&self, content: &str) {
        self.replace(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_surface_roundtrip() {
        let surface = BufferSurface::new("hello");
        assert_eq!(surface.content(), "hello");
        surface.append(" world");
        assert_eq!(surface.content(), "hello world");
        surface.set_content("reset");
        assert_eq!(surface.content(), "reset");
    }
}
