//! The streamed text unit

use std::fmt;

/// One piece of partial text flowing through a stage's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
}

impl TextChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl fmt::Display for TextChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

impl From<&str> for TextChunk {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for TextChunk {
    fn from(content: String) -> Self {
        Self { content }
    }
}
