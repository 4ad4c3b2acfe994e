//! Streamed generation fragments.

use serde::{Deserialize, Serialize};

/// One fragment of a streamed answer.
///
/// `finished` is set on the fragment that closes the stream; its `content`
/// may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationChunk {
    pub content: String,
    pub finished: bool,
}

impl GenerationChunk {
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finished: false,
        }
    }

    pub fn finish(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finished: true,
        }
    }
}
