//! Records exchanged with generation backends.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConversationItem`] | One entry of the chat history shown to the user |
//! | [`ConversationKind`] | Who produced the entry (`user` or `system`) |
//! | [`GenerationChunk`] | One fragment of a streamed answer |

pub mod conversation;
pub mod events;

pub use conversation::{ConversationItem, ConversationKind};
pub use events::GenerationChunk;
