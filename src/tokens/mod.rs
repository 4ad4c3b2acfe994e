//! Token counting and slicing used to keep conversation history inside a
//! generator's context budget.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Tokenizer`] | Trait: encode text to token ids and decode id slices back |
//! | [`BpeTokenizer`] | tiktoken BPE encodings, resolved by model name |
//! | [`CharTokenizer`] | One token per `char`; deterministic, no encoding tables |
//!
//! ## Example
//!
//! ```rust
//! use verba_components::tokens::{CharTokenizer, Tokenizer};
//!
//! let tok = CharTokenizer::new();
//! let ids = tok.encode("hello");
//! assert_eq!(tok.count("hello"), 5);
//! assert_eq!(tok.decode_prefix(&ids, 3), "hel");
//! ```

mod tokenizer;

pub use tokenizer::{
    tokenizer_for_model, BpeTokenizer, CharTokenizer, EncodingKind, Tokenizer, TokenizerError,
};
