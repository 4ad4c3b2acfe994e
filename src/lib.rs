//! # verba-components
//!
//! Generator and reader dispatch for retrieval-augmented generation (RAG)
//! pipelines.
//!
//! ## Overview
//!
//! A RAG service answers questions with a language model and ingests documents
//! with a reader; both come in several interchangeable flavours. This crate
//! provides the two managers that keep a fixed set of named backends, track
//! which one is active, and forward calls to it:
//!
//! - [`GeneratorManager`] answers queries with the selected [`Generator`],
//!   after cutting the conversation history to fit its context window
//! - [`ReaderManager`] loads documents with the selected [`Reader`],
//!   filling in omitted inputs with empty lists
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verba_components::{ConversationItem, GeneratorManager, LoadRequest, ReaderManager};
//!
//! #[tokio::main]
//! async fn main() -> verba_components::Result<()> {
//!     let readers = ReaderManager::new()?;
//!     let docs = readers
//!         .load(LoadRequest::new().paths(vec!["docs/".into()]))
//!         .await?;
//!     println!("loaded {} documents", docs.len());
//!
//!     let generators = GeneratorManager::new()?;
//!     if !generators.select("GPT4Generator") {
//!         eprintln!("GPT4Generator unavailable, keeping {}", generators.active_name());
//!     }
//!     let history = vec![ConversationItem::user("What is Verba?")];
//!     let answer = generators
//!         .generate(
//!             &["How do I install it?".to_string()],
//!             &[docs[0].text.clone()],
//!             Some(&history),
//!         )
//!         .await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`generation`] | Generator contract, built-in generators, truncation, manager |
//! | [`reader`] | Reader contract, documents, built-in readers, manager |
//! | [`registry`] | Named backend registry with atomic active selection |
//! | [`tokens`] | Tokenizers used to measure conversation history |
//! | [`types`] | Conversation items and streamed fragments |
//! | [`transport`] | HTTP transport and stream decoders for built-in backends |
//! | [`config`] | YAML/environment configuration and API key lookup |

pub mod config;
pub mod generation;
pub mod reader;
pub mod registry;
pub mod tokens;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::VerbaConfig;
pub use generation::{Generator, GeneratorManager};
pub use reader::{Document, LoadRequest, Reader, ReaderInput, ReaderManager};
pub use types::{ConversationItem, ConversationKind, GenerationChunk};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed stream of fallible items
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
