//! Answer generation: the [`Generator`] contract, the built-in generators and
//! the [`GeneratorManager`] that dispatches to the selected one.
//!
//! | Generator | Backend | Context window |
//! |-----------|---------|----------------|
//! | `GPT4Generator` | OpenAI chat completions, `gpt-4` | 8000 |
//! | `GPT3Generator` | OpenAI chat completions, `gpt-3.5-turbo` (default) | 10000 |
//! | `CohereGenerator` | Cohere chat, `command` | 3000 |
//! | `Llama2Generator` | OpenAI-compatible local server, `llama2` | 3000 |

mod cohere;
mod manager;
mod openai;
pub mod prompt;
mod truncate;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;

use crate::config::VerbaConfig;
use crate::types::{ConversationItem, GenerationChunk};
use crate::{BoxStream, Result};

pub use cohere::CohereGenerator;
pub use manager::GeneratorManager;
pub use openai::OpenAiGenerator;
pub use truncate::truncate_conversation;

/// Contract every generation backend implements.
///
/// Implementations must be cheap to share: the manager hands out `Arc`s and
/// may run several requests against one instance concurrently.
#[async_trait]
pub trait Generator: Send + Sync + fmt::Debug {
    /// Registry name, e.g. `GPT3Generator`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Environment variables the backend needs at request time.
    fn requires_env(&self) -> &[&'static str] {
        &[]
    }

    /// Input tokens the backend accepts.
    fn context_window(&self) -> usize;

    async fn generate(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<String>;

    /// Stream the answer fragment by fragment.
    ///
    /// The default awaits [`Generator::generate`] and yields it as one
    /// finished fragment.
    async fn generate_stream(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        let answer = self.generate(queries, context, conversation).await?;
        Ok(Box::pin(stream::once(async move {
            Ok(GenerationChunk::finish(answer))
        })))
    }
}

/// The four built-in generators, keyed by registry name.
pub fn builtin_generators(config: &VerbaConfig) -> Result<Vec<(String, Arc<dyn Generator>)>> {
    let generators: Vec<Arc<dyn Generator>> = vec![
        Arc::new(OpenAiGenerator::gpt4(config)?),
        Arc::new(OpenAiGenerator::gpt3(config)?),
        Arc::new(CohereGenerator::new(config)?),
        Arc::new(OpenAiGenerator::llama2(config)?),
    ];
    Ok(generators
        .into_iter()
        .map(|g| (g.name().to_string(), g))
        .collect())
}
