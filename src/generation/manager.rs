use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::generation::{builtin_generators, truncate_conversation, Generator};
use crate::registry::{Selection, StrategyRegistry};
use crate::tokens::{tokenizer_for_model, Tokenizer};
use crate::types::{ConversationItem, GenerationChunk};
use crate::{BoxStream, Result};

/// Dispatches generation requests to the selected [`Generator`].
///
/// Before forwarding, the conversation history is cut to a share
/// (`context_ratio`, 37.5% by default) of the generator's context window.
/// Backend errors are returned as-is.
pub struct GeneratorManager {
    registry: StrategyRegistry<dyn Generator>,
    tokenizer: Arc<dyn Tokenizer>,
    context_ratio: f64,
}

impl GeneratorManager {
    /// Built-in generators, configured from the environment.
    pub fn new() -> Result<Self> {
        Self::from_config(&VerbaConfig::load()?)
    }

    pub fn from_config(config: &VerbaConfig) -> Result<Self> {
        let tokenizer = tokenizer_for_model(&config.generation.tokenizer_model)?;
        let mut manager = Self::with_generators(
            builtin_generators(config)?,
            &config.generation.default,
            tokenizer,
        )?;
        manager.context_ratio = config.generation.context_ratio;
        Ok(manager)
    }

    /// Custom generator set; `default` must be one of them.
    pub fn with_generators<I>(
        generators: I,
        default: &str,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Arc<dyn Generator>)>,
    {
        Ok(Self {
            registry: StrategyRegistry::new("Generator", generators, default)?,
            tokenizer,
            context_ratio: GENERATION_CONTEXT_RATIO,
        })
    }

    pub async fn generate(
        &self,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<String> {
        let selection = self.registry.active();
        self.generate_on(&selection, queries, context, conversation)
            .await
    }

    pub async fn generate_stream(
        &self,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        let selection = self.registry.active();
        self.generate_stream_on(&selection, queries, context, conversation)
            .await
    }

    /// Like [`generate`](Self::generate) against a named generator, leaving
    /// the shared selection alone.
    pub async fn generate_with(
        &self,
        generator: &str,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<String> {
        let selection = self.registry.resolve(generator)?;
        self.generate_on(&selection, queries, context, conversation)
            .await
    }

    pub async fn generate_stream_with(
        &self,
        generator: &str,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        let selection = self.registry.resolve(generator)?;
        self.generate_stream_on(&selection, queries, context, conversation)
            .await
    }

    async fn generate_on(
        &self,
        selection: &Selection<dyn Generator>,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<String> {
        let history = self.fit_history(selection, conversation);
        selection
            .backend
            .generate(queries, context, &history)
            .await
    }

    async fn generate_stream_on(
        &self,
        selection: &Selection<dyn Generator>,
        queries: &[String],
        context: &[String],
        conversation: Option<&[ConversationItem]>,
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        let history = self.fit_history(selection, conversation);
        selection
            .backend
            .generate_stream(queries, context, &history)
            .await
    }

    fn fit_history(
        &self,
        selection: &Selection<dyn Generator>,
        conversation: Option<&[ConversationItem]>,
    ) -> Vec<ConversationItem> {
        let budget = self.budget_for(selection.backend.as_ref());
        tracing::debug!(generator = %selection.name, budget, "fitting conversation");
        self.truncate(conversation.unwrap_or_default(), budget)
    }

    fn budget_for(&self, generator: &dyn Generator) -> usize {
        (generator.context_window() as f64 * self.context_ratio) as usize
    }

    /// Token budget granted to conversation history by the active generator.
    pub fn context_budget(&self) -> usize {
        self.budget_for(self.registry.active().backend.as_ref())
    }

    /// Truncate `history` to `max_tokens` using this manager's tokenizer.
    pub fn truncate(
        &self,
        history: &[ConversationItem],
        max_tokens: usize,
    ) -> Vec<ConversationItem> {
        truncate_conversation(self.tokenizer.as_ref(), history, max_tokens)
    }

    /// Switch the active generator. Unknown names are logged and ignored.
    pub fn select(&self, name: &str) -> bool {
        self.registry.select(name)
    }

    pub fn active_name(&self) -> String {
        self.registry.active_name()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Generator>> {
        self.registry.get(name)
    }

    pub fn list(&self) -> &BTreeMap<String, Arc<dyn Generator>> {
        self.registry.list()
    }

    /// Override the share of the context window granted to history.
    pub fn with_context_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::configuration_with_context(
                "context ratio must be in (0, 1]",
                ErrorContext::new()
                    .with_field_path("generation.context_ratio")
                    .with_details(ratio.to_string()),
            ));
        }
        self.context_ratio = ratio;
        Ok(self)
    }
}

const GENERATION_CONTEXT_RATIO: f64 = 0.375;

impl std::fmt::Debug for GeneratorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorManager")
            .field("registry", &self.registry)
            .field("context_ratio", &self.context_ratio)
            .finish()
    }
}
