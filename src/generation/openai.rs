//! OpenAI-compatible chat completions (`/chat/completions`).
//!
//! Also serves Llama 2 through any local server exposing the same API
//! (llama.cpp server, vLLM, Ollama).

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::generation::{prompt, Generator};
use crate::transport::{decode_sse, AuthScheme, Credential, HttpTransport};
use crate::types::{ConversationItem, GenerationChunk};
use crate::{BoxStream, Result};

const CHAT_PATH: &str = "/chat/completions";

#[derive(Debug)]
pub struct OpenAiGenerator {
    name: &'static str,
    description: &'static str,
    model: String,
    context_window: usize,
    requires_env: &'static [&'static str],
    transport: HttpTransport,
}

impl OpenAiGenerator {
    pub fn gpt4(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            name: "GPT4Generator",
            description: "Generator using OpenAI's GPT-4 model",
            model: "gpt-4".to_string(),
            context_window: 8000,
            requires_env: &["OPENAI_API_KEY"],
            transport: openai_transport(config)?,
        })
    }

    pub fn gpt3(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            name: "GPT3Generator",
            description: "Generator using OpenAI's gpt-3.5-turbo model",
            model: "gpt-3.5-turbo".to_string(),
            context_window: 10000,
            requires_env: &["OPENAI_API_KEY"],
            transport: openai_transport(config)?,
        })
    }

    pub fn llama2(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            name: "Llama2Generator",
            description: "Generator using a self-hosted Llama 2 chat model",
            model: "llama2".to_string(),
            context_window: 3000,
            requires_env: &[],
            transport: HttpTransport::new(
                &config.endpoints.llama2_base_url,
                Some(Credential::optional("LLAMA2_API_KEY", AuthScheme::Bearer)),
                &config.http,
            )?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
        stream: bool,
    ) -> Value {
        json!({
            "model": self.model,
            "messages": prompt::chat_messages(queries, context, conversation),
            "temperature": 0.0,
            "stream": stream,
        })
    }
}

fn openai_transport(config: &VerbaConfig) -> Result<HttpTransport> {
    HttpTransport::new(
        &config.endpoints.openai_base_url,
        Some(Credential::required("OPENAI_API_KEY", AuthScheme::Bearer)),
        &config.http,
    )
}

/// Map one streamed `chat.completion.chunk` to a fragment.
fn chunk_from_event(event: &Value) -> GenerationChunk {
    let choice = &event["choices"][0];
    let content = choice["delta"]["content"].as_str().unwrap_or_default();
    let finished = !choice["finish_reason"].is_null();
    GenerationChunk {
        content: content.to_string(),
        finished,
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn requires_env(&self) -> &[&'static str] {
        self.requires_env
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    async fn generate(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<String> {
        let body = self.request_body(queries, context, conversation, false);
        let resp = self.transport.post_json(CHAT_PATH, &body).await?;
        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::runtime_with_context(
                    "completion carries no message content",
                    ErrorContext::new()
                        .with_field_path("choices[0].message.content")
                        .with_source(self.name),
                )
            })
    }

    async fn generate_stream(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        let body = self.request_body(queries, context, conversation, true);
        let bytes = self.transport.post_stream(CHAT_PATH, &body).await?;
        let chunks = decode_sse(bytes)
            // usage-only events carry no choice
            .filter(|event| {
                let keep = match event {
                    Ok(v) => v["choices"].get(0).is_some(),
                    Err(_) => true,
                };
                futures::future::ready(keep)
            })
            .map(|event| event.map(|v| chunk_from_event(&v)));
        Ok(Box::pin(chunks))
    }
}
