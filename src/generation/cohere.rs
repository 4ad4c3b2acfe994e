//! Cohere chat (`/v1/chat`), streamed as newline-delimited JSON events.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::generation::prompt::{self, PromptRole};
use crate::generation::Generator;
use crate::transport::{decode_ndjson, AuthScheme, Credential, HttpTransport};
use crate::types::{ConversationItem, GenerationChunk};
use crate::{BoxStream, Result};

const CHAT_PATH: &str = "/v1/chat";

#[derive(Debug)]
pub struct CohereGenerator {
    model: String,
    transport: HttpTransport,
}

impl CohereGenerator {
    pub fn new(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            model: "command".to_string(),
            transport: HttpTransport::new(
                &config.endpoints.cohere_base_url,
                Some(Credential::required("COHERE_API_KEY", AuthScheme::Bearer)),
                &config.http,
            )?,
        })
    }

    fn request_body(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
        stream: bool,
    ) -> Value {
        let chat_history: Vec<Value> = prompt::history_messages(conversation)
            .into_iter()
            .map(|m| {
                let role = match m.role {
                    PromptRole::Assistant => "CHATBOT",
                    PromptRole::System => "SYSTEM",
                    PromptRole::User => "USER",
                };
                json!({ "role": role, "message": m.content })
            })
            .collect();

        json!({
            "model": self.model,
            "preamble": prompt::SYSTEM_INSTRUCTION,
            "message": prompt::query_message(queries, context),
            "chat_history": chat_history,
            "temperature": 0.0,
            "stream": stream,
        })
    }
}

/// Map a stream event; events other than text and stream end are dropped.
fn chunk_from_event(event: &Value) -> Option<GenerationChunk> {
    match event["event_type"].as_str()? {
        "text-generation" => Some(GenerationChunk::delta(
            event["text"].as_str().unwrap_or_default(),
        )),
        "stream-end" => Some(GenerationChunk::finish("")),
        _ => None,
    }
}

#[async_trait]
impl Generator for CohereGenerator {
    fn name(&self) -> &str {
        "CohereGenerator"
    }

    fn description(&self) -> &str {
        "Generator using Cohere's command model"
    }

    fn requires_env(&self) -> &[&'static str] {
        &["COHERE_API_KEY"]
    }

    fn context_window(&self) -> usize {
        3000
    }

    async fn generate(
        &self,
        queries: &[String],
        context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<String> {
        let body = self.request_body(queries, context, conversation, false);
        let resp = self.transport.post_json(CHAT_PATH, &body).await?;
        resp["text"].as_str().map(str::to_string).ok_or_else(|| {
            Error::runtime_with_context(
                "chat response carries no text",
                ErrorContext::new()
                    .with_field_path("text")
                    .with_source("CohereGenerator"),
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
        let chunks = decode_ndjson(bytes).filter_map(|event| {
            futures::future::ready(match event {
                Ok(v) => chunk_from_event(&v).map(Ok),
                Err(e) => Some(Err(e)),
            })
        });
        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_mapping() {
        assert_eq!(
            chunk_from_event(&json!({"event_type":"text-generation","text":"Hel"})),
            Some(GenerationChunk::delta("Hel"))
        );
        assert_eq!(
            chunk_from_event(&json!({"event_type":"stream-end","finish_reason":"COMPLETE"})),
            Some(GenerationChunk::finish(""))
        );
        assert_eq!(chunk_from_event(&json!({"event_type":"stream-start"})), None);
    }

    #[test]
    fn test_history_roles() {
        let g = CohereGenerator::new(&VerbaConfig::default()).unwrap();
        let history = vec![ConversationItem::user("q1"), ConversationItem::system("a1")];
        let body = g.request_body(&["q2".to_string()], &["ctx".to_string()], &history, false);
        assert_eq!(body["chat_history"][0]["role"], "USER");
        assert_eq!(body["chat_history"][1]["role"], "CHATBOT");
        assert_eq!(
            body["message"],
            "Please answer this query: 'q2' with this provided context: ctx"
        );
    }
}
