//! Prompt assembly shared by the built-in generators.

use serde::Serialize;

use crate::types::{ConversationItem, ConversationKind};

pub const SYSTEM_INSTRUCTION: &str = "You are a Retrieval Augmented Generation chatbot. \
Answer user queries using only the provided context. \
If the provided documentation does not contain enough information to answer, say so. \
When the answer needs code, wrap it in a fenced block tagged with the programming language. \
Do not write pseudo-code.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Final user turn carrying the queries and the retrieved context.
pub fn query_message(queries: &[String], context: &[String]) -> String {
    format!(
        "Please answer this query: '{}' with this provided context: {}",
        queries.join(" "),
        context.join(" ")
    )
}

/// Past turns as prompt messages; previous answers become assistant turns.
pub fn history_messages(conversation: &[ConversationItem]) -> Vec<PromptMessage> {
    conversation
        .iter()
        .map(|item| {
            let role = match item.kind {
                ConversationKind::User => PromptRole::User,
                ConversationKind::System => PromptRole::Assistant,
            };
            PromptMessage::new(role, item.content.clone())
        })
        .collect()
}

/// System instruction, history, then the query turn.
pub fn chat_messages(
    queries: &[String],
    context: &[String],
    conversation: &[ConversationItem],
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(conversation.len() + 2);
    messages.push(PromptMessage::new(PromptRole::System, SYSTEM_INSTRUCTION));
    messages.extend(history_messages(conversation));
    messages.push(PromptMessage::new(
        PromptRole::User,
        query_message(queries, context),
    ));
    messages
}
