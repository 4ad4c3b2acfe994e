//! Conversation truncation by token budget.

use crate::tokens::Tokenizer;
use crate::types::ConversationItem;

/// Keep the newest part of `history` that fits in `max_tokens`.
///
/// Messages are taken newest first. The first message that does not fit is
/// cut to its leading tokens that still fit and nothing older is kept. The
/// result is in chronological order; a history already within budget comes
/// back unchanged.
///
/// A cut that would leave zero tokens drops the message instead of keeping
/// an empty one, so `max_tokens == 0` always yields an empty history.
pub fn truncate_conversation(
    tokenizer: &dyn Tokenizer,
    history: &[ConversationItem],
    max_tokens: usize,
) -> Vec<ConversationItem> {
    let mut used = 0usize;
    let mut kept = Vec::new();

    for item in history.iter().rev() {
        let tokens = tokenizer.encode(&item.content);

        if used + tokens.len() > max_tokens {
            let remaining = max_tokens - used;
            if remaining > 0 {
                let content = tokenizer.decode_prefix(&tokens, remaining);
                kept.push(item.with_content(content));
            }
            break;
        }

        used += tokens.len();
        kept.push(item.clone());
    }

    kept.reverse();
    tracing::debug!(
        max_tokens,
        input = history.len(),
        kept = kept.len(),
        "conversation truncated"
    );
    kept
}
