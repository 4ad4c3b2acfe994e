//! Tokenizer implementations.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tiktoken_rs::CoreBPE;

/// Supported BPE encodings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EncodingKind {
    Cl100kBase,
    O200kBase,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cl100kBase => f.write_str("cl100k_base"),
            Self::O200kBase => f.write_str("o200k_base"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    #[error("failed to load encoding {kind}")]
    LoadEncoding {
        kind: EncodingKind,
        #[source]
        source: anyhow::Error,
    },
    #[error("token slice does not decode to UTF-8")]
    Decode {
        #[source]
        source: anyhow::Error,
    },
}

pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Decode at most the first `limit` tokens.
    ///
    /// A BPE cut can land inside a multi-byte character; trailing tokens are
    /// dropped until the slice decodes, so the result never carries more than
    /// `limit` tokens.
    fn decode_prefix(&self, tokens: &[u32], limit: usize) -> String {
        let mut end = limit.min(tokens.len());
        loop {
            if let Ok(text) = self.decode(&tokens[..end]) {
                return text;
            }
            if end == 0 {
                return String::new();
            }
            end -= 1;
        }
    }
}

/// Thin wrapper around a `tiktoken_rs::CoreBPE` encoding.
#[derive(Clone)]
pub struct BpeTokenizer {
    inner: Arc<CoreBPE>,
}

impl BpeTokenizer {
    pub fn new(kind: EncodingKind) -> Result<Self, TokenizerError> {
        let loader: fn() -> anyhow::Result<CoreBPE> = match kind {
            EncodingKind::Cl100kBase => tiktoken_rs::cl100k_base,
            EncodingKind::O200kBase => tiktoken_rs::o200k_base,
        };
        let inner = loader().map_err(|source| TokenizerError::LoadEncoding { kind, source })?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Resolve the encoding an OpenAI model name maps to.
    /// Unknown models fall back to `cl100k_base`.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(inner) => Ok(Self {
                inner: Arc::new(inner),
            }),
            Err(_) => Self::new(EncodingKind::Cl100kBase),
        }
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        // Special-token markers inside user text are encoded as plain text.
        self.inner.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        self.inner
            .decode(tokens.to_vec())
            .map_err(|source| TokenizerError::Decode { source })
    }
}

impl fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BpeTokenizer {{ inner: <CoreBPE> }}")
    }
}

/// Counts every `char` as one token.
#[derive(Debug, Clone, Default)]
pub struct CharTokenizer;

impl CharTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(|c| c as u32).collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        tokens
            .iter()
            .map(|&t| {
                char::from_u32(t).ok_or_else(|| TokenizerError::Decode {
                    source: anyhow::anyhow!("invalid scalar value {t:#x}"),
                })
            })
            .collect()
    }

    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

static TOKENIZERS: once_cell::sync::Lazy<RwLock<HashMap<String, Arc<dyn Tokenizer>>>> =
    once_cell::sync::Lazy::new(|| RwLock::new(HashMap::new()));

/// Shared tokenizer for `model`; encodings are loaded once per process.
pub fn tokenizer_for_model(model: &str) -> Result<Arc<dyn Tokenizer>, TokenizerError> {
    let key = model.to_lowercase();
    {
        let cache = TOKENIZERS.read().unwrap_or_else(|e| e.into_inner());
        if let Some(tok) = cache.get(&key) {
            return Ok(tok.clone());
        }
    }
    let tok: Arc<dyn Tokenizer> = Arc::new(BpeTokenizer::for_model(&key)?);
    TOKENIZERS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(key, tok.clone());
    Ok(tok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_roundtrip() -> Result<(), TokenizerError> {
        let tok = BpeTokenizer::new(EncodingKind::Cl100kBase)?;
        let ids = tok.encode("hello world");
        assert_eq!(ids, vec![15339, 1917]);
        assert_eq!(tok.decode(&ids)?, "hello world");
        Ok(())
    }

    #[test]
    fn test_gpt35_maps_to_cl100k() -> Result<(), TokenizerError> {
        let model = BpeTokenizer::for_model("gpt-3.5-turbo")?;
        let base = BpeTokenizer::new(EncodingKind::Cl100kBase)?;
        let text = "Retrieval augmented generation";
        assert_eq!(model.encode(text), base.encode(text));
        Ok(())
    }

    #[test]
    fn test_unknown_model_falls_back() -> Result<(), TokenizerError> {
        let tok = BpeTokenizer::for_model("not-a-model")?;
        assert_eq!(tok.count("hello world"), 2);
        Ok(())
    }

    #[test]
    fn test_decode_prefix_backs_off_split_characters() -> Result<(), TokenizerError> {
        let tok = BpeTokenizer::new(EncodingKind::Cl100kBase)?;
        let text = "日本語のテキスト";
        let ids = tok.encode(text);
        for limit in 0..=ids.len() {
            let prefix = tok.decode_prefix(&ids, limit);
            assert!(text.starts_with(&prefix));
        }
        assert_eq!(tok.decode_prefix(&ids, ids.len()), text);
        Ok(())
    }

    #[test]
    fn test_char_tokenizer() {
        let tok = CharTokenizer::new();
        let ids = tok.encode("héllo");
        assert_eq!(ids.len(), 5);
        assert_eq!(tok.decode_prefix(&ids, 2), "hé");
        assert_eq!(tok.decode_prefix(&ids, 99), "héllo");
    }

    #[test]
    fn test_tokenizer_for_model_is_cached() {
        let a = tokenizer_for_model("gpt-3.5-turbo").unwrap();
        let b = tokenizer_for_model("GPT-3.5-turbo").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
