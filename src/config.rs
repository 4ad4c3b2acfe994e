//! Runtime configuration: YAML file plus environment overrides.
//!
//! ```yaml
//! generation:
//!   default: GPT4Generator
//! reader:
//!   github_branch: develop
//! endpoints:
//!   llama2_base_url: http://gpu-box:8080/v1
//! http:
//!   timeout_secs: 60
//! ```

use std::env;
use std::path::Path;

use keyring::Entry;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorContext};
use crate::Result;

/// Keyring service name used when resolving API keys.
pub const KEYRING_SERVICE: &str = "verba";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbaConfig {
    pub generation: GenerationConfig,
    pub reader: ReaderConfig,
    pub endpoints: EndpointsConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generator selected when the manager is created.
    pub default: String,
    /// Share of a generator's context window granted to conversation history.
    pub context_ratio: f64,
    /// Model whose encoding measures conversation history.
    pub tokenizer_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default: "GPT3Generator".to_string(),
            context_ratio: 0.375,
            tokenizer_model: "gpt-3.5-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub default: String,
    pub github_branch: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            default: "SimpleReader".to_string(),
            github_branch: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub openai_base_url: String,
    pub cohere_base_url: String,
    pub llama2_base_url: String,
    pub github_api_url: String,
    pub unstructured_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            cohere_base_url: "https://api.cohere.ai".to_string(),
            llama2_base_url: "http://localhost:8080/v1".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            unstructured_url: "https://api.unstructured.io/general/v0/general".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl VerbaConfig {
    /// Load from `$VERBA_CONFIG` (when set) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var("VERBA_CONFIG") {
            Ok(path) => Self::from_path(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.generation.default, "VERBA_GENERATOR");
        override_from_env(&mut self.reader.default, "VERBA_READER");
        override_from_env(&mut self.endpoints.openai_base_url, "OPENAI_BASE_URL");
        override_from_env(&mut self.endpoints.cohere_base_url, "COHERE_BASE_URL");
        override_from_env(&mut self.endpoints.llama2_base_url, "LLAMA2_BASE_URL");
        override_from_env(&mut self.endpoints.github_api_url, "GITHUB_API_URL");
        override_from_env(&mut self.endpoints.unstructured_url, "UNSTRUCTURED_API_URL");
        if let Some(secs) = env::var("VERBA_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http.timeout_secs = secs;
        }
    }

    fn validate(&self) -> Result<()> {
        let ratio = self.generation.context_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::configuration_with_context(
                "context ratio must be in (0, 1]",
                ErrorContext::new()
                    .with_field_path("generation.context_ratio")
                    .with_details(ratio.to_string()),
            ));
        }
        Ok(())
    }
}

fn override_from_env(slot: &mut String, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.trim().is_empty() {
            *slot = value;
        }
    }
}

/// Resolve an API key: OS keyring entry first, then the environment variable.
pub fn api_key(var: &str) -> Option<String> {
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, var) {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }
    env::var(var).ok().filter(|v| !v.is_empty())
}
