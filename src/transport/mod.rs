//! HTTP plumbing shared by the built-in backends.

mod http;
mod sse;

pub use http::{AuthScheme, Credential, HttpTransport};
pub use sse::{decode_ndjson, decode_sse};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
