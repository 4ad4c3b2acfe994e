use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::config::{self, HttpConfig};
use crate::error::{Error, ErrorContext};
use crate::transport::TransportError;
use crate::{BoxStream, Result};

/// How an API key is attached to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: token <key>` (GitHub)
    Token,
    /// Key sent verbatim in the named header.
    Header(&'static str),
}

/// Where a backend's API key comes from and how it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    pub env_var: &'static str,
    pub scheme: AuthScheme,
    /// Missing required keys fail before the request is sent.
    pub required: bool,
}

impl Credential {
    pub const fn required(env_var: &'static str, scheme: AuthScheme) -> Self {
        Self {
            env_var,
            scheme,
            required: true,
        }
    }

    pub const fn optional(env_var: &'static str, scheme: AuthScheme) -> Self {
        Self {
            env_var,
            scheme,
            required: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        credential: Option<Credential>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Attach the credential, looked up again for every request.
    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let Some(cred) = self.credential else {
            return Ok(req);
        };
        match lookup_key(cred.env_var).await {
            Some(key) => Ok(match cred.scheme {
                AuthScheme::Bearer => req.bearer_auth(key),
                AuthScheme::Token => req.header("authorization", format!("token {}", key)),
                AuthScheme::Header(name) => req.header(name, key),
            }),
            None if cred.required => Err(Error::configuration_with_context(
                format!("{} is not set", cred.env_var),
                ErrorContext::new()
                    .with_field_path(cred.env_var)
                    .with_source(self.base_url.clone()),
            )),
            None => Ok(req),
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = self
            .authorize(req)
            .await?
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(Error::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn json_body(resp: Response) -> Result<Value> {
        resp.json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let req = self.client.post(self.url(path)).json(body);
        Self::json_body(self.send(req).await?).await
    }

    pub async fn get_json(&self, path: &str, headers: &[(&str, &str)]) -> Result<Value> {
        let mut req = self.client.get(self.url(path));
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        Self::json_body(self.send(req).await?).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value> {
        let req = self
            .client
            .post(self.url(path))
            .header("accept", "application/json")
            .multipart(form);
        Self::json_body(self.send(req).await?).await
    }

    /// POST and hand back the raw response body as a byte stream.
    ///
    /// The stream owns the connection; dropping it aborts the request.
    pub async fn post_stream(&self, path: &str, body: &Value) -> Result<BoxStream<'static, Bytes>> {
        let req = self
            .client
            .post(self.url(path))
            .header("accept", "text/event-stream")
            .json(body);
        let resp = self.send(req).await?;

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}

/// Keyring access is a blocking OS call; it runs on the blocking pool.
async fn lookup_key(env_var: &'static str) -> Option<String> {
    match tokio::task::spawn_blocking(move || config::api_key(env_var)).await {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!("key lookup for {} failed: {}", env_var, e);
            None
        }
    }
}
