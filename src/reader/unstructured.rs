//! PDF import through the Unstructured partition API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::reader::{
    decode_upload, has_extension, paired, Document, InputForm, Reader, ReaderInput,
};
use crate::transport::{AuthScheme, Credential, HttpTransport, TransportError};
use crate::Result;

const NAME: &str = "UnstructuredPDF";
const PDF_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug)]
pub struct UnstructuredPdf {
    transport: HttpTransport,
}

impl UnstructuredPdf {
    pub fn new(config: &VerbaConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(
                &config.endpoints.unstructured_url,
                Some(Credential::required(
                    "UNSTRUCTURED_API_KEY",
                    AuthScheme::Header("unstructured-api-key"),
                )),
                &config.http,
            )?,
        })
    }

    async fn partition(&self, file_name: &str, pdf: Vec<u8>) -> Result<String> {
        let part = Part::bytes(pdf)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let form = Form::new().text("strategy", "auto").part("files", part);

        let elements = self.transport.post_multipart("", form).await?;
        join_elements(&elements, file_name)
    }
}

/// Concatenate the `text` of every returned element.
fn join_elements(elements: &Value, file_name: &str) -> Result<String> {
    let items = elements.as_array().ok_or_else(|| {
        Error::validation_with_context(
            "partition response is not an element list",
            ErrorContext::new()
                .with_field_path(file_name)
                .with_source(NAME),
        )
    })?;
    Ok(items
        .iter()
        .filter_map(|e| e["text"].as_str())
        .collect::<Vec<_>>()
        .join(" "))
}

#[async_trait]
impl Reader for UnstructuredPdf {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Imports PDF files through the Unstructured API"
    }

    fn input_form(&self) -> InputForm {
        InputForm::Upload
    }

    fn requires_env(&self) -> &[&'static str] {
        &["UNSTRUCTURED_API_KEY"]
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for (payload, file_name) in paired(NAME, "bytes", &input.bytes, &input.file_names)? {
            if !has_extension(file_name, PDF_EXTENSIONS) {
                tracing::warn!("{}: {} is not a PDF, skipping", NAME, file_name);
                continue;
            }
            let text = self
                .partition(file_name, decode_upload(NAME, file_name, payload)?)
                .await?;
            documents.push(
                Document::new(text, &input.document_type, file_name, NAME).with_path(file_name),
            );
        }

        for path in input.paths.iter().filter(|p| !p.is_empty()) {
            if !has_extension(path, PDF_EXTENSIONS) {
                tracing::warn!("{}: {} is not a PDF, skipping", NAME, path);
                continue;
            }
            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());
            let text = self.partition(&name, tokio::fs::read(path).await?).await?;
            documents.push(Document::new(text, &input.document_type, name, NAME).with_path(path));
        }

        tracing::info!("{}: loaded {} documents", NAME, documents.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_elements() {
        let elements = serde_json::json!([
            {"type": "Title", "text": "Intro"},
            {"type": "Image"},
            {"type": "NarrativeText", "text": "Body text."}
        ]);
        assert_eq!(join_elements(&elements, "a.pdf").unwrap(), "Intro Body text.");
        assert!(join_elements(&serde_json::json!({"detail": "x"}), "a.pdf").is_err());
    }
}
