//! Document ingestion: the [`Reader`] contract, the built-in readers and the
//! [`ReaderManager`] that dispatches to the selected one.
//!
//! | Reader | Input | Notes |
//! |--------|-------|-------|
//! | `SimpleReader` | upload | `.txt .md .mdx .json` from bytes, contents or paths (default) |
//! | `PDFReader` | upload | text extraction through the `pdftotext` process |
//! | `GithubReader` | input | `owner/repo[/folder]`, needs `GITHUB_TOKEN` |
//! | `UnstructuredPDF` | upload | Unstructured partition API, needs `UNSTRUCTURED_API_KEY` |

mod document;
mod github;
mod manager;
mod pdf;
mod request;
mod simple;
mod unstructured;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::VerbaConfig;
use crate::error::{Error, ErrorContext};
use crate::Result;

pub use document::Document;
pub use github::GithubReader;
pub use manager::ReaderManager;
pub use pdf::PdfReader;
pub use request::{LoadRequest, ReaderInput, DEFAULT_DOCUMENT_TYPE};
pub use simple::SimpleReader;
pub use unstructured::UnstructuredPdf;

/// How the frontend collects input for a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputForm {
    /// File upload
    Upload,
    /// Free text input (e.g. a repository path)
    Input,
    /// Pre-chunked documents
    Chunks,
    /// Raw text
    Text,
}

/// Contract every ingestion backend implements.
#[async_trait]
pub trait Reader: Send + Sync + fmt::Debug {
    /// Registry name, e.g. `SimpleReader`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_form(&self) -> InputForm;

    fn requires_env(&self) -> &[&'static str] {
        &[]
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>>;
}

/// The four built-in readers, keyed by registry name.
pub fn builtin_readers(config: &VerbaConfig) -> Result<Vec<(String, Arc<dyn Reader>)>> {
    let readers: Vec<Arc<dyn Reader>> = vec![
        Arc::new(SimpleReader::new()),
        Arc::new(PdfReader::new()),
        Arc::new(GithubReader::new(config)?),
        Arc::new(UnstructuredPdf::new(config)?),
    ];
    Ok(readers
        .into_iter()
        .map(|r| (r.name().to_string(), r))
        .collect())
}

/// Lowercased extension of a file name or path.
pub(crate) fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub(crate) fn has_extension(name: &str, allowed: &[&str]) -> bool {
    extension(name).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Pair each payload with its file name; both lists must be equally long.
pub(crate) fn paired<'a>(
    reader: &str,
    field: &str,
    values: &'a [String],
    file_names: &'a [String],
) -> Result<Vec<(&'a String, &'a String)>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    if values.len() != file_names.len() {
        return Err(Error::validation_with_context(
            format!("{} entries need one file name each", field),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(format!(
                    "{} {} for {} file names",
                    values.len(),
                    field,
                    file_names.len()
                ))
                .with_source(reader),
        ));
    }
    Ok(values.iter().zip(file_names.iter()).collect())
}

/// Decode an uploaded base64 payload, with or without a `data:` URL prefix.
pub(crate) fn decode_upload(reader: &str, file_name: &str, payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| {
            Error::validation_with_context(
                "upload is not valid base64",
                ErrorContext::new()
                    .with_field_path(file_name)
                    .with_details(e.to_string())
                    .with_source(reader),
            )
        })
}
