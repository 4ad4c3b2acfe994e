//! Load requests and the normalized input readers receive.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DOCUMENT_TYPE: &str = "Documentation";

fn default_document_type() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

/// Load request as issued by a caller: every list is optional.
///
/// Omitted and `null` lists are treated as empty; the document type defaults
/// to `Documentation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Base64 file payloads, one per entry of `file_names`.
    #[serde(default)]
    pub bytes: Option<Vec<String>>,
    /// Raw text payloads, one per entry of `file_names`.
    #[serde(default)]
    pub contents: Option<Vec<String>>,
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    #[serde(default, rename = "fileNames", alias = "file_names")]
    pub file_names: Option<Vec<String>>,
    #[serde(default = "default_document_type")]
    pub document_type: String,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            bytes: None,
            contents: None,
            paths: None,
            file_names: None,
            document_type: default_document_type(),
        }
    }
}

impl LoadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, bytes: Vec<String>) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub fn contents(mut self, contents: Vec<String>) -> Self {
        self.contents = Some(contents);
        self
    }

    pub fn paths(mut self, paths: Vec<String>) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn file_names(mut self, file_names: Vec<String>) -> Self {
        self.file_names = Some(file_names);
        self
    }

    pub fn document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    pub fn into_input(self) -> ReaderInput {
        ReaderInput {
            bytes: self.bytes.unwrap_or_default(),
            contents: self.contents.unwrap_or_default(),
            paths: self.paths.unwrap_or_default(),
            file_names: self.file_names.unwrap_or_default(),
            document_type: self.document_type,
        }
    }
}

/// Normalized input handed to a [`Reader`](crate::reader::Reader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderInput {
    pub bytes: Vec<String>,
    pub contents: Vec<String>,
    pub paths: Vec<String>,
    pub file_names: Vec<String>,
    pub document_type: String,
}

impl Default for ReaderInput {
    fn default() -> Self {
        LoadRequest::default().into_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_normalizes_to_empty_lists() {
        let input = LoadRequest::new().into_input();
        assert!(input.bytes.is_empty());
        assert!(input.contents.is_empty());
        assert!(input.paths.is_empty());
        assert!(input.file_names.is_empty());
        assert_eq!(input.document_type, "Documentation");
    }

    #[test]
    fn test_json_nulls_and_omissions() {
        let req: LoadRequest =
            serde_json::from_str(r#"{"bytes":null,"paths":["a.pdf"],"fileNames":["a.pdf"]}"#)
                .unwrap();
        let input = req.into_input();
        assert!(input.bytes.is_empty());
        assert!(input.contents.is_empty());
        assert_eq!(input.paths, vec!["a.pdf"]);
        assert_eq!(input.document_type, DEFAULT_DOCUMENT_TYPE);
    }
}
