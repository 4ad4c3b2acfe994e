use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A loaded document, ready for chunking.
///
/// Every field is optional on the wire; absent fields deserialize empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub text: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub name: String,
    pub path: String,
    pub link: String,
    pub timestamp: String,
    /// Name of the reader that produced the document.
    pub reader: String,
    pub meta: Map<String, Value>,
}

impl Document {
    /// New document stamped with the current local time.
    pub fn new(
        text: impl Into<String>,
        doc_type: impl Into<String>,
        name: impl Into<String>,
        reader: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            doc_type: doc_type.into(),
            name: name.into(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            reader: reader.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn from_json(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let doc = Document::from_json_str(r#"{"text":"hi","type":"Blog","meta":{"k":1}}"#).unwrap();
        assert_eq!(doc.text, "hi");
        assert_eq!(doc.doc_type, "Blog");
        assert!(doc.link.is_empty());
        assert_eq!(doc.meta["k"], 1);
    }

    #[test]
    fn test_timestamp_format() {
        let doc = Document::new("t", "Documentation", "a.md", "SimpleReader");
        assert!(chrono::NaiveDateTime::parse_from_str(&doc.timestamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(doc.to_json().unwrap()["type"], "Documentation");
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        assert!(Document::from_json(serde_json::json!({"text": 5})).is_err());
    }
}
