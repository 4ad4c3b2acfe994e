//! Plain-text reader for `.txt`, `.md`, `.mdx` and `.json` files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{Error, ErrorContext};
use crate::reader::{
    decode_upload, extension, has_extension, paired, Document, InputForm, Reader, ReaderInput,
};
use crate::Result;

const NAME: &str = "SimpleReader";
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "mdx", "json"];

/// Reads text uploads, raw contents and local files or directories.
///
/// `.json` payloads are parsed as serialized [`Document`]s; everything else
/// becomes a document holding the file text.
#[derive(Debug, Clone, Default)]
pub struct SimpleReader;

impl SimpleReader {
    pub fn new() -> Self {
        Self
    }

    fn document(&self, text: String, name: &str, path: &str, doc_type: &str) -> Result<Document> {
        if extension(name).as_deref() == Some("json") {
            return Document::from_json_str(&text);
        }
        Ok(Document::new(text, doc_type, name, NAME).with_path(path))
    }

    async fn load_path(&self, path: &str, doc_type: &str, out: &mut Vec<Document>) -> Result<()> {
        let root = PathBuf::from(path);
        if !root.exists() {
            tracing::warn!("{}: path {} does not exist, skipping", NAME, path);
            return Ok(());
        }

        let files = if root.is_dir() {
            text_files_under(root).await?
        } else if has_extension(path, TEXT_EXTENSIONS) {
            vec![root]
        } else {
            tracing::warn!("{}: unsupported file {}, skipping", NAME, path);
            return Ok(());
        };

        for file in files {
            let text = tokio::fs::read_to_string(&file).await?;
            let display = file.to_string_lossy().to_string();
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| display.clone());
            out.push(self.document(text, &name, &display, doc_type)?);
        }
        Ok(())
    }
}

async fn text_files_under(root: PathBuf) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || {
        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| is_text_file(p))
            .collect();
        files.sort();
        files
    })
    .await
    .map_err(|e| {
        Error::runtime_with_context(
            "directory walk failed",
            ErrorContext::new().with_details(e.to_string()).with_source(NAME),
        )
    })
}

fn is_text_file(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|p| has_extension(p, TEXT_EXTENSIONS))
}

fn utf8(file_name: &str, raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| {
        Error::validation_with_context(
            "upload is not UTF-8 text",
            ErrorContext::new()
                .with_field_path(file_name)
                .with_details(e.to_string())
                .with_source(NAME),
        )
    })
}

#[async_trait]
impl Reader for SimpleReader {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Imports plain text, Markdown and Verba JSON files"
    }

    fn input_form(&self) -> InputForm {
        InputForm::Upload
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for (payload, file_name) in paired(NAME, "bytes", &input.bytes, &input.file_names)? {
            if !has_extension(file_name, TEXT_EXTENSIONS) {
                tracing::warn!("{}: unsupported file {}, skipping", NAME, file_name);
                continue;
            }
            let text = utf8(file_name, decode_upload(NAME, file_name, payload)?)?;
            documents.push(self.document(text, file_name, file_name, &input.document_type)?);
        }

        for (content, file_name) in paired(NAME, "contents", &input.contents, &input.file_names)? {
            if !has_extension(file_name, TEXT_EXTENSIONS) {
                tracing::warn!("{}: unsupported file {}, skipping", NAME, file_name);
                continue;
            }
            documents.push(self.document(
                content.clone(),
                file_name,
                file_name,
                &input.document_type,
            )?);
        }

        for path in input.paths.iter().filter(|p| !p.is_empty()) {
            self.load_path(path, &input.document_type, &mut documents)
                .await?;
        }

        tracing::info!("{}: loaded {} documents", NAME, documents.len());
        Ok(documents)
    }
}
