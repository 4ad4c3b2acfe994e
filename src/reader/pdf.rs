//! PDF reader backed by the `pdftotext` tool (poppler-utils).

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, ErrorContext};
use crate::reader::{
    decode_upload, has_extension, paired, Document, InputForm, Reader, ReaderInput,
};
use crate::Result;

const NAME: &str = "PDFReader";
const PDF_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Clone)]
pub struct PdfReader {
    program: String,
    args: Vec<String>,
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfReader {
    pub fn new() -> Self {
        Self::with_command("pdftotext", ["-layout", "-", "-"])
    }

    /// Use another extractor that reads a PDF on stdin and writes text to stdout.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Pipe a PDF through the extractor: PDF on stdin, text on stdout.
    async fn extract(&self, file_name: &str, pdf: Vec<u8>) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // stdin is written while stdout is drained.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            Error::runtime_with_context(
                "extractor stdin unavailable",
                ErrorContext::new().with_source(NAME),
            )
        })?;
        let writer = tokio::spawn(async move {
            let res = stdin.write_all(&pdf).await;
            drop(stdin);
            res
        });

        let output = child.wait_with_output().await?;
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!("{}: stdin write to {} failed: {}", NAME, self.program, e)
            }
            Err(e) => {
                tracing::debug!("{}: stdin writer for {} aborted: {}", NAME, self.program, e)
            }
        }

        if !output.status.success() {
            return Err(Error::runtime_with_context(
                format!("{} failed on {}", self.program, file_name),
                ErrorContext::new()
                    .with_field_path(file_name)
                    .with_details(String::from_utf8_lossy(&output.stderr).trim().to_string())
                    .with_source(NAME),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl Reader for PdfReader {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Imports PDF files through pdftotext"
    }

    fn input_form(&self) -> InputForm {
        InputForm::Upload
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for (payload, file_name) in paired(NAME, "bytes", &input.bytes, &input.file_names)? {
            if !has_extension(file_name, PDF_EXTENSIONS) {
                tracing::warn!("{}: {} is not a PDF, skipping", NAME, file_name);
                continue;
            }
            let pdf = decode_upload(NAME, file_name, payload)?;
            let text = self.extract(file_name, pdf).await?;
            documents.push(
                Document::new(text, &input.document_type, file_name, NAME).with_path(file_name),
            );
        }

        for path in input.paths.iter().filter(|p| !p.is_empty()) {
            if !has_extension(path, PDF_EXTENSIONS) {
                tracing::warn!("{}: {} is not a PDF, skipping", NAME, path);
                continue;
            }
            let pdf = tokio::fs::read(path).await?;
            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());
            let text = self.extract(&name, pdf).await?;
            documents.push(Document::new(text, &input.document_type, name, NAME).with_path(path));
        }

        tracing::info!("{}: loaded {} documents", NAME, documents.len());
        Ok(documents)
    }
}
