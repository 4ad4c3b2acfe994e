//! Recording backends shared by the manager tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use verba_components::reader::InputForm;
use verba_components::{
    BoxStream, ConversationItem, Document, Error, GenerationChunk, Generator, Reader,
    ReaderInput, Result,
};

/// Generator that records the history it receives and answers with its name.
#[derive(Debug)]
pub struct RecordingGenerator {
    pub name: String,
    pub window: usize,
    pub seen: Mutex<Vec<Vec<ConversationItem>>>,
    pub fail_with: Option<u16>,
}

impl RecordingGenerator {
    pub fn new(name: &str, window: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            window,
            seen: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    pub fn failing(name: &str, status: u16) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            window: 100,
            seen: Mutex::new(Vec::new()),
            fail_with: Some(status),
        })
    }

    pub fn last_seen(&self) -> Vec<ConversationItem> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records calls"
    }

    fn context_window(&self) -> usize {
        self.window
    }

    async fn generate(
        &self,
        queries: &[String],
        _context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<String> {
        self.seen.lock().unwrap().push(conversation.to_vec());
        if let Some(status) = self.fail_with {
            return Err(Error::Remote {
                status,
                message: "upstream rejected".into(),
            });
        }
        Ok(format!("{}:{}", self.name, queries.join(",")))
    }

    async fn generate_stream(
        &self,
        _queries: &[String],
        _context: &[String],
        conversation: &[ConversationItem],
    ) -> Result<BoxStream<'static, GenerationChunk>> {
        self.seen.lock().unwrap().push(conversation.to_vec());
        Ok(Box::pin(stream::iter(vec![
            Ok(GenerationChunk::delta("Hel")),
            Ok(GenerationChunk::delta("lo")),
            Ok(GenerationChunk::finish("")),
        ])))
    }
}

/// Reader that records its input and returns one document per call.
#[derive(Debug)]
pub struct RecordingReader {
    pub name: String,
    pub seen: Mutex<Vec<ReaderInput>>,
}

impl RecordingReader {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn last_seen(&self) -> Option<ReaderInput> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Reader for RecordingReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records calls"
    }

    fn input_form(&self) -> InputForm {
        InputForm::Upload
    }

    async fn load(&self, input: ReaderInput) -> Result<Vec<Document>> {
        if input.paths.iter().any(|p| p == "broken") {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "broken",
            )));
        }
        self.seen.lock().unwrap().push(input.clone());
        Ok(vec![Document::new(
            "loaded",
            input.document_type,
            "doc",
            self.name.clone(),
        )])
    }
}
