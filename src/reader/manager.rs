use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::VerbaConfig;
use crate::reader::{builtin_readers, Document, LoadRequest, Reader};
use crate::registry::StrategyRegistry;
use crate::Result;

/// Dispatches load requests to the selected [`Reader`].
#[derive(Debug)]
pub struct ReaderManager {
    registry: StrategyRegistry<dyn Reader>,
}

impl ReaderManager {
    /// Built-in readers, configured from the environment.
    pub fn new() -> Result<Self> {
        Self::from_config(&VerbaConfig::load()?)
    }

    pub fn from_config(config: &VerbaConfig) -> Result<Self> {
        Self::with_readers(builtin_readers(config)?, &config.reader.default)
    }

    /// Custom reader set; `default` must be one of them.
    pub fn with_readers<I>(readers: I, default: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Arc<dyn Reader>)>,
    {
        Ok(Self {
            registry: StrategyRegistry::new("Reader", readers, default)?,
        })
    }

    /// Load documents with the active reader.
    ///
    /// Omitted lists are passed on as empty lists; the reader's documents and
    /// errors are returned untouched.
    pub async fn load(&self, request: LoadRequest) -> Result<Vec<Document>> {
        let selection = self.registry.active();
        selection.backend.load(request.into_input()).await
    }

    /// Load with a named reader without changing the shared selection.
    pub async fn load_with(&self, reader: &str, request: LoadRequest) -> Result<Vec<Document>> {
        let selection = self.registry.resolve(reader)?;
        selection.backend.load(request.into_input()).await
    }

    pub fn select(&self, name: &str) -> bool {
        self.registry.select(name)
    }

    pub fn active_name(&self) -> String {
        self.registry.active_name()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Reader>> {
        self.registry.get(name)
    }

    pub fn list(&self) -> &BTreeMap<String, Arc<dyn Reader>> {
        self.registry.list()
    }
}
