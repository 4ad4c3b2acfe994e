//! Strategy registry: a fixed set of named backends with one active selection.
//!
//! The backend map is built once and never changes afterwards. The active
//! selection lives in an [`ArcSwap`] cell: [`StrategyRegistry::select`] is a
//! single atomic store, and callers take one [`Selection`] snapshot per
//! request, so an in-flight call keeps the backend it started with even if
//! the selection changes underneath it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::{Error, ErrorContext};
use crate::Result;

/// Snapshot of the active backend.
pub struct Selection<B: ?Sized> {
    pub name: String,
    pub backend: Arc<B>,
}

impl<B: ?Sized> Clone for Selection<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B: ?Sized> fmt::Debug for Selection<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection").field("name", &self.name).finish()
    }
}

pub struct StrategyRegistry<B: ?Sized> {
    /// Backend family used in log lines and errors ("Generator", "Reader").
    kind: &'static str,
    backends: BTreeMap<String, Arc<B>>,
    active: ArcSwap<Selection<B>>,
}

impl<B: ?Sized> StrategyRegistry<B> {
    /// Build a registry from `(name, backend)` pairs and activate `default`.
    ///
    /// Fails on duplicate names and when `default` is not among them.
    pub fn new<I>(kind: &'static str, backends: I, default: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Arc<B>)>,
    {
        let mut map = BTreeMap::new();
        for (name, backend) in backends {
            if map.insert(name.clone(), backend).is_some() {
                return Err(Error::configuration_with_context(
                    format!("{} {} registered twice", kind, name),
                    ErrorContext::new().with_source("strategy_registry"),
                ));
            }
        }

        let backend = map.get(default).cloned().ok_or_else(|| {
            Error::configuration_with_context(
                format!("default {} {} is not registered", kind, default),
                ErrorContext::new()
                    .with_details(format!(
                        "registered: {}",
                        map.keys().cloned().collect::<Vec<_>>().join(", ")
                    ))
                    .with_source("strategy_registry"),
            )
        })?;

        Ok(Self {
            kind,
            backends: map,
            active: ArcSwap::from_pointee(Selection {
                name: default.to_string(),
                backend,
            }),
        })
    }

    /// Make `name` the active backend.
    ///
    /// Unknown names leave the selection untouched and return `false`.
    pub fn select(&self, name: &str) -> bool {
        match self.backends.get(name) {
            Some(backend) => {
                self.active.store(Arc::new(Selection {
                    name: name.to_string(),
                    backend: backend.clone(),
                }));
                tracing::info!(kind = self.kind, name, "backend selected");
                true
            }
            None => {
                tracing::warn!("{} {} not found", self.kind, name);
                false
            }
        }
    }

    pub fn active(&self) -> Arc<Selection<B>> {
        self.active.load_full()
    }

    pub fn active_name(&self) -> String {
        self.active.load().name.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<B>> {
        self.backends.get(name).cloned()
    }

    /// Look up a backend for a single call; unknown names are a configuration error.
    pub fn resolve(&self, name: &str) -> Result<Selection<B>> {
        self.get(name)
            .map(|backend| Selection {
                name: name.to_string(),
                backend,
            })
            .ok_or_else(|| {
                Error::configuration_with_context(
                    format!("{} {} not found", self.kind, name),
                    ErrorContext::new().with_source("strategy_registry"),
                )
            })
    }

    pub fn list(&self) -> &BTreeMap<String, Arc<B>> {
        &self.backends
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }
}

impl<B: ?Sized> fmt::Debug for StrategyRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kind", &self.kind)
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .field("active", &self.active_name())
            .finish()
    }
}
