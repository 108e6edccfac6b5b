//! Resource loaders.
//!
//! A loader turns a resolved locator into the raw bytes of a resource. It
//! knows nothing about what the bytes mean; that is the job of the
//! [`ContentInterpreter`](super::ContentInterpreter) chain.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;
use url::Url;

use crate::multires::error::LoadError;

/// Fetches resource bytes by locator.
pub trait ResourceLoader: Send + Sync {
    /// Load the bytes behind `locator`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::UnsupportedScheme` for schemes this loader does not
    /// serve, `LoadError::NotFound` for missing resources, and
    /// `LoadError::Io` for read failures.
    fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError>;
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Arc<L> {
    fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        (**self).load(locator)
    }
}

/// Loads `file:` URLs from the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    fn path_for(locator: &Url) -> Result<PathBuf, LoadError> {
        if locator.scheme() != "file" {
            return Err(LoadError::UnsupportedScheme(locator.scheme().to_string()));
        }
        locator
            .to_file_path()
            .map_err(|_| LoadError::NotFound(locator.to_string()))
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        let path = Self::path_for(locator)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                trace!(path = %path.display(), bytes = bytes.len(), "Loaded file resource");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LoadError::NotFound(locator.to_string()))
            }
            Err(e) => Err(LoadError::Io(e)),
        }
    }
}

/// In-memory resources keyed by locator.
///
/// Fragments are ignored for lookup, so `mem:/a.svg#part` finds the bytes
/// registered for `mem:/a.svg`. Any scheme is accepted.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    entries: DashMap<String, Arc<[u8]>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(locator: &Url) -> String {
        let mut key = locator.clone();
        key.set_fragment(None);
        key.into()
    }

    /// Register (or replace) the bytes for `locator`.
    pub fn insert(&self, locator: &Url, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(Self::key(locator), bytes.into());
    }

    /// Remove the bytes for `locator`, returning whether anything was there.
    pub fn remove(&self, locator: &Url) -> bool {
        self.entries.remove(&Self::key(locator)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        self.entries
            .get(&Self::key(locator))
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| LoadError::NotFound(locator.to_string()))
    }
}

/// Tries a list of loaders in order.
///
/// A loader that reports `UnsupportedScheme` or `NotFound` passes the request
/// on to the next one. Any other error stops the chain.
#[derive(Default)]
pub struct FallbackLoader {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl FallbackLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loader to the end of the chain.
    pub fn with(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl ResourceLoader for FallbackLoader {
    fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        let mut last = LoadError::UnsupportedScheme(locator.scheme().to_string());
        for loader in &self.loaders {
            match loader.load(locator) {
                Ok(bytes) => return Ok(bytes),
                Err(e @ (LoadError::UnsupportedScheme(_) | LoadError::NotFound(_))) => last = e,
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }
}
