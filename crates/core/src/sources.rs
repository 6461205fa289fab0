//! Loading original sources referenced by mappings.
//!
//! An original source is looked up in the sourcemap's embedded `sourcesContent` first. Maps
//! often leave that out, so [`OriginalSources`] falls back to a [`SourceFetcher`] that loads
//! the file by name (from disk with [`DirectoryFetcher`]). Results, negative ones included, are
//! memoized per source name.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use crate::{IndexError, source_map::SourceMapBuffer, text::TextBuffer};

/// Loads an original source by name when the map does not embed it.
pub trait SourceFetcher {
    /// The text of `source`, or `None` if there is no such file.
    fn fetch(&self, source: &str) -> Result<Option<String>, IndexError>;
}

/// Configuration for [`DirectoryFetcher`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// Directory that source names are resolved against.
    pub root: PathBuf,
    /// Prefix removed from a source name before resolving it (e.g. `/js/`).
    pub strip_prefix: Option<String>,
}

/// Resolves source names to files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    config: FetchConfig,
}

impl DirectoryFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// The file `source` refers to, or `None` if the name escapes the root.
    pub fn resolve(&self, source: &str) -> Option<PathBuf> {
        let name = self
            .config
            .strip_prefix
            .as_deref()
            .and_then(|prefix| source.strip_prefix(prefix))
            .unwrap_or(source);
        let relative = Path::new(name.trim_start_matches('/'));

        let mut path = self.config.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    tracing::warn!(source = %source, "refusing source path outside the source root");
                    return None;
                }
            }
        }
        Some(path)
    }
}

impl SourceFetcher for DirectoryFetcher {
    fn fetch(&self, source: &str) -> Result<Option<String>, IndexError> {
        let Some(path) = self.resolve(source) else {
            return Ok(None);
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "original source not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Memoizing loader for the original sources of one map.
///
/// The cache is keyed by source name, so a loader is bound to the map it was created for.
pub struct OriginalSources<'a, F> {
    map: &'a SourceMapBuffer,
    fetcher: F,
    cache: HashMap<String, Option<Arc<TextBuffer>>>,
}

impl<'a, F: SourceFetcher> OriginalSources<'a, F> {
    pub fn new(map: &'a SourceMapBuffer, fetcher: F) -> Self {
        Self {
            map,
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// The indexed text of `source`: embedded in the map, else fetched by name.
    ///
    /// `Ok(None)` means neither the map nor the fetcher knows the source. Errors are not
    /// cached, so a later call retries the fetch.
    pub fn load(&mut self, source: &str) -> Result<Option<Arc<TextBuffer>>, IndexError> {
        if let Some(cached) = self.cache.get(source) {
            return Ok(cached.clone());
        }

        let contents = match self.map.source_content_for(source) {
            Some(embedded) => Some(embedded.to_owned()),
            None => self.fetcher.fetch(source)?,
        };
        let buffer = contents.map(|text| Arc::new(TextBuffer::new(text)));
        self.cache.insert(source.to_owned(), buffer.clone());
        Ok(buffer)
    }
}
