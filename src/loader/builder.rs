use std::path::Path;

use tracing::debug;

use super::document::TomlSource;
use super::source::{apply_table, ConfigSource};
use crate::config::{ConfigError, ConfigNode};

/// Builder for applying configuration sources to a [`ConfigNode`].
///
/// Sources are applied in registration order, so later sources override
/// earlier ones. Each key is written through the node's accessors: write
/// filters run, strict mode is enforced, and tables under a declared context
/// update that context key by key instead of replacing it.
///
/// ## Example
///
/// ```no_run
/// use confnode::{ConfigNode, Loader};
///
/// let mut config = ConfigNode::new();
/// config.default("port", 8080)?;
///
/// Loader::new()
///     .with_file("config/default.toml", true)
///     .with_file("config/local.toml", false)
///     .with_toml_str("port = 9090")
///     .apply(&mut config)?;
/// # Ok::<(), confnode::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "loaders do nothing until .apply() is called"]
pub struct Loader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, applying fails if the file doesn't exist.
    /// Optional files that are missing are skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(TomlSource::file(path, required))
    }

    /// Adds a TOML document held in memory.
    pub fn with_toml_str(self, contents: impl Into<String>) -> Self {
        self.with_source(TomlSource::inline(contents))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Applies every source to `node`, stopping at the first error.
    ///
    /// Keys applied before the error stay applied.
    pub fn apply(self, node: &mut ConfigNode) -> Result<(), ConfigError> {
        for source in self.sources {
            let Some(table) = source.load()? else {
                continue;
            };
            debug!(?source, keys = table.len(), "applying config source");
            apply_table(node, table)?;
        }
        Ok(())
    }
}

impl ConfigNode {
    /// Loads a TOML file into this node, as if each key were assigned
    /// through its accessor.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        Loader::new().with_file(path, true).apply(self)
    }

    /// Like [`load_file`](Self::load_file), reading the document from a string.
    pub fn load_toml_str(&mut self, contents: &str) -> Result<(), ConfigError> {
        Loader::new().with_toml_str(contents).apply(self)
    }
}
