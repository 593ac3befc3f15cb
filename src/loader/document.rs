//! TOML documents as configuration sources.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use toml::Table;
use tracing::debug;

use super::source::ConfigSource;
use crate::config::ConfigError;

#[derive(Debug, Clone)]
enum Origin {
    File { path: PathBuf, required: bool },
    Inline(String),
}

/// A TOML document read from a file or held in memory.
#[derive(Debug, Clone)]
pub struct TomlSource {
    origin: Origin,
}

impl TomlSource {
    /// A document on disk. A missing optional file contributes nothing.
    pub fn file(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            origin: Origin::File {
                path: path.as_ref().to_path_buf(),
                required,
            },
        }
    }

    /// A document given as text.
    pub fn inline(contents: impl Into<String>) -> Self {
        Self {
            origin: Origin::Inline(contents.into()),
        }
    }
}

impl ConfigSource for TomlSource {
    fn load(&self) -> Result<Option<Table>, ConfigError> {
        match &self.origin {
            Origin::Inline(contents) => contents
                .parse::<Table>()
                .map(Some)
                .map_err(ConfigError::InvalidToml),
            Origin::File { path, required } => {
                let contents = match std::fs::read_to_string(path) {
                    Ok(contents) => contents,
                    Err(e) if e.kind() == ErrorKind::NotFound && !required => {
                        debug!(path = %path.display(), "optional config file not found, skipping");
                        return Ok(None);
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        return Err(ConfigError::FileNotFound(path.clone()));
                    }
                    Err(source) => {
                        return Err(ConfigError::ReadError {
                            path: path.clone(),
                            source,
                        })
                    }
                };
                contents
                    .parse::<Table>()
                    .map(Some)
                    .map_err(|source| ConfigError::ParseError {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use toml::Value;

    #[test]
    fn test_file_is_parsed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alpha = 'omega'\n[blah]\nx = 10").unwrap();

        let table = TomlSource::file(file.path(), true).load().unwrap().unwrap();
        assert_eq!(table["alpha"], Value::String("omega".into()));
        assert_eq!(table["blah"]["x"], Value::Integer(10));
    }

    #[test]
    fn test_missing_required_file() {
        let result = TomlSource::file("/tmp/timmytimmytimmy", true).load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(ref p)) if p.ends_with("timmytimmytimmy")));
    }

    #[test]
    fn test_missing_optional_file() {
        let result = TomlSource::file("/tmp/timmytimmytimmy", false).load().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_file_syntax_error_keeps_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "@#asdf").unwrap();

        let result = TomlSource::file(file.path(), true).load();
        assert!(matches!(result, Err(ConfigError::ParseError { ref path, .. }) if path == file.path()));
    }

    #[test]
    fn test_inline_document() {
        let table = TomlSource::inline("x = 1").load().unwrap().unwrap();
        assert_eq!(table["x"], Value::Integer(1));

        let result = TomlSource::inline("@#asdf").load();
        assert!(matches!(result, Err(ConfigError::InvalidToml(_))));
    }
}
