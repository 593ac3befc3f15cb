use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Reading unsupported config value {0}.")]
    UnknownOptionRead(String),

    #[error("Cannot set unsupported config value {0}.")]
    UnknownOptionWrite(String),

    #[error("cannot declare configurable '{0}': a config context with that name already exists")]
    ReopenedContextWithConfigurable(String),

    #[error("cannot declare config context '{0}': a configurable with that name already exists")]
    ReopenedConfigurableWithContext(String),

    #[error("config_strict_mode must be true, false or warn (got {0})")]
    InvalidStrictMode(String),

    #[error("config context '{name}' can only be assigned a table (got {found})")]
    ContextNotTable { name: String, found: &'static str },

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid TOML document: {0}")]
    InvalidToml(toml::de::Error),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),
}
