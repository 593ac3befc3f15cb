//! Applying TOML documents to a [`ConfigNode`](crate::ConfigNode).

mod builder;
mod document;
mod source;

pub use builder::Loader;
pub use document::TomlSource;
pub use source::{apply_table, ConfigSource};
