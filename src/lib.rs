//! Hierarchical, self-describing configuration store.
//!
//! A [`ConfigNode`] holds declared options with defaults and write filters,
//! nested contexts, and a strict-mode policy for undeclared names. Only values
//! a user set are stored, so [`ConfigNode::save`] and [`ConfigNode::restore`]
//! round-trip exactly that state through a nested [`toml::Table`].
//!
//! ```
//! use confnode::ConfigNode;
//! use toml::Value;
//!
//! let mut config = ConfigNode::new();
//! config.default("x", 4)?;
//! config.default_with("attr", |c| {
//!     let x = c.value("x")?.and_then(|v| v.as_integer()).unwrap_or(0);
//!     Ok(Value::Integer(x * 2))
//! })?;
//!
//! assert_eq!(config.value("attr")?, Some(Value::Integer(8)));
//! config.set("x", 2)?;
//! assert_eq!(config.value("attr")?, Some(Value::Integer(4)));
//! # Ok::<(), confnode::ConfigError>(())
//! ```

pub mod config;
pub mod loader;

pub use config::{ConfigError, ConfigNode, Configurable, Resolved, StrictMode};
pub use loader::Loader;
