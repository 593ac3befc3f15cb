//! The configuration-resolution engine.

mod configurable;
mod error;
mod node;
mod strict;

pub use configurable::{Configurable, DefaultFn, WriteFilter};
pub use error::ConfigError;
pub use node::{ConfigNode, Resolved};
pub use strict::StrictMode;
