//! Strict-mode policy for undeclared option names.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use toml::Value;

use super::ConfigError;

/// Policy applied when an undeclared name is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictMode {
    /// Undeclared names are accepted silently.
    Off,
    /// Undeclared names are accepted, but a warning is logged.
    Warn,
    /// Undeclared names are rejected with [`ConfigError::UnknownOptionRead`]
    /// or [`ConfigError::UnknownOptionWrite`].
    On,
}

impl StrictMode {
    fn encode(mode: Option<StrictMode>) -> u8 {
        match mode {
            None => UNSET,
            Some(StrictMode::Off) => 1,
            Some(StrictMode::Warn) => 2,
            Some(StrictMode::On) => 3,
        }
    }

    fn decode(raw: u8) -> Option<StrictMode> {
        match raw {
            1 => Some(StrictMode::Off),
            2 => Some(StrictMode::Warn),
            3 => Some(StrictMode::On),
            _ => None,
        }
    }
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictMode::Off => f.write_str("false"),
            StrictMode::Warn => f.write_str("warn"),
            StrictMode::On => f.write_str("true"),
        }
    }
}

impl From<bool> for StrictMode {
    fn from(on: bool) -> Self {
        if on {
            StrictMode::On
        } else {
            StrictMode::Off
        }
    }
}

impl FromStr for StrictMode {
    type Err = ConfigError;

    /// Accepts `true`, `false` and `warn` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("true") {
            Ok(StrictMode::On)
        } else if s.eq_ignore_ascii_case("false") {
            Ok(StrictMode::Off)
        } else if s.eq_ignore_ascii_case("warn") {
            Ok(StrictMode::Warn)
        } else {
            Err(ConfigError::InvalidStrictMode(s.to_string()))
        }
    }
}

impl TryFrom<&Value> for StrictMode {
    type Error = ConfigError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Boolean(on) => Ok(StrictMode::from(*on)),
            Value::String(s) => s.parse(),
            other => Err(ConfigError::InvalidStrictMode(other.to_string())),
        }
    }
}

const UNSET: u8 = 0;

/// One link in the strict-mode inheritance chain.
///
/// Every node owns a link; a child's link points at its parent's, so an unset
/// child resolves its parent's mode at lookup time rather than at declaration
/// time.
#[derive(Debug, Default)]
pub(crate) struct StrictLink {
    mode: AtomicU8,
    parent: Option<Arc<StrictLink>>,
}

impl StrictLink {
    pub(crate) fn child_of(parent: &Arc<StrictLink>) -> Arc<StrictLink> {
        Arc::new(StrictLink {
            mode: AtomicU8::new(UNSET),
            parent: Some(Arc::clone(parent)),
        })
    }

    pub(crate) fn explicit(&self) -> Option<StrictMode> {
        StrictMode::decode(self.mode.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, mode: Option<StrictMode>) {
        self.mode.store(StrictMode::encode(mode), Ordering::Relaxed);
    }

    /// Own mode if set, else the nearest ancestor's, else [`StrictMode::Off`].
    pub(crate) fn effective(&self) -> StrictMode {
        let mut link = self;
        loop {
            if let Some(mode) = link.explicit() {
                return mode;
            }
            match &link.parent {
                Some(parent) => link = parent,
                None => return StrictMode::Off,
            }
        }
    }
}
