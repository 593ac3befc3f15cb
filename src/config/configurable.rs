//! Descriptor for a single declared option.

use std::fmt;
use std::sync::Arc;

use toml::{Table, Value};

use super::{ConfigError, ConfigNode};

/// Computes a default on every read that finds no explicit value.
///
/// The computation receives the node that owns the option, so it can derive its
/// result from sibling options.
pub type DefaultFn = Arc<dyn Fn(&mut ConfigNode) -> Result<Value, ConfigError> + Send + Sync>;

/// Transforms a value on its way into the store.
pub type WriteFilter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A declared option: its default and an optional write filter.
///
/// Obtained from [`ConfigNode::configurable`] and configured in chained form:
///
/// ```
/// use confnode::ConfigNode;
/// use toml::Value;
///
/// let mut node = ConfigNode::new();
/// node.configurable("attr")?
///     .defaults_to(4)
///     .writes_value(|v| match v {
///         Value::Integer(i) => Value::Integer(i * 2),
///         other => other,
///     });
///
/// assert_eq!(node.value("attr")?, Some(Value::Integer(4)));
/// node.set("attr", 5)?;
/// assert_eq!(node.value("attr")?, Some(Value::Integer(10)));
/// # Ok::<(), confnode::ConfigError>(())
/// ```
pub struct Configurable {
    name: String,
    has_default: bool,
    default_value: Option<Value>,
    default_fn: Option<DefaultFn>,
    write_filter: Option<WriteFilter>,
}

/// Outcome of resolving a read against the stored values.
pub(crate) enum Resolution {
    Value(Option<Value>),
    Computed(DefaultFn),
}

impl Configurable {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_default: false,
            default_value: None,
            default_fn: None,
            write_filter: None,
        }
    }

    /// The option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a default (static or computed) has been declared.
    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Sets a static default, replacing any earlier default.
    pub fn defaults_to(&mut self, value: impl Into<Value>) -> &mut Self {
        self.has_default = true;
        self.default_value = Some(value.into());
        self.default_fn = None;
        self
    }

    /// Declares that the option defaults to nothing.
    ///
    /// Reads without an explicit value return `None`, and the option is left
    /// out of saved state even when defaults are included.
    pub fn defaults_to_none(&mut self) -> &mut Self {
        self.has_default = true;
        self.default_value = None;
        self.default_fn = None;
        self
    }

    /// Sets a computed default, replacing any earlier default.
    ///
    /// The computation runs on every read without an explicit value; its
    /// result is never cached.
    pub fn defaults_with<F>(&mut self, computation: F) -> &mut Self
    where
        F: Fn(&mut ConfigNode) -> Result<Value, ConfigError> + Send + Sync + 'static,
    {
        self.has_default = true;
        self.default_value = None;
        self.default_fn = Some(Arc::new(computation));
        self
    }

    /// Sets the filter applied to every value written through `set`.
    pub fn writes_value<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.write_filter = Some(Arc::new(filter));
        self
    }

    /// Resolves a read.
    ///
    /// Copyable static defaults are copied into `values` on first read, so
    /// in-place changes to the returned container persist. Immediates are
    /// handed back without being stored.
    pub(crate) fn get(&self, values: &mut Table) -> Resolution {
        if let Some(value) = values.get(&self.name) {
            return Resolution::Value(Some(value.clone()));
        }
        if let Some(computation) = &self.default_fn {
            return Resolution::Computed(Arc::clone(computation));
        }
        match &self.default_value {
            Some(default) if is_copyable(default) => {
                values.insert(self.name.clone(), default.clone());
                Resolution::Value(Some(default.clone()))
            }
            Some(default) => Resolution::Value(Some(default.clone())),
            None => Resolution::Value(None),
        }
    }

    pub(crate) fn set(&self, values: &mut Table, value: Value) {
        let value = match &self.write_filter {
            Some(filter) => filter(value),
            None => value,
        };
        values.insert(self.name.clone(), value);
    }

    /// Copies the stored value (or, with `include_defaults`, the static
    /// default) into `result`. A computed default is returned for the caller
    /// to evaluate.
    pub(crate) fn save(
        &self,
        values: &Table,
        result: &mut Table,
        include_defaults: bool,
    ) -> Option<DefaultFn> {
        if let Some(value) = values.get(&self.name) {
            result.insert(self.name.clone(), value.clone());
            return None;
        }
        if !include_defaults || !self.has_default {
            return None;
        }
        if let Some(computation) = &self.default_fn {
            return Some(Arc::clone(computation));
        }
        // A default of "nothing" has no TOML representation.
        if let Some(default) = &self.default_value {
            result.insert(self.name.clone(), default.clone());
        }
        None
    }
}

impl fmt::Debug for Configurable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurable")
            .field("name", &self.name)
            .field("has_default", &self.has_default)
            .field("default_value", &self.default_value)
            .field("computed_default", &self.default_fn.is_some())
            .field("write_filter", &self.write_filter.is_some())
            .finish()
    }
}

/// Containers and strings are copied on read; immediates are not.
pub(crate) fn is_copyable(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Table(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(resolution: Resolution) -> Option<Value> {
        match resolution {
            Resolution::Value(value) => value,
            Resolution::Computed(_) => panic!("expected a plain value"),
        }
    }

    #[test]
    fn test_explicit_value_wins() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_to(4);
        let mut values = Table::new();
        values.insert("attr".into(), Value::Integer(9));

        assert_eq!(resolved(cfg.get(&mut values)), Some(Value::Integer(9)));
    }

    #[test]
    fn test_immediate_default_is_not_stored() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_to(4);
        let mut values = Table::new();

        assert_eq!(resolved(cfg.get(&mut values)), Some(Value::Integer(4)));
        assert!(values.is_empty());
    }

    #[test]
    fn test_container_default_is_copied_into_values() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_to(Value::Array(vec![]));
        let mut values = Table::new();

        assert_eq!(resolved(cfg.get(&mut values)), Some(Value::Array(vec![])));
        assert_eq!(values.get("attr"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_computed_default_is_deferred() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_with(|_| Ok(Value::Integer(8)));
        let mut values = Table::new();

        assert!(matches!(cfg.get(&mut values), Resolution::Computed(_)));
        assert!(values.is_empty());
    }

    #[test]
    fn test_last_default_wins() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_with(|_| Ok(Value::Integer(8))).defaults_to(3);
        let mut values = Table::new();

        assert_eq!(resolved(cfg.get(&mut values)), Some(Value::Integer(3)));
    }

    #[test]
    fn test_set_applies_write_filter() {
        let mut cfg = Configurable::new("attr");
        cfg.writes_value(|v| match v {
            Value::Integer(i) => Value::Integer(i * 1000),
            other => other,
        });
        let mut values = Table::new();
        cfg.set(&mut values, Value::Integer(53));

        assert_eq!(values.get("attr"), Some(&Value::Integer(53000)));
    }

    #[test]
    fn test_save_skips_defaults_unless_asked() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_to("hello");
        let values = Table::new();

        let mut result = Table::new();
        assert!(cfg.save(&values, &mut result, false).is_none());
        assert!(result.is_empty());

        assert!(cfg.save(&values, &mut result, true).is_none());
        assert_eq!(result.get("attr"), Some(&Value::String("hello".into())));
    }

    #[test]
    fn test_save_copies_stored_value_without_refiltering() {
        let mut cfg = Configurable::new("attr");
        cfg.writes_value(|_| Value::Integer(0));
        let mut values = Table::new();
        values.insert("attr".into(), Value::Integer(7));

        let mut result = Table::new();
        cfg.save(&values, &mut result, false);
        assert_eq!(result.get("attr"), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_nil_default_reads_as_none_and_is_not_saved() {
        let mut cfg = Configurable::new("attr");
        cfg.defaults_to(4).defaults_to_none();
        assert!(cfg.has_default());

        let mut values = Table::new();
        assert_eq!(resolved(cfg.get(&mut values)), None);
        assert!(values.is_empty());

        let mut result = Table::new();
        assert!(cfg.save(&values, &mut result, true).is_none());
        assert!(result.is_empty());
    }

    #[test]
    fn test_save_without_default_writes_nothing() {
        let cfg = Configurable::new("attr");
        let mut result = Table::new();
        assert!(cfg.save(&Table::new(), &mut result, true).is_none());
        assert!(result.is_empty());
    }
}
