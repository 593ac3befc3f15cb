//! The configuration tree: declarations, read/write dispatch and the
//! save/restore protocol.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::warn;

use super::configurable::{Configurable, Resolution};
use super::strict::{StrictLink, StrictMode};
use super::ConfigError;

/// A typed key-value store with declared options, defaults and nested contexts.
///
/// Values are resolved through a chain: an explicitly set value wins, then a
/// computed default, then a static default. Names that were never declared are
/// governed by the node's [`StrictMode`].
///
/// Only values a user actually set are kept in the store, which is what
/// [`save`](Self::save) hands back and [`restore`](Self::restore) accepts.
///
/// ## Example
///
/// ```
/// use confnode::ConfigNode;
/// use toml::Value;
///
/// let mut config = ConfigNode::new();
/// config.default("log_level", "info")?;
/// config.config_context("server")?.default("port", 8080)?;
///
/// config.context_mut("server").unwrap().set("port", 9090)?;
/// let saved = config.save(false)?;
///
/// config.reset();
/// assert_eq!(config.context_mut("server").unwrap().value("port")?, Some(Value::Integer(8080)));
///
/// config.restore(saved)?;
/// assert_eq!(config.context_mut("server").unwrap().value("port")?, Some(Value::Integer(9090)));
/// # Ok::<(), confnode::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfigNode {
    values: Table,
    configurables: BTreeMap<String, Configurable>,
    contexts: Vec<(String, ConfigNode)>,
    strict: Arc<StrictLink>,
}

/// Result of reading a name through [`ConfigNode::get`].
#[derive(Debug)]
pub enum Resolved<'a> {
    /// Nothing is set and there is no default.
    Unset,
    /// An explicit value or a resolved default.
    Value(Value),
    /// The name is a nested context.
    Context(&'a mut ConfigNode),
}

impl<'a> Resolved<'a> {
    /// Converts to a plain value. A context becomes a snapshot of its
    /// user-set state.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Resolved::Unset => None,
            Resolved::Value(value) => Some(value),
            Resolved::Context(context) => Some(Value::Table(context.user_state())),
        }
    }

    /// The context, if the name resolved to one.
    pub fn into_context(self) -> Option<&'a mut ConfigNode> {
        match self {
            Resolved::Context(context) => Some(context),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Access {
    Read,
    Write,
}

impl ConfigNode {
    /// Creates an empty root node with strict mode unset.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    fn child_of(parent: &Arc<StrictLink>) -> Self {
        Self {
            strict: StrictLink::child_of(parent),
            ..<Self as Default>::default()
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Declares an option, or returns the existing declaration.
    ///
    /// Fails if `name` is already a config context.
    pub fn configurable(&mut self, name: &str) -> Result<&mut Configurable, ConfigError> {
        if self.context_index(name).is_some() {
            return Err(ConfigError::ReopenedContextWithConfigurable(name.to_string()));
        }
        Ok(self
            .configurables
            .entry(name.to_string())
            .or_insert_with(|| Configurable::new(name)))
    }

    /// Declares `name` with a static default.
    pub fn default(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Configurable, ConfigError> {
        Ok(self.configurable(name)?.defaults_to(value))
    }

    /// Declares `name` with a default computed on every read.
    pub fn default_with<F>(
        &mut self,
        name: &str,
        computation: F,
    ) -> Result<&mut Configurable, ConfigError>
    where
        F: Fn(&mut ConfigNode) -> Result<Value, ConfigError> + Send + Sync + 'static,
    {
        Ok(self.configurable(name)?.defaults_with(computation))
    }

    /// Declares `name` with a filter applied to every written value.
    pub fn config_attr_writer<F>(
        &mut self,
        name: &str,
        filter: F,
    ) -> Result<&mut Configurable, ConfigError>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Ok(self.configurable(name)?.writes_value(filter))
    }

    /// Declares a nested context, or re-opens an existing one so more
    /// declarations can be added to it.
    ///
    /// The child inherits this node's strict mode while its own is unset.
    /// Fails if `name` is already a configurable.
    pub fn config_context(&mut self, name: &str) -> Result<&mut ConfigNode, ConfigError> {
        if self.configurables.contains_key(name) {
            return Err(ConfigError::ReopenedConfigurableWithContext(name.to_string()));
        }
        let index = match self.context_index(name) {
            Some(index) => index,
            None => {
                let child = ConfigNode::child_of(&self.strict);
                self.contexts.push((name.to_string(), child));
                self.contexts.len() - 1
            }
        };
        Ok(&mut self.contexts[index].1)
    }

    /// Evaluates a block of declarations and assignments against this node.
    pub fn configure<F>(&mut self, block: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ConfigNode) -> Result<(), ConfigError>,
    {
        block(self)
    }

    /// Whether `name` has a declared accessor (configurable or context).
    pub fn responds_to(&self, name: &str) -> bool {
        self.configurables.contains_key(name) || self.context_index(name).is_some()
    }

    /// The declared context called `name`.
    pub fn context(&self, name: &str) -> Option<&ConfigNode> {
        let index = self.context_index(name)?;
        Some(&self.contexts[index].1)
    }

    /// Mutable access to the declared context called `name`.
    pub fn context_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        let index = self.context_index(name)?;
        Some(&mut self.contexts[index].1)
    }

    /// Names of the declared contexts, in declaration order.
    pub fn context_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.contexts.iter().map(|(name, _)| name.as_str())
    }

    fn context_index(&self, name: &str) -> Option<usize> {
        self.contexts.iter().position(|(existing, _)| existing == name)
    }

    // ---------------------------------------------------------------------
    // Strict mode
    // ---------------------------------------------------------------------

    /// Effective strict mode: this node's own setting, else the nearest
    /// enclosing context's, else [`StrictMode::Off`].
    pub fn config_strict_mode(&self) -> StrictMode {
        self.strict.effective()
    }

    /// This node's own setting, if any.
    pub fn explicit_strict_mode(&self) -> Option<StrictMode> {
        self.strict.explicit()
    }

    /// Sets (or with `None`, clears) this node's strict mode.
    pub fn set_config_strict_mode(&mut self, mode: Option<StrictMode>) {
        self.strict.set(mode);
    }

    fn check_unknown(&self, name: &str, access: Access) -> Result<(), ConfigError> {
        match (self.config_strict_mode(), access) {
            (StrictMode::Off, _) => Ok(()),
            (StrictMode::Warn, Access::Read) => {
                warn!(option = name, "Reading unsupported config value {name}.");
                Ok(())
            }
            (StrictMode::Warn, Access::Write) => {
                warn!(option = name, "Setting unsupported config value {name}.");
                Ok(())
            }
            (StrictMode::On, Access::Read) => {
                Err(ConfigError::UnknownOptionRead(name.to_string()))
            }
            (StrictMode::On, Access::Write) => {
                Err(ConfigError::UnknownOptionWrite(name.to_string()))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Read/write dispatch
    // ---------------------------------------------------------------------

    /// Reads `name`: a declared option resolves through its default chain, a
    /// context is returned as-is, anything else is looked up in the store
    /// subject to strict mode.
    pub fn get(&mut self, name: &str) -> Result<Resolved<'_>, ConfigError> {
        if self.configurables.contains_key(name) {
            return Ok(match self.resolve_configurable(name)? {
                Some(value) => Resolved::Value(value),
                None => Resolved::Unset,
            });
        }
        if let Some(index) = self.context_index(name) {
            return Ok(Resolved::Context(&mut self.contexts[index].1));
        }
        self.check_unknown(name, Access::Read)?;
        Ok(match self.values.get(name) {
            Some(value) => Resolved::Value(value.clone()),
            None => Resolved::Unset,
        })
    }

    /// Reads `name` as a plain value. See [`Resolved::into_value`].
    pub fn value(&mut self, name: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.get(name)?.into_value())
    }

    /// Reads `name` and returns the stored value for in-place mutation.
    ///
    /// Container and string defaults are copied into the store on read, so
    /// they can be mutated here and the change sticks. Computed and immediate
    /// defaults are never stored and yield `None`, as do contexts.
    pub fn get_mut(&mut self, name: &str) -> Result<Option<&mut Value>, ConfigError> {
        if self.context_index(name).is_some() {
            return Ok(None);
        }
        self.get(name)?;
        Ok(self.values.get_mut(name))
    }

    fn resolve_configurable(&mut self, name: &str) -> Result<Option<Value>, ConfigError> {
        let resolution = match self.configurables.get(name) {
            Some(configurable) => configurable.get(&mut self.values),
            None => return Ok(None),
        };
        match resolution {
            Resolution::Value(value) => Ok(value),
            Resolution::Computed(computation) => computation(self).map(Some),
        }
    }

    /// Writes `name`: a declared option goes through its write filter, a
    /// context is restored from the given table, anything else is stored
    /// verbatim subject to strict mode.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        if let Some(configurable) = self.configurables.get(name) {
            configurable.set(&mut self.values, value);
            return Ok(());
        }
        if let Some(context) = self.context_mut(name) {
            return match value {
                Value::Table(table) => context.restore(table).map(|_| ()),
                other => Err(ConfigError::ContextNotTable {
                    name: name.to_string(),
                    found: other.type_str(),
                }),
            };
        }
        self.check_unknown(name, Access::Write)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Generic accessor: with no arguments reads `name`; with one argument
    /// sets it; with several, sets it to the array of all of them. Returns the
    /// value read back after any write.
    pub fn access(
        &mut self,
        name: &str,
        mut args: Vec<Value>,
    ) -> Result<Option<Value>, ConfigError> {
        match args.len() {
            0 => {}
            1 => {
                if let Some(value) = args.pop() {
                    self.set(name, value)?;
                }
            }
            _ => self.set(name, Value::Array(args))?,
        }
        self.value(name)
    }

    // ---------------------------------------------------------------------
    // Stored values
    // ---------------------------------------------------------------------

    /// Whether a value has been set for `name`. Defaults do not count.
    pub fn has_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Removes the set value for `name`, so reads fall back to the default.
    pub fn delete(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Names with a set value.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Shallow copy of the set values at this level.
    pub fn hash_dup(&self) -> Table {
        self.values.clone()
    }

    /// Clears all set values, recursively through every context.
    /// Declarations are kept.
    pub fn reset(&mut self) {
        self.values.clear();
        for (_, context) in &mut self.contexts {
            context.reset();
        }
    }

    // ---------------------------------------------------------------------
    // Save / restore
    // ---------------------------------------------------------------------

    /// Returns the set values as a nested table.
    ///
    /// With `include_defaults`, every declared option without a set value
    /// contributes its default (computed defaults are evaluated), and every
    /// context is included even when empty. Otherwise empty contexts are
    /// omitted.
    pub fn save(&mut self, include_defaults: bool) -> Result<Table, ConfigError> {
        let mut result = self.values.clone();
        let mut computed = Vec::new();
        for configurable in self.configurables.values() {
            let pending = configurable.save(&self.values, &mut result, include_defaults);
            if let Some(computation) = pending {
                computed.push((configurable.name().to_string(), computation));
            }
        }
        for (name, computation) in computed {
            let value = computation(self)?;
            result.insert(name, value);
        }
        for (name, context) in &mut self.contexts {
            let saved = context.save(include_defaults)?;
            if !saved.is_empty() || include_defaults {
                result.insert(name.clone(), Value::Table(saved));
            }
        }
        Ok(result)
    }

    /// `save(false)` without evaluating anything.
    fn user_state(&self) -> Table {
        let mut result = self.values.clone();
        for (name, context) in &self.contexts {
            let saved = context.user_state();
            if !saved.is_empty() {
                result.insert(name.clone(), Value::Table(saved));
            }
        }
        result
    }

    /// Replaces all set values with `table`: a [`reset`](Self::reset)
    /// followed by a [`merge`](Self::merge).
    pub fn restore(&mut self, table: Table) -> Result<&mut Self, ConfigError> {
        self.reset();
        self.merge(table)
    }

    /// Bulk-loads `table` into the store.
    ///
    /// Keys naming a context restore that context from the nested table.
    /// Every other key is stored verbatim, bypassing write filters and strict
    /// mode.
    pub fn merge(&mut self, table: Table) -> Result<&mut Self, ConfigError> {
        for (name, value) in table {
            match self.context_mut(&name) {
                Some(context) => match value {
                    Value::Table(nested) => {
                        context.restore(nested)?;
                    }
                    other => {
                        return Err(ConfigError::ContextNotTable {
                            found: other.type_str(),
                            name,
                        })
                    }
                },
                None => {
                    self.values.insert(name, value);
                }
            }
        }
        Ok(self)
    }

    /// Deserializes the effective configuration, defaults included.
    pub fn extract<T: DeserializeOwned>(&mut self) -> Result<T, ConfigError> {
        let value = Value::Table(self.save(true)?);
        value.try_into().map_err(ConfigError::DeserializeError)
    }
}
