use toml::{Table, Value};

use crate::config::{ConfigError, ConfigNode};

/// Produces a document of assignments to evaluate against a node.
///
/// `Ok(None)` means the source has nothing to contribute (an optional file
/// that doesn't exist, for instance).
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Option<Table>, ConfigError>;
}

/// Evaluates `table` against `node` as a sequence of accessor calls.
///
/// A nested table under a declared context is evaluated inside that context,
/// one key at a time. Every other key is assigned with
/// [`ConfigNode::set`], so write filters and strict mode apply exactly as
/// they would for a direct assignment.
pub fn apply_table(node: &mut ConfigNode, table: Table) -> Result<(), ConfigError> {
    for (key, value) in table {
        match value {
            Value::Table(nested) if node.context(&key).is_some() => {
                if let Some(context) = node.context_mut(&key) {
                    apply_table(context, nested)?;
                }
            }
            value => node.set(&key, value)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrictMode;
    use tracing_test::traced_test;

    fn doc(text: &str) -> Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_keys_go_through_write_filters() {
        let mut node = ConfigNode::new();
        node.config_attr_writer("test_method", |v| match v {
            Value::Integer(i) => Value::Integer(i * 1000),
            other => other,
        })
        .unwrap();

        apply_table(&mut node, doc("test_method = 99\nalpha = 'omega'")).unwrap();

        assert_eq!(node.value("test_method").unwrap(), Some(Value::Integer(99000)));
        assert_eq!(node.value("alpha").unwrap(), Some(Value::String("omega".into())));
    }

    #[test]
    fn test_context_tables_update_key_by_key() {
        let mut node = ConfigNode::new();
        node.config_context("blah").unwrap().default("x", 5).unwrap();
        node.context_mut("blah").unwrap().set("y", 1).unwrap();

        apply_table(&mut node, doc("[blah]\nx = 10")).unwrap();

        let blah = node.context_mut("blah").unwrap();
        assert_eq!(blah.value("x").unwrap(), Some(Value::Integer(10)));
        assert_eq!(blah.value("y").unwrap(), Some(Value::Integer(1)));
    }

    #[test]
    fn test_undeclared_tables_are_stored_whole() {
        let mut node = ConfigNode::new();
        apply_table(&mut node, doc("[db]\nhost = 'h'\n[db.pool]\nsize = 4")).unwrap();

        let db = node.value("db").unwrap().unwrap();
        assert_eq!(db["pool"]["size"].as_integer(), Some(4));
        assert_eq!(db["host"].as_str(), Some("h"));
    }

    #[test]
    fn test_strict_mode_reports_nested_writes_as_writes() {
        let mut node = ConfigNode::new();
        node.set_config_strict_mode(Some(StrictMode::On));

        let result = apply_table(&mut node, doc("[db]\nhost = 'h'"));
        assert!(matches!(result, Err(ConfigError::UnknownOptionWrite(ref n)) if n == "db"));
    }

    #[test]
    #[traced_test]
    fn test_warn_mode_logs_only_the_write() {
        let mut node = ConfigNode::new();
        node.set_config_strict_mode(Some(StrictMode::Warn));

        apply_table(&mut node, doc("[db]\nhost = 'h'")).unwrap();

        assert!(logs_contain("Setting unsupported config value db."));
        assert!(!logs_contain("Reading unsupported config value"));
    }

    #[test]
    fn test_context_inside_context_is_descended() {
        let mut node = ConfigNode::new();
        node.config_context("blah")
            .unwrap()
            .config_context("yarr")
            .unwrap()
            .default("y", 6)
            .unwrap();

        apply_table(&mut node, doc("[blah.yarr]\nx = 10")).unwrap();

        let yarr = node
            .context_mut("blah")
            .and_then(|blah| blah.context_mut("yarr"))
            .unwrap();
        assert_eq!(yarr.value("x").unwrap(), Some(Value::Integer(10)));
        assert_eq!(yarr.value("y").unwrap(), Some(Value::Integer(6)));
    }
}
