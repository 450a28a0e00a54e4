//! String-keyed vindex configuration.
//!
//! Vindexes are instantiated from a flat map of option names to string values,
//! as read from the keyspace schema. [`VindexConfig`] wraps that map and provides
//! typed accessors for the few value shapes the vindexes need.

use ahash::AHashMap;

use vindex_common::{Result, error::Error};

/// A read-only set of vindex options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VindexConfig(AHashMap<String, String>);

impl VindexConfig {
    pub fn new() -> VindexConfig {
        VindexConfig(Default::default())
    }

    /// Sets an option, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> VindexConfig {
        self.set(name, value);
        self
    }

    pub fn get_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.0.get(name.as_ref()).map(String::as_str)
    }

    /// Reads a boolean option.
    ///
    /// An absent option is `false`. A present option must be exactly `"true"` or
    /// `"false"`; anything else is an invalid argument naming the option.
    pub fn get_bool(&self, name: impl AsRef<str>) -> Result<bool> {
        let name = name.as_ref();
        match self.get_str(name) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(Error::invalid_arg(
                name,
                format!("{name} value must be 'true' or 'false': '{other}'"),
            )),
        }
    }

    /// Reads a comma-separated list option, trimming whitespace around each item.
    /// Returns `None` if the option is absent.
    pub fn get_list(&self, name: impl AsRef<str>) -> Option<Vec<String>> {
        self.get_str(name)
            .map(|s| s.split(',').map(|item| item.trim().to_string()).collect())
    }
}

impl<K, V> FromIterator<(K, V)> for VindexConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        VindexConfig(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
