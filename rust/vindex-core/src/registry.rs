//! Registry of vindex factories keyed by vindex type name.
//!
//! The registry is an explicit value rather than process-wide state: it is
//! populated once during setup (for example by `vindex_lookup::register`) and
//! then handed to whatever loads the keyspace schema. Entries can be added but
//! never replaced or removed, so a registry that has been shared is effectively
//! immutable.

use std::sync::Arc;

use ahash::AHashMap;

use vindex_common::{Result, error::Error};

use crate::{VindexConfig, VindexHandle};

/// Creates a vindex instance from its name and configuration.
pub type VindexFactory = Arc<dyn Fn(&str, &VindexConfig) -> Result<VindexHandle> + Send + Sync>;

/// Maps vindex type names (e.g. `"lookup"`) to their factories.
#[derive(Clone, Default)]
pub struct Registry {
    factories: AHashMap<String, VindexFactory>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Registers `factory` under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateVindexType` if the name is already taken.
    pub fn add<F>(&mut self, type_name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&str, &VindexConfig) -> Result<VindexHandle> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            return Err(Error::duplicate_vindex_type(type_name));
        }
        log::debug!("registering vindex type '{type_name}'");
        self.factories.insert(type_name, Arc::new(factory));
        Ok(())
    }

    pub fn contains(&self, type_name: impl AsRef<str>) -> bool {
        self.factories.contains_key(type_name.as_ref())
    }

    /// Returns the registered type names in sorted order.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names = self.factories.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Instantiates a vindex of type `type_name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVindexType` if nothing is registered under `type_name`, or
    /// whatever configuration error the factory reports.
    pub fn create(
        &self,
        type_name: impl AsRef<str>,
        name: &str,
        config: &VindexConfig,
    ) -> Result<VindexHandle> {
        let type_name = type_name.as_ref();
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| Error::unknown_vindex_type(type_name))?;
        factory(name, config)
    }
}
