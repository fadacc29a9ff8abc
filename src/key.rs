//! Key namespacing and the active-key convention.

use crate::error::{Error, Result};

/// Computes fully-qualified store keys and remembers the last one used.
///
/// Parameterless operations continue on the last key an explicit call resolved.
#[derive(Clone, Debug, Default)]
pub struct KeyNamespace {
    prefix: String,
    last_key: Option<String>,
}

impl KeyNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        KeyNamespace {
            prefix: prefix.into(),
            last_key: None,
        }
    }

    /// Fully-qualified key for `name`, without touching the active key.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Resolve the key for an operation.
    ///
    /// An explicit name is prefixed and becomes the active key. Without one the
    /// active key is returned.
    ///
    /// # Errors
    /// Returns `Error::NoActiveKeyError` if no name is given and no key is active.
    pub fn resolve(&mut self, explicit: Option<&str>) -> Result<String> {
        match explicit {
            Some(name) => {
                let key = self.qualify(name);
                self.last_key = Some(key.clone());
                Ok(key)
            }
            None => self.last_key.clone().ok_or(Error::NoActiveKeyError),
        }
    }

    /// Like [`resolve`](Self::resolve), but `None` instead of an error when no key is active.
    pub fn try_resolve(&mut self, explicit: Option<&str>) -> Option<String> {
        self.resolve(explicit).ok()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }
}
