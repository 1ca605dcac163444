//! Record addressing: namespace, set and id.

use std::fmt;

use crate::{Error, Result};

/// A namespace/set pair. Factory for [`Key`].
///
/// # Example
///
/// ```rust
/// use binstore_core::Set;
///
/// let users = Set::new("test", "users").unwrap();
/// let alice = users.key("alice").unwrap();
/// assert_eq!(alice.set(), "users");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Set {
    namespace: String,
    set: String,
}

impl Set {
    /// Create a set reference. Both components must be non-empty.
    pub fn new(namespace: impl Into<String>, set: impl Into<String>) -> Result<Self> {
        let namespace = non_empty("namespace", namespace.into())?;
        let set = non_empty("set", set.into())?;
        Ok(Self { namespace, set })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.set
    }

    /// Build the key for `id` in this set.
    pub fn key(&self, id: impl Into<String>) -> Result<Key> {
        let id = non_empty("id", id.into())?;
        Ok(Key {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            id,
        })
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.set)
    }
}

/// Uniquely addresses one record.
///
/// Equality and hashing are structural over all three components.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    namespace: String,
    set: String,
    id: String,
}

impl Key {
    /// Create a key directly. Equivalent to `Set::new(ns, set)?.key(id)`.
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self> {
        Set::new(namespace, set)?.key(id)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The set this key belongs to.
    pub fn set_ref(&self) -> Set {
        Set {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.set, self.id)
    }
}

fn non_empty(component: &str, value: String) -> Result<String> {
    if value.is_empty() {
        return Err(Error::InvalidKey {
            reason: format!("{} must not be empty", component),
        });
    }
    Ok(value)
}
