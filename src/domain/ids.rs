//! Domain identifier types with validation
//!
//! Newtype wrappers for Datastore schema names. Kind and namespace names are
//! both plain strings on the wire; the wrappers keep them from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind name newtype wrapper
///
/// Identifies a schema category (the Datastore analogue of a table).
/// Case-sensitive and never empty. Names starting with `_` are reserved
/// for Datastore internals.
///
/// # Examples
///
/// ```
/// use datastore_backup::domain::ids::KindName;
/// use std::str::FromStr;
///
/// let kind = KindName::from_str("Order").unwrap();
/// assert_eq!(kind.as_str(), "Order");
/// assert!(!kind.is_reserved());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KindName(String);

impl KindName {
    /// Creates a new KindName from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(KindName)` if the name is non-empty, `Err` otherwise
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("Kind name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the kind name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this is a reserved (internal) kind, excluded from backups
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with('_')
    }
}

impl fmt::Display for KindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KindName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for KindName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Namespace name newtype wrapper
///
/// A logical partition of a Datastore instance. The empty string is the
/// default namespace.
///
/// # Examples
///
/// ```
/// use datastore_backup::domain::ids::NamespaceName;
///
/// assert!(NamespaceName::default().is_default());
/// assert!(!NamespaceName::new("tenant-a").is_default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Creates a new NamespaceName; any string, including empty, is valid
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the namespace name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this is the default (unnamed) namespace
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NamespaceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NamespaceName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
