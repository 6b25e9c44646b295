//! Address parsing
//!
//! Handles splitting of combined `container/item` tokens. Every command that
//! accepts a `container[/item]` argument goes through [`split`], so list, head,
//! download, delete and upload all agree on where the container ends.

use std::path::Path;

use crate::error::{Error, Result};

/// A `container/item` pair pointing to a bucket or an object inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Bucket name
    pub container: String,
    /// Object key (empty for a container-only reference)
    pub item: String,
}

impl Address {
    /// Create a new Address
    pub fn new(container: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            item: item.into(),
        }
    }

    /// Whether this address names only a container
    pub fn is_container(&self) -> bool {
        self.item.is_empty()
    }

    /// Same container, different item
    pub fn with_item(&self, item: impl Into<String>) -> Self {
        Self {
            container: self.container.clone(),
            item: item.into(),
        }
    }

    /// Fail fast when the container is missing
    pub fn require_container(&self) -> Result<&Self> {
        if self.container.is_empty() {
            return Err(Error::InvalidAddress(
                "container name cannot be empty".into(),
            ));
        }
        Ok(self)
    }

    /// Fail fast unless both container and item are present
    pub fn require_item(&self) -> Result<&Self> {
        self.require_container()?;
        if self.item.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "'{}' has no object key. Use format: container/item",
                self.container
            )));
        }
        Ok(self)
    }

    /// Final path component of the item, used for local file names
    pub fn base_name(&self) -> Option<String> {
        base_name(&self.item)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.item.is_empty() {
            write!(f, "{}", self.container)
        } else {
            write!(f, "{}/{}", self.container, self.item)
        }
    }
}

/// Split a combined token on its last `/`
///
/// Everything before the last separator is the container, everything after
/// it is the item. A token without a separator is a container-only address.
/// This function never fails; validity is checked by the operation that
/// consumes the address.
pub fn split(token: &str) -> Address {
    match token.rfind('/') {
        Some(pos) => Address::new(&token[..pos], &token[pos + 1..]),
        None => Address::new(token, ""),
    }
}

/// Final path component of a key or local path, directories stripped
pub fn base_name(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
