//! Delete target selection
//!
//! A delete invocation names a primary `container[/item]` plus any number of
//! extra items. Zero items removes the container, one item is a single-object
//! delete, and two or more go out as one batched request.

use crate::address::Address;
use crate::error::{Error, Result};

/// Ordered keys for one batched delete request
///
/// Duplicates are kept: delete is idempotent on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteSet {
    container: String,
    keys: Vec<String>,
}

impl BatchDeleteSet {
    /// Create a batch; an empty key list is rejected
    pub fn new(container: impl Into<String>, keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::InvalidAddress(
                "batched delete needs at least one key".into(),
            ));
        }
        Ok(Self {
            container: container.into(),
            keys,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

/// What a delete invocation removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// The container itself
    Container(String),
    /// Exactly one object
    Object(Address),
    /// Two or more objects in one request
    Batch(BatchDeleteSet),
}

/// Decide which delete primitive a request maps to
///
/// Batch order is the extra keys in argument order followed by the primary
/// item, when it has one.
pub fn plan_delete(primary: &Address, extra_keys: &[String]) -> Result<DeleteTarget> {
    primary.require_container()?;

    let item_count = extra_keys.len() + usize::from(!primary.item.is_empty());
    match item_count {
        0 => Ok(DeleteTarget::Container(primary.container.clone())),
        1 => {
            let key = extra_keys
                .first()
                .cloned()
                .unwrap_or_else(|| primary.item.clone());
            Ok(DeleteTarget::Object(primary.with_item(key)))
        }
        _ => {
            let mut keys = extra_keys.to_vec();
            if !primary.item.is_empty() {
                keys.push(primary.item.clone());
            }
            Ok(DeleteTarget::Batch(BatchDeleteSet::new(
                primary.container.clone(),
                keys,
            )?))
        }
    }
}
