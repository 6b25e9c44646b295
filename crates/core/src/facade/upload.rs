//! Upload destination planning
//!
//! No files means inline content for one key. One file uploads under the
//! given key, or under its base name when the key is empty. Several files
//! switch to prefix mode: the key part of the address is prepended verbatim
//! to each file's base name.

use std::path::{Path, PathBuf};

use crate::address::{Address, base_name};
use crate::error::{Error, Result};

/// One object to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub address: Address,
    /// Source file; `None` for inline content
    pub file: Option<PathBuf>,
}

/// Resolve the destination of every upload in argument order
pub fn plan_upload(target: &Address, files: &[PathBuf]) -> Result<Vec<UploadTarget>> {
    target.require_container()?;

    match files {
        [] => {
            target.require_item()?;
            Ok(vec![UploadTarget {
                address: target.clone(),
                file: None,
            }])
        }
        [file] => {
            let item = if target.item.is_empty() {
                file_base_name(file)?
            } else {
                target.item.clone()
            };
            Ok(vec![UploadTarget {
                address: target.with_item(item),
                file: Some(file.clone()),
            }])
        }
        files => files
            .iter()
            .map(|file| {
                let key = format!("{}{}", target.item, file_base_name(file)?);
                Ok(UploadTarget {
                    address: target.with_item(key),
                    file: Some(file.clone()),
                })
            })
            .collect(),
    }
}

fn file_base_name(file: &Path) -> Result<String> {
    base_name(file).ok_or_else(|| {
        Error::InvalidAddress(format!(
            "cannot derive an object key from '{}'",
            file.display()
        ))
    })
}
