//! s3c-core: Core library for the s3cli object store client
//!
//! This crate provides the core functionality for s3cli, including:
//! - Address splitting for `container/item` tokens
//! - The resolved `Command` model
//! - Configuration and profile management
//! - ObjectStore and ChunkedUpload traits for S3 operations
//! - The façade that routes commands to store operations
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod address;
pub mod command;
pub mod config;
pub mod error;
pub mod facade;
pub mod profile;
pub mod traits;

pub use address::{Address, split};
pub use command::{Command, Presign};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use facade::{Console, Facade, FacadeOptions, HiddenStatus, StatusLine};
pub use profile::{Profile, ProfileManager};
pub use traits::{
    ChunkedUpload, ChunkedUploadRequest, ListOptions, ListResult, ObjectBody, ObjectStore,
    PresignMethod, PutOptions, TransferProgress, TransferState,
};
