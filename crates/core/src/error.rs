//! Error types for s3c-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for s3c-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3c-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or incomplete `container/item` address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Profile not found in the configuration file
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission failure reported by the store
    #[error("Access denied: {0}")]
    Auth(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store understood the request but refused or failed it
    #[error("{0}")]
    Service(String),

    /// The store could not be reached or its response could not be parsed
    #[error("Network error: {0}")]
    Network(String),

    /// Operation has no equivalent in the requested mode
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidAddress(_) => 2,     // UsageError
            Error::Config(_) => 2,             // UsageError
            Error::ProfileNotFound(_) => 2,    // UsageError
            Error::InvalidUrl(_) => 2,         // UsageError
            Error::UnsupportedFeature(_) => 7, // UnsupportedFeature
            _ => 1,                            // GeneralError
        }
    }

    /// Whether the failure happened before the store could answer
    pub const fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
