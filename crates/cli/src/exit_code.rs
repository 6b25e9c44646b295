//! Exit code definitions for s3cli
//!
//! Scripts depend on these values; keep them stable.

use s3c_core::Error;

/// Exit codes for the s3cli application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// Store-reported, transport or local I/O failure
    GeneralError = 1,

    /// User input error: invalid arguments, malformed address, unknown profile
    UsageError = 2,

    /// Operation has no equivalent in the requested mode
    UnsupportedFeature = 7,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            7 => Some(Self::UnsupportedFeature),
            _ => None,
        }
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or address",
            Self::UnsupportedFeature => "Operation not supported in this mode",
        }
    }

    /// Exit code for an error surfaced by the core or the CLI bootstrap
    pub fn from_error(err: &anyhow::Error) -> Self {
        err.downcast_ref::<Error>()
            .and_then(|e| Self::from_i32(e.exit_code()))
            .unwrap_or(Self::GeneralError)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
