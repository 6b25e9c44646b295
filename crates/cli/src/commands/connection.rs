//! Connection settings
//!
//! Picks the active profile from the configuration file and applies the
//! per-field overrides given on the command line or in the environment.

use clap::Args;
use s3c_core::profile::DEFAULT_PROFILE;
use s3c_core::{Error, Profile, ProfileManager, Result};

/// Global connection flags
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Profile from the configuration file
    #[arg(long, global = true, env = "S3CLI_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// S3 endpoint URL, overrides the profile
    #[arg(long, global = true, env = "S3CLI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Access key ID, overrides the profile
    #[arg(long, global = true, env = "S3CLI_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret access key, overrides the profile
    #[arg(long, global = true, env = "S3CLI_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Region, overrides the profile
    #[arg(long, global = true, env = "S3CLI_REGION")]
    pub region: Option<String>,
}

/// How the active profile was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Read from the configuration file
    Configured(Profile),
    /// Built from flags alone because the named profile does not exist
    Adhoc(Profile),
}

impl Resolved {
    pub fn into_profile(self) -> Profile {
        match self {
            Resolved::Configured(profile) | Resolved::Adhoc(profile) => profile,
        }
    }
}

impl ConnectionArgs {
    /// Resolve the profile and apply overrides
    ///
    /// A missing profile is only acceptable when `--endpoint` is given.
    pub fn resolve(&self, profiles: &ProfileManager) -> Result<Resolved> {
        let resolved = match profiles.get(&self.profile) {
            Ok(profile) => Resolved::Configured(self.apply(profile)),
            Err(Error::ProfileNotFound(_)) if self.endpoint.is_some() => {
                Resolved::Adhoc(self.apply(Profile::new(&self.profile, "", "", "")))
            }
            Err(e) => return Err(e),
        };
        Ok(resolved)
    }

    fn apply(&self, mut profile: Profile) -> Profile {
        if let Some(endpoint) = &self.endpoint {
            profile.endpoint = endpoint.clone();
        }
        if let Some(access_key) = &self.access_key {
            profile.access_key = access_key.clone();
        }
        if let Some(secret_key) = &self.secret_key {
            profile.secret_key = secret_key.clone();
        }
        if let Some(region) = &self.region {
            profile.region = region.clone();
        }
        profile
    }
}
