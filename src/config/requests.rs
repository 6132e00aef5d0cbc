//! Deriving package request lists from a merged configuration.

use super::model::Configuration;
use super::types::ProfileSpec;
use crate::error::{LaunchError, Result};

/// Package requests for `profile`, in package mapping order.
///
/// Excluded packages are left out; the surviving requests keep their
/// relative order.
pub fn package_requests(config: &Configuration, profile: &str) -> Result<Vec<String>> {
    let spec = config
        .profile(profile)
        .ok_or_else(|| LaunchError::UnknownProfile {
            profile: profile.to_string(),
            available: config.profile_names(),
        })?;

    Ok(spec.requests())
}

impl ProfileSpec {
    /// Request strings for every non-excluded package of this profile.
    pub fn requests(&self) -> Vec<String> {
        self.packages
            .iter()
            .filter_map(|(package, version)| version.request_for(package))
            .collect()
    }
}
