//! Environment sessions.
//!
//! An [`EnvironmentSession`] resolves a profile's package requests into an
//! activated environment context and runs commands inside it.
//!
//! Resolution happens once, at construction. When patch packages are given
//! the first context is used only to compute the patched request, and the
//! session keeps the re-resolved context instead:
//!
//! ```text
//! resolve(requests) ──► Resolved ──(patch_packages)──► PatchResolved
//! ```

mod command;
mod process;

#[cfg(test)]
mod tests;

pub use command::CommandLine;
pub use process::{LaunchedProcess, RunOutput};

use crate::config::{Configuration, package_requests};
use crate::context::LaunchContext;
use crate::error::{LaunchError, Result};
use crate::resolver::{PackageResolver, Resolution, ResolveRequest, ResolvedContext};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Options for [`EnvironmentSession::new`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Search the local package repository first.
    pub use_local_packages: bool,

    /// Additional package repositories, searched after the configured ones.
    pub extra_package_paths: Vec<PathBuf>,

    /// Requests laid over the resolved context, triggering a re-resolve.
    pub patch_packages: Vec<String>,

    /// Ignore packages released after this time.
    ///
    /// Falls back to `_resolve_settings.timestamp` from the configuration.
    pub resolve_timestamp: Option<DateTime<Utc>>,

    /// Pre-built configuration. When unset it is resolved from the launch context.
    pub config: Option<Configuration>,
}

/// Which resolution is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The profile's own request list was resolved.
    Resolved,
    /// The context was re-resolved from a patched request list.
    PatchResolved,
}

/// A profile resolved into an environment context.
#[derive(Debug)]
pub struct EnvironmentSession<C> {
    profile: String,
    config: Configuration,
    requests: Vec<String>,
    package_paths: Vec<PathBuf>,
    context: C,
    state: SessionState,
}

impl<C: ResolvedContext> EnvironmentSession<C> {
    /// Resolve `profile` into an environment.
    ///
    /// # Arguments
    ///
    /// * `profile` - Profile name in the merged configuration
    /// * `options` - Session options
    /// * `resolver` - The package resolver to use
    /// * `launch` - Config location and project/department selection
    ///
    /// # Returns
    ///
    /// * `Ok(EnvironmentSession)` - The resolved session
    /// * `Err(LaunchError::UnknownProfile)` - The profile is not configured
    /// * `Err(LaunchError::EnvironmentResolution)` - The resolver could not satisfy the request
    pub fn new<R>(
        profile: impl Into<String>,
        options: SessionOptions,
        resolver: &R,
        launch: &LaunchContext,
    ) -> Result<Self>
    where
        R: PackageResolver<Context = C>,
    {
        let profile = profile.into();
        let SessionOptions {
            use_local_packages,
            extra_package_paths,
            patch_packages,
            resolve_timestamp,
            config,
        } = options;

        let config = match config {
            Some(config) => config,
            None => launch.resolve_config()?,
        };

        let requests = package_requests(&config, &profile)?;
        info!(profile = %profile, ?requests, "package requests");

        let mut package_paths = resolver.nonlocal_packages_paths()?;
        if use_local_packages {
            package_paths.insert(0, resolver.local_packages_path()?);
        }
        package_paths.extend(extra_package_paths);
        debug!(?package_paths, "package search paths");

        let timestamp = resolve_timestamp.or_else(|| config.resolve_settings().timestamp());
        let context = resolve_context(resolver, &requests, &package_paths, timestamp)?;

        let mut session = Self {
            profile,
            config,
            requests,
            package_paths,
            context,
            state: SessionState::Resolved,
        };

        if !patch_packages.is_empty() {
            session.patch(resolver, launch, &patch_packages)?;
        }

        Ok(session)
    }

    /// Re-resolve from a strictly patched request, replacing the active context.
    fn patch<R>(&mut self, resolver: &R, launch: &LaunchContext, patches: &[String]) -> Result<()>
    where
        R: PackageResolver<Context = C>,
    {
        let patched = self.context.patched_requests(patches, true)?;
        info!(?patches, requests = ?patched, "re-resolving with patched request");

        // Search order: local, testing, then the paths of the first resolve.
        let mut package_paths = self.package_paths.clone();
        if let Some(testing) = &launch.testing_packages_path {
            prepend_unique(&mut package_paths, testing.clone());
        }
        prepend_unique(&mut package_paths, resolver.local_packages_path()?);

        // The patched re-resolve is never time-limited.
        let context = resolve_context(resolver, &patched, &package_paths, None)?;

        self.context = context;
        self.requests = patched;
        self.package_paths = package_paths;
        self.state = SessionState::PatchResolved;
        Ok(())
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The merged configuration the session was built from.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Request list the active context was resolved from.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    /// Package search paths used for the active context.
    pub fn package_paths(&self) -> &[PathBuf] {
        &self.package_paths
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The active environment context.
    pub fn context(&self) -> &C {
        &self.context
    }
}

fn resolve_context<R: PackageResolver>(
    resolver: &R,
    requests: &[String],
    package_paths: &[PathBuf],
    timestamp: Option<DateTime<Utc>>,
) -> Result<R::Context> {
    let request = ResolveRequest {
        requests: requests.to_vec(),
        package_paths: package_paths.to_vec(),
        timestamp,
    };

    match resolver.resolve(&request)? {
        Resolution::Solved(context) => Ok(context),
        Resolution::Failed { diagnostics } => {
            error!(
                ?requests,
                package_paths = %display_paths(package_paths),
                "context failed to resolve"
            );
            eprintln!("{}", diagnostics.trim_end());
            Err(LaunchError::EnvironmentResolution {
                requests: requests.to_vec(),
                diagnostics,
            })
        }
    }
}

fn prepend_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    paths.retain(|existing| *existing != path);
    paths.insert(0, path);
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
