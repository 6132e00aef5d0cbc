//! Package resolver seam.
//!
//! Environment resolution is delegated to an external package manager. This
//! module defines what envlaunch needs from it:
//!
//! - the configured package search paths,
//! - resolving a request list into an activatable context (or a failure with
//!   diagnostics),
//! - patching a resolved context's request,
//! - building a command that runs inside the context.
//!
//! [`RezCli`] implements the seam by driving the `rez` command line.

mod patch;
mod rez;

pub use patch::{patch_requests, pin_resolved, request_family};
pub use rez::{DEFAULT_REZ_EXECUTABLE, RezCli, RezContext};

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// Parent environment handed to commands launched in a context.
pub type Environ = HashMap<OsString, OsString>;

/// Input to [`PackageResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Package requests, in the order they should be presented to the solver.
    pub requests: Vec<String>,
    /// Package repositories to search, highest priority first.
    pub package_paths: Vec<PathBuf>,
    /// Ignore packages released after this time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outcome of a resolve.
#[derive(Debug)]
pub enum Resolution<C> {
    /// The request was solved into an activatable context.
    Solved(C),
    /// The solver could not satisfy the request.
    Failed { diagnostics: String },
}

/// A fully resolved, activatable package set.
pub trait ResolvedContext {
    /// The request list this context was resolved from.
    fn request(&self) -> &[String];

    /// Resolved packages as qualified `name-version` strings.
    fn resolved_packages(&self) -> &[String];

    /// Compute a patched request list.
    ///
    /// With `strict`, the resolved packages pinned to their exact versions
    /// form the base list; otherwise the original request does. Patches then
    /// replace the entry of their package family, `^name` removes a family,
    /// and patches for new families are appended.
    fn patched_requests(&self, patches: &[String], strict: bool) -> Result<Vec<String>> {
        let base = if strict {
            pin_resolved(self.resolved_packages())
        } else {
            self.request().to_vec()
        };
        patch_requests(&base, patches, strict)
    }

    /// Build a command that runs `argv` inside this context.
    ///
    /// The returned command starts from `parent_env` rather than inheriting
    /// the current process environment. Stdio is left for the caller to set.
    fn command(&self, argv: &[String], parent_env: &Environ) -> Result<Command>;
}

/// An external dependency-resolving package manager.
pub trait PackageResolver {
    type Context: ResolvedContext;

    /// Configured release package repositories.
    fn nonlocal_packages_paths(&self) -> Result<Vec<PathBuf>>;

    /// Configured local (development) package repository.
    fn local_packages_path(&self) -> Result<PathBuf>;

    /// Resolve a request list against the given search paths.
    ///
    /// An unsatisfiable request is `Ok(Resolution::Failed)`; `Err` is reserved
    /// for failures to drive the resolver at all.
    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution<Self::Context>>;
}
