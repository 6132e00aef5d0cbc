//! Rez command-line adapter.
//!
//! Drives the `rez` executable:
//!
//! - `rez config <key>` for the configured package paths,
//! - `rez env ... --output <file.rxt>` to resolve into a context file,
//! - `rez context --print-request/--print-resolve` to read a context back,
//! - `rez env --input <file.rxt> -- <argv>` to run a command inside it.

use super::{Environ, PackageResolver, Resolution, ResolveRequest, ResolvedContext};
use crate::error::{LaunchError, Result};
use serde_yaml::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::{debug, info};

/// Executable looked up on `PATH` when none is configured.
pub const DEFAULT_REZ_EXECUTABLE: &str = "rez";

/// File name of the context file written inside each context's directory.
const CONTEXT_FILE: &str = "context.rxt";

/// [`PackageResolver`] backed by the `rez` command line.
#[derive(Debug, Clone)]
pub struct RezCli {
    executable: PathBuf,
    quiet: bool,
}

impl Default for RezCli {
    fn default() -> Self {
        Self::new()
    }
}

impl RezCli {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_REZ_EXECUTABLE),
            quiet: true,
        }
    }

    /// Use a specific `rez` executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Whether `rez env` should hide its banner when running commands (default: true).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn run(&self, args: &[OsString]) -> Result<Output> {
        debug!(executable = %self.executable.display(), ?args, "invoking rez");
        Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|e| {
                LaunchError::Resolver(format!(
                    "failed to execute '{}': {}\nFix: ensure rez is installed and in PATH.",
                    self.executable.display(),
                    e
                ))
            })
    }

    fn run_checked(&self, args: &[OsString]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(LaunchError::Resolver(format!(
                "'{} {}' failed (exit code {:?}): {}",
                self.executable.display(),
                args.iter()
                    .map(|a| a.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" "),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn config_value(&self, key: &str) -> Result<Value> {
        let stdout = self.run_checked(&[OsString::from("config"), OsString::from(key)])?;
        serde_yaml::from_str(&stdout).map_err(|e| {
            LaunchError::Resolver(format!("unexpected output from 'rez config {}': {}", key, e))
        })
    }

    fn read_context_list(&self, rxt: &Path, flag: &str) -> Result<Vec<String>> {
        let stdout = self.run_checked(&[
            OsString::from("context"),
            OsString::from(flag),
            rxt.as_os_str().to_owned(),
        ])?;
        Ok(stdout.split_whitespace().map(str::to_string).collect())
    }
}

impl PackageResolver for RezCli {
    type Context = RezContext;

    fn nonlocal_packages_paths(&self) -> Result<Vec<PathBuf>> {
        match self.config_value("nonlocal_packages_path")? {
            Value::Null => Ok(Vec::new()),
            Value::String(path) => Ok(vec![PathBuf::from(path)]),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(path) => Ok(PathBuf::from(path)),
                    other => Err(LaunchError::Resolver(format!(
                        "unexpected entry in nonlocal_packages_path: {:?}",
                        other
                    ))),
                })
                .collect(),
            other => Err(LaunchError::Resolver(format!(
                "unexpected nonlocal_packages_path value: {:?}",
                other
            ))),
        }
    }

    fn local_packages_path(&self) -> Result<PathBuf> {
        match self.config_value("local_packages_path")? {
            Value::String(path) => Ok(PathBuf::from(path)),
            other => Err(LaunchError::Resolver(format!(
                "unexpected local_packages_path value: {:?}",
                other
            ))),
        }
    }

    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution<RezContext>> {
        let dir = tempfile::Builder::new()
            .prefix("envlaunch-")
            .tempdir()
            .map_err(|e| {
                LaunchError::Resolver(format!("failed to create context directory: {}", e))
            })?;
        let rxt = dir.path().join(CONTEXT_FILE);

        let paths = std::env::join_paths(&request.package_paths).map_err(|e| {
            LaunchError::Resolver(format!("invalid package path: {}", e))
        })?;

        let mut args: Vec<OsString> = vec!["env".into(), "--paths".into(), paths];
        if let Some(timestamp) = request.timestamp {
            args.push("--time".into());
            args.push(timestamp.timestamp().to_string().into());
        }
        args.push("--output".into());
        args.push(rxt.clone().into());
        args.extend(request.requests.iter().map(OsString::from));

        info!(requests = ?request.requests, "resolving rez context");
        let output = self.run(&args)?;

        if !output.status.success() || !rxt.is_file() {
            let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                    diagnostics.push('\n');
                }
                diagnostics.push_str(&stderr);
            }
            return Ok(Resolution::Failed { diagnostics });
        }

        let request_list = self.read_context_list(&rxt, "--print-request")?;
        let resolved = self.read_context_list(&rxt, "--print-resolve")?;
        debug!(?resolved, rxt = %rxt.display(), "rez context resolved");

        Ok(Resolution::Solved(RezContext {
            executable: self.executable.clone(),
            quiet: self.quiet,
            request: request_list,
            resolved,
            rxt,
            _dir: dir,
        }))
    }
}

/// A resolved rez context stored in a temporary `.rxt` file.
///
/// The file lives as long as the context does.
#[derive(Debug)]
pub struct RezContext {
    executable: PathBuf,
    quiet: bool,
    request: Vec<String>,
    resolved: Vec<String>,
    rxt: PathBuf,
    _dir: TempDir,
}

impl RezContext {
    /// Path of the context file.
    pub fn rxt_path(&self) -> &Path {
        &self.rxt
    }
}

impl ResolvedContext for RezContext {
    fn request(&self) -> &[String] {
        &self.request
    }

    fn resolved_packages(&self) -> &[String] {
        &self.resolved
    }

    fn command(&self, argv: &[String], parent_env: &Environ) -> Result<Command> {
        if argv.is_empty() {
            return Err(LaunchError::Command("command is empty".to_string()));
        }

        let mut command = Command::new(&self.executable);
        command.arg("env").arg("--input").arg(&self.rxt);
        if self.quiet {
            command.arg("--quiet");
        }
        command.arg("--").args(argv);
        command.env_clear().envs(parent_env);
        Ok(command)
    }
}
