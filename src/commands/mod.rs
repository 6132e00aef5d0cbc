//! Command implementations for envlaunch.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each command returns the process exit code on success.

use crate::cli::{Command, ConfigArgs, ConfigSelection, RequestsArgs, RunArgs};
use crate::config::{Configuration, package_requests, store};
use crate::context::LaunchContext;
use crate::error::{LaunchError, Result};
use crate::exit_codes;
use crate::resolver::{PackageResolver, RezCli};
use crate::session::{CommandLine, EnvironmentSession, SessionOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Dispatch a command to its implementation.
///
/// `config_root` is the global `--config-root` flag; when unset the root
/// comes from the environment.
pub fn dispatch(command: Command, config_root: Option<PathBuf>) -> Result<i32> {
    let base = LaunchContext::from_env();
    let mut stdout = io::stdout().lock();

    match command {
        Command::Config(args) => {
            let launch = launch_context(base, &args.selection, config_root);
            cmd_config(&args, &launch, &mut stdout)
        }
        Command::Requests(args) => {
            let launch = launch_context(base, &args.selection, config_root);
            cmd_requests(&args, &launch, &mut stdout)
        }
        Command::Run(args) => {
            let launch = launch_context(base, &args.selection, config_root);
            let resolver = RezCli::new()
                .with_executable(&args.rez)
                .quiet(!args.rez_verbose);
            cmd_run(args, &launch, &resolver, &mut stdout)
        }
    }
}

/// Overlay CLI selectors on the environment-derived launch context.
fn launch_context(
    base: LaunchContext,
    selection: &ConfigSelection,
    config_root: Option<PathBuf>,
) -> LaunchContext {
    let launch = LaunchContext {
        config_root: config_root.unwrap_or(base.config_root),
        config_set: selection.config_set.clone().unwrap_or(base.config_set),
        project: selection.project.clone().or(base.project),
        department: selection.department.clone().or(base.department),
        testing_packages_path: base.testing_packages_path,
    };
    debug!(?launch, "launch context");
    launch
}

/// The pre-merged `--config-file` document, if one was given.
fn config_file(selection: &ConfigSelection) -> Result<Option<Configuration>> {
    selection.config_file.as_deref().map(store::load).transpose()
}

fn load_config(selection: &ConfigSelection, launch: &LaunchContext) -> Result<Configuration> {
    match config_file(selection)? {
        Some(config) => Ok(config),
        None => launch.resolve_config(),
    }
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| LaunchError::UserError(format!("failed to write output: {}", e)))
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_config(args: &ConfigArgs, launch: &LaunchContext, out: &mut dyn Write) -> Result<i32> {
    let config = load_config(&args.selection, launch)?;

    let text = if args.json {
        config.to_json().map(|json| json + "\n").map_err(|e| {
            LaunchError::UserError(format!("failed to serialize configuration: {}", e))
        })?
    } else {
        config.to_yaml().map_err(|e| {
            LaunchError::UserError(format!("failed to serialize configuration: {}", e))
        })?
    };

    write_out(out, &text)?;
    Ok(exit_codes::SUCCESS)
}

fn cmd_requests(args: &RequestsArgs, launch: &LaunchContext, out: &mut dyn Write) -> Result<i32> {
    let config = load_config(&args.selection, launch)?;
    let requests = package_requests(&config, &args.profile)?;

    let mut text = String::new();
    for request in &requests {
        text.push_str(request);
        text.push('\n');
    }

    write_out(out, &text)?;
    Ok(exit_codes::SUCCESS)
}

fn cmd_run<R: PackageResolver>(
    args: RunArgs,
    launch: &LaunchContext,
    resolver: &R,
    out: &mut dyn Write,
) -> Result<i32> {
    let options = SessionOptions {
        use_local_packages: args.local,
        extra_package_paths: args.package_paths,
        patch_packages: args.patches,
        resolve_timestamp: args.time,
        config: config_file(&args.selection)?,
    };

    let session = EnvironmentSession::new(args.profile, options, resolver, launch)?;
    let output = session.run(CommandLine::Argv(args.command), Some(out))?;

    info!(
        command = ?output.command,
        return_code = output.return_code,
        "command finished"
    );
    Ok(output.return_code)
}
