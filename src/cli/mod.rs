//! CLI argument parsing for envlaunch.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Envlaunch: resolve layered profile configuration and launch commands in Rez environments.
///
/// Profiles are configured per config set as a base document plus optional
/// project and project+department overrides:
/// - `<config-root>/<set>/_base.yml`
/// - `<config-root>/<set>/<project>.yml`
/// - `<config-root>/<set>/<project>_<department>.yml`
#[derive(Parser, Debug)]
#[command(name = "envlaunch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration root directory (default: $ENVLAUNCH_CONFIG_ROOT or ./config).
    #[arg(long, global = true)]
    pub config_root: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for envlaunch.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged configuration.
    ///
    /// Applies the base, project, and project+department layers and prints
    /// the result as YAML (or JSON).
    Config(ConfigArgs),

    /// Print the package requests of a profile, one per line.
    Requests(RequestsArgs),

    /// Resolve a profile's environment and run a command inside it.
    ///
    /// Exits with the command's exit code.
    Run(RunArgs),
}

/// Selection of the configuration to resolve.
///
/// Unset values fall back to the environment (`ENVLAUNCH_CONFIG_SET`, `JOB`, `DEPARTMENT`).
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSelection {
    /// Config set name (default: "default").
    #[arg(long)]
    pub config_set: Option<String>,

    /// Project whose override layer applies.
    #[arg(long)]
    pub project: Option<String>,

    /// Department whose project+department override layer applies.
    #[arg(long)]
    pub department: Option<String>,

    /// Use a pre-merged configuration document (.yml/.yaml/.json) instead.
    #[arg(long, conflicts_with_all = ["config_set", "project", "department"])]
    pub config_file: Option<PathBuf>,
}

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub selection: ConfigSelection,

    /// Print JSON instead of YAML.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `requests` command.
#[derive(Args, Debug)]
pub struct RequestsArgs {
    /// Profile name.
    pub profile: String,

    #[command(flatten)]
    pub selection: ConfigSelection,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Profile name.
    pub profile: String,

    #[command(flatten)]
    pub selection: ConfigSelection,

    /// Search the local package repository first.
    #[arg(long)]
    pub local: bool,

    /// Additional package repository (repeatable).
    #[arg(long = "package-path", value_name = "PATH")]
    pub package_paths: Vec<PathBuf>,

    /// Patch request laid over the resolved environment (repeatable).
    #[arg(long = "patch", value_name = "REQUEST")]
    pub patches: Vec<String>,

    /// Ignore packages released after this time (epoch seconds or RFC 3339).
    #[arg(long, value_parser = parse_time)]
    pub time: Option<DateTime<Utc>>,

    /// rez executable to use.
    #[arg(long, default_value = crate::resolver::DEFAULT_REZ_EXECUTABLE)]
    pub rez: PathBuf,

    /// Show rez's own banner output.
    #[arg(long)]
    pub rez_verbose: bool,

    /// Command to run, after `--`.
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    crate::config::types::parse_timestamp(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_command() {
        let cli = Cli::try_parse_from([
            "envlaunch",
            "run",
            "maya",
            "--project",
            "testjob",
            "--local",
            "--package-path",
            "/extra",
            "--patch",
            "maya-2025",
            "--time",
            "1700000000",
            "--",
            "maya",
            "-batch",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.profile, "maya");
        assert_eq!(args.selection.project.as_deref(), Some("testjob"));
        assert!(args.local);
        assert_eq!(args.package_paths, vec![PathBuf::from("/extra")]);
        assert_eq!(args.patches, vec!["maya-2025"]);
        assert_eq!(args.time.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(args.command, vec!["maya", "-batch"]);
    }

    #[test]
    fn run_requires_command() {
        assert!(Cli::try_parse_from(["envlaunch", "run", "maya"]).is_err());
    }

    #[test]
    fn config_file_conflicts_with_selectors() {
        let result = Cli::try_parse_from([
            "envlaunch",
            "requests",
            "maya",
            "--config-file",
            "merged.json",
            "--project",
            "testjob",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_time_is_rejected() {
        let result = Cli::try_parse_from([
            "envlaunch", "run", "maya", "--time", "yesterday", "--", "maya",
        ]);
        assert!(result.is_err());
    }
}
