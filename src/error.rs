//! Error types for envlaunch.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for envlaunch operations.
///
/// Each variant maps to a specific exit code (see [`exit_codes`]).
#[derive(Error, Debug)]
pub enum LaunchError {
    /// User provided invalid arguments or output could not be written.
    #[error("{0}")]
    UserError(String),

    /// A configuration file reference points at nothing.
    #[error("config file not found: '{}'", .0.display())]
    InvalidPath(PathBuf),

    /// A configuration file has an extension that is neither YAML nor JSON.
    #[error(
        "unsupported config format for '{}' (expected .yml, .yaml or .json)",
        .0.display()
    )]
    UnsupportedFormat(PathBuf),

    /// A configuration file exists but could not be read or parsed.
    #[error("failed to parse config file '{}': {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// The config set directory has no `_base.yml`.
    #[error("base configuration not found at '{}'", .0.display())]
    BaseConfigNotFound(PathBuf),

    /// The override chain produced a configuration without profiles.
    #[error(
        "configuration '{config_set}' (project: {}, department: {}) defines no profiles",
        .project.as_deref().unwrap_or("-"),
        .department.as_deref().unwrap_or("-")
    )]
    EmptyConfiguration {
        config_set: String,
        project: Option<String>,
        department: Option<String>,
    },

    /// The requested profile is not defined after merging.
    #[error("unknown profile '{profile}' (available: {})", format_available(.available))]
    UnknownProfile {
        profile: String,
        available: Vec<String>,
    },

    /// The package resolver reported a failed resolve.
    #[error("context failed to resolve for request [{}]\n{diagnostics}", .requests.join(" "))]
    EnvironmentResolution {
        requests: Vec<String>,
        diagnostics: String,
    },

    /// The package resolver itself could not be driven (missing tool, bad output, bad patch).
    #[error("package resolver error: {0}")]
    Resolver(String),

    /// The command could not be parsed or launched.
    #[error("command failed: {0}")]
    Command(String),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

impl LaunchError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::UserError(_)
            | LaunchError::InvalidPath(_)
            | LaunchError::UnsupportedFormat(_)
            | LaunchError::ConfigParse { .. } => exit_codes::USER_ERROR,
            LaunchError::BaseConfigNotFound(_)
            | LaunchError::EmptyConfiguration { .. }
            | LaunchError::UnknownProfile { .. } => exit_codes::CONFIG_FAILURE,
            LaunchError::EnvironmentResolution { .. } | LaunchError::Resolver(_) => {
                exit_codes::RESOLVE_FAILURE
            }
            LaunchError::Command(_) => exit_codes::EXEC_FAILURE,
        }
    }
}

/// Result type alias for envlaunch operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_errors_are_user_errors() {
        let err = LaunchError::InvalidPath(PathBuf::from("/missing.yml"));
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = LaunchError::UnsupportedFormat(PathBuf::from("config.toml"));
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn merge_errors_are_config_failures() {
        let err = LaunchError::BaseConfigNotFound(PathBuf::from("config/default/_base.yml"));
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);

        let err = LaunchError::UnknownProfile {
            profile: "nuke".to_string(),
            available: vec!["maya".to_string()],
        };
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn resolve_errors_have_correct_exit_code() {
        let err = LaunchError::EnvironmentResolution {
            requests: vec!["maya-2024".to_string()],
            diagnostics: "conflict".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::RESOLVE_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = LaunchError::UnknownProfile {
            profile: "nuke".to_string(),
            available: vec!["maya".to_string(), "houdini".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown profile 'nuke' (available: maya, houdini)"
        );

        let err = LaunchError::EmptyConfiguration {
            config_set: "default".to_string(),
            project: Some("testjob".to_string()),
            department: None,
        };
        assert_eq!(
            err.to_string(),
            "configuration 'default' (project: testjob, department: -) defines no profiles"
        );

        let err = LaunchError::EnvironmentResolution {
            requests: vec!["maya-2024".to_string(), "python".to_string()],
            diagnostics: "The context failed to resolve".to_string(),
        };
        assert!(err.to_string().contains("[maya-2024 python]"));
        assert!(err.to_string().contains("The context failed to resolve"));
    }
}
