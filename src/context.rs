//! Launch context resolution from the process environment.
//!
//! This is the only place envlaunch reads environment variables. Everything
//! downstream (config resolution, sessions) receives the values explicitly
//! through [`LaunchContext`].

use crate::config::{ConfigResolver, Configuration, DEFAULT_CONFIG_SET};
use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming the current project (job).
pub const PROJECT_VAR: &str = "JOB";

/// Environment variable naming the current department.
pub const DEPARTMENT_VAR: &str = "DEPARTMENT";

/// Environment variable with an extra package repository searched first when patching.
pub const TESTING_PACKAGES_PATH_VAR: &str = "RED_TESTING_PACKAGES_PATH";

/// Environment variable overriding the configuration root directory.
pub const CONFIG_ROOT_VAR: &str = "ENVLAUNCH_CONFIG_ROOT";

/// Environment variable overriding the config set name.
pub const CONFIG_SET_VAR: &str = "ENVLAUNCH_CONFIG_SET";

/// Configuration root used when [`CONFIG_ROOT_VAR`] is unset.
pub const DEFAULT_CONFIG_ROOT: &str = "config";

/// Where configuration comes from and which overrides apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Directory holding one subdirectory per config set.
    pub config_root: PathBuf,

    /// Config set to resolve (default: "default").
    pub config_set: String,

    /// Project whose override layer applies, if any.
    pub project: Option<String>,

    /// Department whose project+department layer applies, if any.
    pub department: Option<String>,

    /// Package repository prepended when re-resolving with patches.
    pub testing_packages_path: Option<PathBuf>,
}

impl LaunchContext {
    /// A context for `config_root` with the default config set and no overrides.
    pub fn new(config_root: impl Into<PathBuf>) -> Self {
        Self {
            config_root: config_root.into(),
            config_set: DEFAULT_CONFIG_SET.to_string(),
            project: None,
            department: None,
            testing_packages_path: None,
        }
    }

    /// Build the context from the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let context = Self {
            config_root: get(CONFIG_ROOT_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_ROOT)),
            config_set: get(CONFIG_SET_VAR).unwrap_or_else(|| DEFAULT_CONFIG_SET.to_string()),
            project: get(PROJECT_VAR),
            department: get(DEPARTMENT_VAR),
            testing_packages_path: get(TESTING_PACKAGES_PATH_VAR).map(PathBuf::from),
        };

        debug!(?context, "launch context from environment");
        context
    }

    pub fn config_resolver(&self) -> ConfigResolver {
        ConfigResolver::new(&self.config_root)
    }

    /// Resolve the merged configuration for this context's project and department.
    pub fn resolve_config(&self) -> Result<Configuration> {
        self.config_resolver().resolve(
            &self.config_set,
            self.project.as_deref(),
            self.department.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let context = LaunchContext::from_lookup(lookup_from(&[]));

        assert_eq!(context.config_root, PathBuf::from("config"));
        assert_eq!(context.config_set, "default");
        assert_eq!(context.project, None);
        assert_eq!(context.department, None);
        assert_eq!(context.testing_packages_path, None);
    }

    #[test]
    fn test_reads_all_variables() {
        let context = LaunchContext::from_lookup(lookup_from(&[
            ("JOB", "testjob"),
            ("DEPARTMENT", "model"),
            ("RED_TESTING_PACKAGES_PATH", "/studio/testing"),
            ("ENVLAUNCH_CONFIG_ROOT", "/studio/config"),
            ("ENVLAUNCH_CONFIG_SET", "farm"),
        ]));

        assert_eq!(context.config_root, PathBuf::from("/studio/config"));
        assert_eq!(context.config_set, "farm");
        assert_eq!(context.project.as_deref(), Some("testjob"));
        assert_eq!(context.department.as_deref(), Some("model"));
        assert_eq!(
            context.testing_packages_path,
            Some(PathBuf::from("/studio/testing"))
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let context =
            LaunchContext::from_lookup(lookup_from(&[("JOB", ""), ("DEPARTMENT", "  ")]));

        assert_eq!(context.project, None);
        assert_eq!(context.department, None);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // SAFETY: serialized with every other test touching these variables.
        unsafe {
            std::env::set_var(PROJECT_VAR, "envjob");
            std::env::remove_var(DEPARTMENT_VAR);
        }

        let context = LaunchContext::from_env();

        unsafe {
            std::env::remove_var(PROJECT_VAR);
        }

        assert_eq!(context.project.as_deref(), Some("envjob"));
        assert_eq!(context.department, None);
    }
}
