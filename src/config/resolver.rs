//! Resolving the base → project → project+department override chain.

use super::model::Configuration;
use super::overrides::apply_override;
use super::store;
use crate::error::{LaunchError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config set used when none is given.
pub const DEFAULT_CONFIG_SET: &str = "default";

/// File name of the mandatory base document inside a config set.
pub const BASE_CONFIG_FILE: &str = "_base.yml";

/// Resolves layered profile configuration from a config root directory.
///
/// The root holds one directory per config set:
///
/// ```text
/// <root>/<config_set>/_base.yml
/// <root>/<config_set>/<project>.yml
/// <root>/<config_set>/<project>_<department>.yml
/// ```
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    root: PathBuf,
}

impl ConfigResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents of `config_set`.
    pub fn config_dir(&self, config_set: &str) -> PathBuf {
        self.root.join(config_set)
    }

    /// Resolve the merged configuration for a project and department.
    ///
    /// Layers are applied strictly in order: base, then `{project}.yml`, then
    /// `{project}_{department}.yml`. Missing override files are skipped; a
    /// missing base is an error. Without a project both overrides are skipped,
    /// without a department only the department override is.
    ///
    /// # Returns
    ///
    /// * `Ok(Configuration)` - The merged configuration, with at least one profile
    /// * `Err(LaunchError::BaseConfigNotFound)` - `_base.yml` is missing
    /// * `Err(LaunchError::EmptyConfiguration)` - The chain defines no profiles
    pub fn resolve(
        &self,
        config_set: &str,
        project: Option<&str>,
        department: Option<&str>,
    ) -> Result<Configuration> {
        let config_dir = self.config_dir(config_set);

        let base_path = config_dir.join(BASE_CONFIG_FILE);
        if !base_path.is_file() {
            return Err(LaunchError::BaseConfigNotFound(base_path));
        }
        debug!(path = %base_path.display(), "applying base config");
        let mut config = store::load(&base_path)?;

        for layer in override_layers(&config_dir, project, department) {
            if !layer.is_file() {
                debug!(path = %layer.display(), "override not present, skipping");
                continue;
            }
            debug!(path = %layer.display(), "applying config override");
            let overrides = store::load(&layer)?;
            config = apply_override(&config, &overrides);
        }

        if config.is_empty() {
            return Err(LaunchError::EmptyConfiguration {
                config_set: config_set.to_string(),
                project: project.map(str::to_string),
                department: department.map(str::to_string),
            });
        }

        Ok(config)
    }
}

/// Override documents for a project and department, in application order.
fn override_layers(
    config_dir: &Path,
    project: Option<&str>,
    department: Option<&str>,
) -> Vec<PathBuf> {
    let Some(project) = project else {
        return Vec::new();
    };

    let mut layers = vec![config_dir.join(format!("{}.yml", project))];
    if let Some(department) = department {
        layers.push(config_dir.join(format!("{}_{}.yml", project, department)));
    }
    layers
}
