//! Configuration struct definition and document conversion.

use super::types::{
    ProfileSpec, RESOLVE_SETTINGS_KEY, ResolveSettings, key_to_string, value_kind,
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// A profile configuration: named profiles plus resolver settings.
///
/// Profiles keep the order in which they were first declared. The reserved
/// `_resolve_settings` entry is held separately and is never a profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Configuration {
    resolve_settings: ResolveSettings,
    profiles: Vec<(String, ProfileSpec)>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a YAML (or JSON) string.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Serialize the configuration to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn resolve_settings(&self) -> &ResolveSettings {
        &self.resolve_settings
    }

    pub fn resolve_settings_mut(&mut self) -> &mut ResolveSettings {
        &mut self.resolve_settings
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileSpec> {
        self.profiles
            .iter()
            .find(|(profile, _)| profile == name)
            .map(|(_, spec)| spec)
    }

    pub fn profile_mut(&mut self, name: &str) -> Option<&mut ProfileSpec> {
        self.profiles
            .iter_mut()
            .find(|(profile, _)| profile == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains_profile(&self, name: &str) -> bool {
        self.profile(name).is_some()
    }

    /// Insert or replace a whole profile. New profiles are appended.
    pub fn set_profile(&mut self, name: impl Into<String>, spec: ProfileSpec) {
        let name = name.into();
        match self.profile_mut(&name) {
            Some(existing) => *existing = spec,
            None => self.profiles.push((name, spec)),
        }
    }

    pub fn profiles(&self) -> impl Iterator<Item = (&str, &ProfileSpec)> {
        self.profiles.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profiles are defined (resolver settings do not count).
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl TryFrom<Value> for Configuration {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(format!(
                    "expected a mapping of profiles at the top level, found {}",
                    value_kind(&other)
                ));
            }
        };

        let mut config = Self::default();
        for (key, body) in mapping {
            let name = key_to_string(&key)?;
            if name == RESOLVE_SETTINGS_KEY {
                config.resolve_settings = ResolveSettings::from_value(body)?;
                continue;
            }
            let spec =
                ProfileSpec::from_value(body).map_err(|e| format!("profile '{}': {}", name, e))?;
            config.set_profile(name, spec);
        }
        Ok(config)
    }
}

impl From<Configuration> for Value {
    fn from(config: Configuration) -> Self {
        let mut mapping = Mapping::new();
        if !config.resolve_settings.is_empty() {
            mapping.insert(
                Value::String(RESOLVE_SETTINGS_KEY.to_string()),
                config.resolve_settings.to_value(),
            );
        }
        for (name, spec) in &config.profiles {
            mapping.insert(Value::String(name.clone()), spec.to_value());
        }
        Value::Mapping(mapping)
    }
}
