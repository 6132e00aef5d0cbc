//! Profile configuration types.
//!
//! This module defines the building blocks of a profile configuration:
//! version specs, the ordered package mapping, profile bodies, and the
//! reserved resolver settings entry.

use chrono::{DateTime, TimeZone, Utc};
use serde_yaml::{Mapping, Value};

/// Version spec that removes a package from the request list.
pub const EXCLUDE_SENTINEL: &str = "__exclude__";

/// Reserved top-level key holding resolver-wide settings. Never a profile.
pub const RESOLVE_SETTINGS_KEY: &str = "_resolve_settings";

/// Key inside a profile body holding the package mapping.
pub const PACKAGES_KEY: &str = "packages";

/// Key inside `_resolve_settings` holding the default resolve timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Version constraint attached to a package in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSpec {
    /// Any version; the request is the bare package name.
    #[default]
    Any,
    /// Comparison operator (`==`, `>`, `<` ...) appended directly after the name.
    Constraint(String),
    /// Exact version, joined to the name with `-`.
    Exact(String),
    /// Suppress the package entirely.
    Excluded,
}

impl VersionSpec {
    /// Classify a raw version spec string.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Any
        } else if raw == EXCLUDE_SENTINEL {
            Self::Excluded
        } else if raw.starts_with("==") || raw.starts_with('>') || raw.starts_with('<') {
            Self::Constraint(raw.to_string())
        } else {
            Self::Exact(raw.to_string())
        }
    }

    /// The version spec as written in a configuration document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "",
            Self::Constraint(s) | Self::Exact(s) => s,
            Self::Excluded => EXCLUDE_SENTINEL,
        }
    }

    /// Build the package request string for `package`, or `None` when excluded.
    pub fn request_for(&self, package: &str) -> Option<String> {
        match self {
            Self::Any => Some(package.to_string()),
            Self::Constraint(op) => Some(format!("{}{}", package, op)),
            Self::Exact(version) => Some(format!("{}-{}", package, version)),
            Self::Excluded => None,
        }
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Self::Any),
            Value::String(s) => Ok(Self::parse(s)),
            // Unquoted YAML versions such as `maya: 2024` arrive as numbers.
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self::parse(&n.to_string())),
            // A float has already lost its text (`3.10` reads as 3.1).
            Value::Number(n) => Err(format!(
                "unquoted float version {} may not match what was written; quote it",
                n
            )),
            other => Err(format!(
                "expected a version string, found {}",
                value_kind(other)
            )),
        }
    }
}

impl From<&str> for VersionSpec {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Package name to version spec mapping that keeps document order.
///
/// Overwriting an existing package keeps its position; new packages are
/// appended at the end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageMap {
    entries: Vec<(String, VersionSpec)>,
}

impl PackageMap {
    pub fn get(&self, package: &str) -> Option<&VersionSpec> {
        self.entries
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, spec)| spec)
    }

    /// Insert or overwrite the version spec for `package`.
    pub fn set(&mut self, package: impl Into<String>, spec: VersionSpec) {
        let package = package.into();
        match self.entries.iter_mut().find(|(name, _)| *name == package) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((package, spec)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(format!(
                    "'{}' must be a mapping, found {}",
                    PACKAGES_KEY,
                    value_kind(&other)
                ));
            }
        };

        let mut packages = Self::default();
        for (key, version) in mapping {
            let name = key_to_string(&key)?;
            let spec = VersionSpec::from_value(&version)
                .map_err(|e| format!("package '{}': {}", name, e))?;
            packages.set(name, spec);
        }
        Ok(packages)
    }

    fn to_value(&self) -> Value {
        let mut mapping = Mapping::new();
        for (name, spec) in &self.entries {
            mapping.insert(
                Value::String(name.clone()),
                Value::String(spec.as_str().to_string()),
            );
        }
        Value::Mapping(mapping)
    }
}

impl<K: Into<String>> FromIterator<(K, VersionSpec)> for PackageMap {
    fn from_iter<I: IntoIterator<Item = (K, VersionSpec)>>(iter: I) -> Self {
        let mut packages = Self::default();
        for (name, spec) in iter {
            packages.set(name, spec);
        }
        packages
    }
}

/// Body of a single profile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileSpec {
    /// Packages requested by the profile, in document order.
    pub packages: PackageMap,

    /// Unknown keys preserved for forward compatibility.
    pub extra: Mapping,
}

impl ProfileSpec {
    pub fn with_packages(packages: PackageMap) -> Self {
        Self {
            packages,
            extra: Mapping::new(),
        }
    }

    pub(crate) fn from_value(value: Value) -> Result<Self, String> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(format!(
                    "expected a profile mapping, found {}",
                    value_kind(&other)
                ));
            }
        };

        let mut spec = Self::default();
        for (key, value) in mapping {
            if key.as_str() == Some(PACKAGES_KEY) {
                spec.packages = PackageMap::from_value(value)?;
            } else {
                spec.extra.insert(key, value);
            }
        }
        Ok(spec)
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut mapping = Mapping::new();
        mapping.insert(Value::String(PACKAGES_KEY.to_string()), self.packages.to_value());
        for (key, value) in &self.extra {
            mapping.insert(key.clone(), value.clone());
        }
        Value::Mapping(mapping)
    }
}

/// Resolver-wide settings from the `_resolve_settings` entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveSettings {
    entries: Mapping,
}

impl ResolveSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy every entry of `other` into these settings, overwriting on collision.
    pub fn merge_from(&mut self, other: &ResolveSettings) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Default resolve timestamp, if one is configured.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries
            .get(TIMESTAMP_KEY)
            .and_then(|value| timestamp_from_value(value).ok())
    }

    pub(crate) fn from_value(value: Value) -> Result<Self, String> {
        let entries = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(format!(
                    "'{}' must be a mapping, found {}",
                    RESOLVE_SETTINGS_KEY,
                    value_kind(&other)
                ));
            }
        };

        if let Some(value) = entries.get(TIMESTAMP_KEY) {
            timestamp_from_value(value)
                .map_err(|e| format!("{}.{}: {}", RESOLVE_SETTINGS_KEY, TIMESTAMP_KEY, e))?;
        }

        Ok(Self { entries })
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Mapping(self.entries.clone())
    }
}

/// Parse a resolve timestamp given as epoch seconds or an RFC 3339 string.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return epoch_to_datetime(secs);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

fn timestamp_from_value(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => epoch_to_datetime(secs),
            None => Err(format!("timestamp must be whole epoch seconds, found {}", n)),
        },
        Value::String(s) => parse_timestamp(s),
        other => Err(format!(
            "expected epoch seconds or an RFC 3339 string, found {}",
            value_kind(other)
        )),
    }
}

fn epoch_to_datetime(secs: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| format!("timestamp {} is out of range", secs))
}

pub(crate) fn key_to_string(key: &Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected a string key, found {}", value_kind(other))),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
