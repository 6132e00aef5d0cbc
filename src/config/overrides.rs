//! Layering one configuration document over another.

use super::model::Configuration;

/// Apply `overrides` on top of `base` and return the merged configuration.
///
/// Both inputs are borrowed and left untouched; the result is a new value.
///
/// Merge rules:
/// - `_resolve_settings` entries are merged key by key, `overrides` wins.
/// - A profile absent from `base` is inserted verbatim, after the existing profiles.
/// - A profile present in `base` only has its `packages` merged key by key.
///   Overwritten packages keep their position; new packages are appended.
///   Packages the override does not mention are kept as they are.
pub fn apply_override(base: &Configuration, overrides: &Configuration) -> Configuration {
    let mut merged = base.clone();

    merged
        .resolve_settings_mut()
        .merge_from(overrides.resolve_settings());

    for (name, spec) in overrides.profiles() {
        match merged.profile_mut(name) {
            Some(existing) => {
                for (package, version) in spec.packages.iter() {
                    existing.packages.set(package, version.clone());
                }
            }
            None => merged.set_profile(name, spec.clone()),
        }
    }

    merged
}
