//! Layered profile configuration.
//!
//! A config set is a directory of YAML documents: a mandatory `_base.yml`
//! plus optional project and project+department overrides. This module loads
//! those documents, merges them in order, and turns a profile into the list
//! of package requests handed to the package resolver.

mod model;
mod overrides;
mod requests;
mod resolver;
pub mod store;
pub mod types;


// Re-export public API
pub use model::Configuration;
pub use overrides::apply_override;
pub use requests::package_requests;
pub use resolver::{BASE_CONFIG_FILE, ConfigResolver, DEFAULT_CONFIG_SET};
pub use types::{
    EXCLUDE_SENTINEL, PackageMap, ProfileSpec, RESOLVE_SETTINGS_KEY, ResolveSettings, VersionSpec,
};
