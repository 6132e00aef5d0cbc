use crate::error::Result;
use crate::resolver::{
    Environ, PackageResolver, Resolution, ResolveRequest, ResolvedContext, request_family,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Write the given `(file name, contents)` pairs into `<root>/<config_set>/`.
pub(crate) fn write_config_set(root: &Path, config_set: &str, files: &[(&str, &str)]) {
    let dir = root.join(config_set);
    std::fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

/// A temporary config root holding a single `default` config set.
pub(crate) fn create_config_root(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_config_set(temp_dir.path(), "default", files);
    temp_dir
}

pub(crate) const RELEASE_PATH: &str = "/packages/release";
pub(crate) const LOCAL_PATH: &str = "/packages/local";

/// In-memory resolver with a fixed package catalog.
///
/// Requests naming an exact version (`pkg-1.0`, `pkg==1.0`) resolve to that
/// version; everything else resolves to the catalog version. Families missing
/// from the catalog fail to resolve. Every resolve request is recorded.
pub(crate) struct FakeResolver {
    catalog: Vec<(String, String)>,
    calls: RefCell<Vec<ResolveRequest>>,
}

impl FakeResolver {
    pub(crate) fn new() -> Self {
        Self {
            catalog: [
                ("maya", "2024.1"),
                ("python", "3.9.7"),
                ("houdini", "20.0"),
                ("usd", "23.5"),
                ("red_tools", "1.0"),
            ]
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ResolveRequest> {
        self.calls.borrow().clone()
    }

    fn catalog_version(&self, family: &str) -> Option<&str> {
        self.catalog
            .iter()
            .find(|(name, _)| name == family)
            .map(|(_, version)| version.as_str())
    }
}

impl PackageResolver for FakeResolver {
    type Context = FakeContext;

    fn nonlocal_packages_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(vec![PathBuf::from(RELEASE_PATH)])
    }

    fn local_packages_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(LOCAL_PATH))
    }

    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution<FakeContext>> {
        self.calls.borrow_mut().push(request.clone());

        let mut resolved = Vec::new();
        for req in &request.requests {
            let family = request_family(req);
            let Some(catalog_version) = self.catalog_version(family) else {
                return Ok(Resolution::Failed {
                    diagnostics: format!("package family not found: {}", family),
                });
            };
            let rest = &req[req.find(family).unwrap_or(0) + family.len()..];
            let version = rest
                .strip_prefix("==")
                .or_else(|| rest.strip_prefix('-'))
                .unwrap_or(catalog_version);
            resolved.push(format!("{}-{}", family, version));
        }

        Ok(Resolution::Solved(FakeContext {
            request: request.requests.clone(),
            resolved,
        }))
    }
}

/// Context produced by [`FakeResolver`]; runs commands directly on the host.
#[derive(Debug)]
pub(crate) struct FakeContext {
    request: Vec<String>,
    resolved: Vec<String>,
}

impl ResolvedContext for FakeContext {
    fn request(&self) -> &[String] {
        &self.request
    }

    fn resolved_packages(&self) -> &[String] {
        &self.resolved
    }

    fn command(&self, argv: &[String], parent_env: &Environ) -> Result<Command> {
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]).env_clear().envs(parent_env);
        Ok(command)
    }
}
