//! Project root discovery and Go module package identity
//!
//! Architecture: Repository - `go.mod` files are the source of truth for import paths
//! - The root finder walks upward from an explicit origin, never from process state
//! - A file's package identity is its module path plus its directory below the module

use crate::domain::violations::{GuardianError, GuardianResult};
use crate::tree::path_filter::slash_path;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default project marker file
pub const GO_MOD: &str = "go.mod";

/// Walk upward from `origin` until a directory containing `marker` is found
pub fn find_project_root(origin: &Path, marker: &str) -> GuardianResult<PathBuf> {
    let absolute = std::path::absolute(origin)?;
    let start = if absolute.is_file() {
        absolute.parent()
    } else {
        Some(absolute.as_path())
    };

    let mut current = start;
    while let Some(dir) = current {
        if dir.join(marker).is_file() {
            tracing::debug!("Project root for {} is {}", origin.display(), dir.display());
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    Err(GuardianError::project_root(origin, marker))
}

/// Extract the module path from `go.mod` content
pub fn parse_module_directive(content: &str) -> Option<String> {
    for line in content.lines() {
        let line = match line.find("//") {
            Some(comment) => &line[..comment],
            None => line,
        }
        .trim();

        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }
    None
}

/// Module paths by root-relative directory
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    modules: BTreeMap<PathBuf, String>,
}

impl ModuleIndex {
    /// Build the index from `go.mod` directories found under `root`.
    ///
    /// When `root` itself has no `go.mod`, the nearest one above it supplies the
    /// import path prefix for the whole tree.
    pub fn discover(root: &Path, module_dirs: &[PathBuf], marker: &str) -> Self {
        let mut index = Self::default();

        for dir in module_dirs {
            let go_mod = root.join(dir).join(marker);
            match fs::read_to_string(&go_mod) {
                Ok(content) => match parse_module_directive(&content) {
                    Some(module) => index.insert(dir.clone(), module),
                    None => tracing::debug!("No module directive in {}", go_mod.display()),
                },
                Err(e) => tracing::debug!("Skipping unreadable {}: {}", go_mod.display(), e),
            }
        }

        if !index.modules.contains_key(Path::new("")) {
            if let Some(module) = enclosing_module(root, marker) {
                index.insert(PathBuf::new(), module);
            }
        }

        index
    }

    pub fn insert(&mut self, dir: PathBuf, module: String) {
        self.modules.insert(dir, module);
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Import path of the package in root-relative directory `dir`.
    ///
    /// Outside any module the directory itself is used, with `.` for the root.
    pub fn package_path(&self, dir: &Path) -> String {
        for ancestor in dir.ancestors() {
            if let Some(module) = self.modules.get(ancestor) {
                let rest = dir.strip_prefix(ancestor).map(slash_path).unwrap_or_default();
                return if rest.is_empty() {
                    module.clone()
                } else {
                    format!("{module}/{rest}")
                };
            }
        }

        let rel = slash_path(dir);
        if rel.is_empty() {
            ".".to_string()
        } else {
            rel
        }
    }
}

/// Module path for `root` from a `go.mod` in one of its parents
fn enclosing_module(root: &Path, marker: &str) -> Option<String> {
    let root = std::path::absolute(root).ok()?;
    let module_root = find_project_root(root.parent()?, marker).ok()?;
    let content = fs::read_to_string(module_root.join(marker)).ok()?;
    let module = parse_module_directive(&content)?;
    let below = slash_path(root.strip_prefix(&module_root).ok()?);
    Some(if below.is_empty() {
        module
    } else {
        format!("{module}/{below}")
    })
}
