//! Source tree enumeration and parsing
//!
//! Architecture: Repository - SourceTree is an immutable parsed snapshot shared by every phase
//! - Only the root itself failing is fatal; unreadable entries and unparseable files are skipped
//! - Test files and non-source files never enter the snapshot
//! - Files are parsed in parallel and stored sorted by path

pub mod modules;
pub mod path_filter;

pub use modules::{find_project_root, parse_module_directive, ModuleIndex, GO_MOD};
pub use path_filter::{slash_path, IgnoreCache, PathFilter};

use crate::analyzer::imports::ImportTable;
use crate::domain::violations::{GuardianError, GuardianResult};
use crate::syntax::{self, File};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A successfully parsed source file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path relative to the tree root
    pub path: PathBuf,
    /// Import path of the file's package
    pub package_path: String,
    pub syntax: File,
    pub imports: ImportTable,
}

impl ParsedFile {
    pub fn new(path: PathBuf, package_path: String, syntax: File) -> Self {
        let imports = ImportTable::from_file(&syntax);
        Self {
            path,
            package_path,
            syntax,
            imports,
        }
    }
}

/// Parsed snapshot of a source tree
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
    pub files: Vec<ParsedFile>,
    /// Source files dropped because they could not be read or parsed
    pub skipped: Vec<PathBuf>,
}

impl SourceTree {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Enumerates and parses the source files under a root
#[derive(Debug, Clone)]
pub struct TreeWalker {
    filter: PathFilter,
    source_extension: String,
    test_file_suffix: String,
    project_marker: String,
    parallel: bool,
}

impl TreeWalker {
    pub fn new(filter: PathFilter) -> Self {
        Self {
            filter,
            source_extension: "go".to_string(),
            test_file_suffix: "_test.go".to_string(),
            project_marker: GO_MOD.to_string(),
            parallel: true,
        }
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    pub fn with_test_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.test_file_suffix = suffix.into();
        self
    }

    pub fn with_project_marker(mut self, marker: impl Into<String>) -> Self {
        self.project_marker = marker.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn project_marker(&self) -> &str {
        &self.project_marker
    }

    /// Source extension matches and the name does not follow the test-file convention
    pub fn is_source_file(&self, path: &Path) -> bool {
        let extension_matches = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.source_extension);
        let is_test = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(&self.test_file_suffix));
        extension_matches && !is_test
    }

    /// Whether a change to `path` (relative to the root) can affect validation results
    pub fn is_relevant_change(&self, relative: &Path) -> bool {
        let is_marker = relative
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == self.project_marker);
        is_marker || (self.is_source_file(relative) && self.filter.matches_patterns(relative))
    }

    /// Enumerate and parse every source file under `root`
    pub fn load(&self, root: &Path) -> GuardianResult<SourceTree> {
        ensure_readable_dir(root)?;

        let (candidates, module_dirs) = self.enumerate(root);
        let modules = ModuleIndex::discover(root, &module_dirs, &self.project_marker);
        tracing::debug!(
            "Found {} source files and {} modules under {}",
            candidates.len(),
            module_dirs.len(),
            root.display()
        );

        let parse = |relative: &PathBuf| -> Result<ParsedFile, PathBuf> {
            let package_path = modules.package_path(relative.parent().unwrap_or(Path::new("")));
            parse_source(root, relative, package_path).ok_or_else(|| relative.clone())
        };

        let results: Vec<Result<ParsedFile, PathBuf>> = if self.parallel {
            candidates.par_iter().map(parse).collect()
        } else {
            candidates.iter().map(parse).collect()
        };

        let mut files = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(path) => skipped.push(path),
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            "Parsed {} files under {} ({} skipped)",
            files.len(),
            root.display(),
            skipped.len()
        );

        Ok(SourceTree {
            root: root.to_path_buf(),
            files,
            skipped,
        })
    }

    /// Candidate source files and `go.mod` directories, both root-relative
    fn enumerate(&self, root: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut candidates = Vec::new();
        let mut module_dirs = Vec::new();
        let mut ignore_cache = IgnoreCache::new();

        let entries = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            if entry.file_name().to_string_lossy() == self.project_marker {
                module_dirs.push(relative.parent().unwrap_or(Path::new("")).to_path_buf());
                continue;
            }

            if self.is_source_file(relative)
                && self.filter.should_analyze(root, relative, &mut ignore_cache)
            {
                candidates.push(relative.to_path_buf());
            }
        }

        (candidates, module_dirs)
    }
}

fn ensure_readable_dir(root: &Path) -> GuardianResult<()> {
    let metadata = fs::metadata(root).map_err(|e| GuardianError::root_access(root, e))?;
    if !metadata.is_dir() {
        return Err(GuardianError::root_access(
            root,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    fs::read_dir(root).map_err(|e| GuardianError::root_access(root, e))?;
    Ok(())
}

fn parse_source(root: &Path, relative: &Path, package_path: String) -> Option<ParsedFile> {
    let source = match fs::read_to_string(root.join(relative)) {
        Ok(source) => source,
        Err(e) => {
            tracing::debug!("Skipping unreadable {}: {}", relative.display(), e);
            return None;
        }
    };

    match syntax::parse_file(&source) {
        Ok(syntax) => Some(ParsedFile::new(relative.to_path_buf(), package_path, syntax)),
        Err(e) => {
            tracing::debug!("Skipping unparseable {}: {}", relative.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn walker() -> TreeWalker {
        TreeWalker::new(PathFilter::with_defaults().unwrap())
    }

    #[test]
    fn test_is_source_file() {
        let walker = walker();
        assert!(walker.is_source_file(Path::new("shop/money.go")));
        assert!(!walker.is_source_file(Path::new("shop/money_test.go")));
        assert!(!walker.is_source_file(Path::new("shop/README.md")));
        assert!(!walker.is_source_file(Path::new("shop/go")));
    }

    #[test]
    fn test_load_filters_and_skips() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "go.mod", "module example.com/shop\n\ngo 1.22\n");
        write(root, "money/money.go", "package money\n\ntype Money struct{}\n");
        write(root, "money/money_test.go", "package money\n");
        write(root, "money/broken.go", "package money\n\nfunc {\n");
        write(root, "vendor/x/x.go", "package x\n");
        write(root, "notes.txt", "not go");

        let tree = walker().load(root).unwrap();
        let paths: Vec<_> = tree.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [PathBuf::from("money/money.go")]);
        assert_eq!(tree.skipped, [PathBuf::from("money/broken.go")]);
        assert_eq!(tree.files[0].package_path, "example.com/shop/money");
    }

    #[test]
    fn test_files_sorted_regardless_of_parallelism() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for name in ["c", "a", "b"] {
            write(root, &format!("{name}/{name}.go"), &format!("package {name}\n"));
        }

        let parallel = walker().load(root).unwrap();
        let sequential = walker().with_parallel(false).load(root).unwrap();
        let names = |t: &SourceTree| t.files.iter().map(|f| f.path.clone()).collect::<Vec<_>>();
        assert_eq!(names(&parallel), names(&sequential));
        assert_eq!(names(&parallel)[0], PathBuf::from("a/a.go"));
        assert_eq!(parallel.files[0].package_path, "a");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_are_skipped() {
        use crate::domain::markers::{MarkerDefinition, VALUE_OBJECT_PACKAGE};
        use std::os::unix::fs::{symlink, PermissionsExt};

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "go.mod", "module example.com/shop\n");
        write(
            root,
            "m/m.go",
            &format!(
                "package m\n\nimport \"{VALUE_OBJECT_PACKAGE}\"\n\nvar bad = Money{{}}\n\ntype Money struct {{\n\t_ valueobject.ValueObject\n}}\n"
            ),
        );
        fs::write(root.join("m/binary.go"), b"package m\n\xff\xfe\n").unwrap();
        symlink(root.join("m/absent.go"), root.join("m/dangling.go")).unwrap();
        write(root, "locked/l.go", "package locked\n");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not bind when running as root
        let permissions_enforced = fs::read_dir(&locked).is_err();

        let loaded = walker().load(root);
        let validated = crate::validate(&MarkerDefinition::value_object(), root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let tree = loaded.unwrap();
        let paths: Vec<_> = tree.files.iter().map(|f| f.path.clone()).collect();
        if permissions_enforced {
            assert_eq!(paths, [PathBuf::from("m/m.go")]);
        } else {
            assert_eq!(paths, [PathBuf::from("locked/l.go"), PathBuf::from("m/m.go")]);
        }
        assert_eq!(tree.skipped, [PathBuf::from("m/binary.go")]);

        let report = validated.unwrap().expect("Money is a value object");
        assert_eq!(
            report.rendered_violations(),
            ["VIOLATION: ValueObject example.com/shop/m.Money at m/m.go:5"]
        );
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = walker().load(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, GuardianError::RootAccess { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("main.go");
        fs::write(&file, "package main\n").unwrap();
        let err = walker().load(&file).unwrap_err();
        assert!(matches!(err, GuardianError::RootAccess { .. }));
    }

    #[test]
    fn test_relevant_changes() {
        let walker = walker();
        assert!(walker.is_relevant_change(Path::new("a/b.go")));
        assert!(walker.is_relevant_change(Path::new("go.mod")));
        assert!(!walker.is_relevant_change(Path::new("a/b_test.go")));
        assert!(!walker.is_relevant_change(Path::new("vendor/a/b.go")));
    }
}
