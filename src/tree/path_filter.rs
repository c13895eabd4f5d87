//! Path filtering using .gitignore-style patterns
//!
//! Architectural Principle: Service Layer - PathFilter owns the include/exclude rules
//! - Patterns are evaluated against paths relative to the validated root
//! - Later patterns win, and `!pattern` re-includes what an earlier one excluded
//! - Per-directory ignore files are honoured from the root down to the file

use crate::domain::violations::{GuardianError, GuardianResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default ignore file name
pub const DEFAULT_IGNORE_FILE: &str = ".guardianignore";

/// Exclusions applied when no configuration overrides them
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/vendor/**",
    "**/testdata/**",
    "**/.git/**",
    "**/node_modules/**",
];

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<FilterPattern>,
    /// Per-directory ignore file name, `None` to skip ignore files
    ignore_filename: Option<String>,
}

/// A single path filter pattern
#[derive(Debug, Clone)]
pub struct FilterPattern {
    pattern: glob::Pattern,
    /// `!pattern` re-includes
    is_include: bool,
    /// Pattern text without the `!` prefix
    original: String,
}

impl FilterPattern {
    fn parse(line: &str) -> Result<Self, glob::PatternError> {
        let (is_include, text) = match line.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, line),
        };
        let glob_text = text.trim_start_matches('/').trim_end_matches('/');
        Ok(Self {
            pattern: glob::Pattern::new(glob_text)?,
            is_include,
            original: text.to_string(),
        })
    }

    /// Match against a root-relative, slash-separated path using .gitignore-style rules
    fn matches(&self, path: &Path) -> bool {
        if self.original.ends_with('/') {
            // Directory pattern: match any ancestor directory
            return path
                .ancestors()
                .skip(1)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| self.matches_path_text(dir));
        }
        self.matches_path_text(path)
    }

    fn matches_path_text(&self, path: &Path) -> bool {
        let anchored = self.original.starts_with('/');
        let has_slash = self.original.trim_end_matches('/').contains('/');

        if anchored || has_slash {
            return self.pattern.matches(&slash_path(path));
        }

        path.file_name()
            .map(|name| self.pattern.matches(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// Ignore-file patterns already read during one walk, keyed by directory
pub type IgnoreCache = HashMap<PathBuf, Vec<FilterPattern>>;

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> GuardianResult<Self> {
        let mut filter = Self {
            patterns: Vec::with_capacity(patterns.len()),
            ignore_filename,
        };
        for pattern in &patterns {
            filter.add_pattern(pattern)?;
        }
        Ok(filter)
    }

    /// Create a default path filter excluding vendored and generated trees
    pub fn with_defaults() -> GuardianResult<Self> {
        Self::new(
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            Some(DEFAULT_IGNORE_FILE.to_string()),
        )
    }

    /// Stop honouring per-directory ignore files
    pub fn without_ignore_files(mut self) -> Self {
        self.ignore_filename = None;
        self
    }

    /// Add a pattern to the filter
    pub fn add_pattern(&mut self, pattern: &str) -> GuardianResult<()> {
        let parsed = FilterPattern::parse(pattern)
            .map_err(|e| GuardianError::pattern(format!("Invalid pattern '{pattern}': {e}")))?;
        self.patterns.push(parsed);
        Ok(())
    }

    /// Check configured patterns only
    pub fn matches_patterns(&self, relative: &Path) -> bool {
        let mut include = true;
        for pattern in &self.patterns {
            if pattern.matches(relative) {
                include = pattern.is_include;
            }
        }
        include
    }

    /// Check configured patterns, then ignore files between `root` and the file
    pub fn should_analyze(&self, root: &Path, relative: &Path, cache: &mut IgnoreCache) -> bool {
        if !self.matches_patterns(relative) {
            return false;
        }
        match &self.ignore_filename {
            Some(name) => !self.is_ignored_by_files(root, relative, name, cache),
            None => true,
        }
    }

    fn is_ignored_by_files(
        &self,
        root: &Path,
        relative: &Path,
        ignore_filename: &str,
        cache: &mut IgnoreCache,
    ) -> bool {
        let mut dirs: Vec<&Path> = relative.ancestors().skip(1).collect();
        // Outermost first so deeper ignore files override
        dirs.reverse();

        let mut ignored = false;
        for dir in dirs {
            let patterns = cache
                .entry(dir.to_path_buf())
                .or_insert_with(|| load_ignore_file(&root.join(dir).join(ignore_filename)));

            let Ok(within) = relative.strip_prefix(dir) else {
                continue;
            };
            for pattern in patterns.iter() {
                if pattern.matches(within) {
                    ignored = !pattern.is_include;
                }
            }
        }
        ignored
    }
}

/// Load patterns from an ignore file; a missing file yields no patterns
fn load_ignore_file(path: &Path) -> Vec<FilterPattern> {
    if !path.is_file() {
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Cannot read ignore file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match FilterPattern::parse(line) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Invalid pattern '{}' in {}: {}", line, path.display(), e);
                None
            }
        })
        .collect()
}

/// Render a relative path with `/` separators on every platform
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
