//! Configuration loading and management for Domain Guardian
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to domain marker definitions
//! - Default configurations are embedded in the domain, not infrastructure
//! - Every field has a default, so a config file only states what it changes

use crate::domain::markers::MarkerDefinition;
use crate::domain::violations::{GuardianError, GuardianResult};
use crate::tree::path_filter::{DEFAULT_EXCLUDES, DEFAULT_IGNORE_FILE};
use crate::tree::{PathFilter, TreeWalker, GO_MOD};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names searched in a project root, in order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "domain_guardian.yaml",
    "domain_guardian.yml",
    ".domain_guardian.yaml",
];

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Main configuration structure for Domain Guardian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Path filtering configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Source conventions of the analyzed language
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Marker kinds to check
    #[serde(default = "MarkerDefinition::builtin")]
    pub markers: Vec<MarkerDefinition>,
}

/// Path filtering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Include/exclude patterns (gitignore-style), relative to the validated root
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Per-directory ignore file name; empty or absent disables ignore files
    #[serde(default)]
    pub ignore_file: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            ignore_file: Some(DEFAULT_IGNORE_FILE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Files whose name ends with this are never analyzed
    #[serde(default = "default_test_file_suffix")]
    pub test_file_suffix: String,
    /// Regex a function name must match to count as a constructor
    #[serde(default = "default_constructor_pattern")]
    pub constructor_pattern: String,
    /// File marking a module or project root
    #[serde(default = "default_project_marker")]
    pub project_marker: String,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
            test_file_suffix: default_test_file_suffix(),
            constructor_pattern: default_constructor_pattern(),
            project_marker: default_project_marker(),
            parallel: true,
        }
    }
}

impl GuardianConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GuardianError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GuardianError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GuardianResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GuardianError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// First config file present in `dir`
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Get default configuration with the built-in marker table
    pub fn with_defaults() -> Self {
        Self {
            version: default_version(),
            paths: PathConfig::default(),
            analysis: AnalysisConfig::default(),
            markers: MarkerDefinition::builtin(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GuardianResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(GuardianError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {}",
                self.version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        self.constructor_regex()?;
        self.path_filter()?;

        if self.analysis.source_extension.is_empty() {
            return Err(GuardianError::config("analysis.source_extension is empty"));
        }
        if self.analysis.project_marker.is_empty() {
            return Err(GuardianError::config("analysis.project_marker is empty"));
        }

        let mut kinds = HashSet::new();
        for marker in &self.markers {
            for (field, value) in [
                ("kind", &marker.kind),
                ("package", &marker.package),
                ("field", &marker.field),
                ("type_name", &marker.type_name),
            ] {
                if value.trim().is_empty() {
                    return Err(GuardianError::config(format!(
                        "Marker '{}' has an empty {}",
                        marker.kind, field
                    )));
                }
            }
            if !kinds.insert(marker.kind.as_str()) {
                return Err(GuardianError::config(format!(
                    "Duplicate marker kind '{}'",
                    marker.kind
                )));
            }
        }

        Ok(())
    }

    /// Compile the constructor naming convention
    pub fn constructor_regex(&self) -> GuardianResult<Regex> {
        Regex::new(&self.analysis.constructor_pattern).map_err(|e| {
            GuardianError::config(format!(
                "Invalid constructor pattern '{}': {}",
                self.analysis.constructor_pattern, e
            ))
        })
    }

    /// Build the path filter described by `paths`
    pub fn path_filter(&self) -> GuardianResult<PathFilter> {
        let ignore_file = match self.paths.ignore_file.as_deref() {
            None | Some("") => None,
            Some(name) => Some(name.to_string()),
        };
        PathFilter::new(self.paths.patterns.clone(), ignore_file)
    }

    /// Build a tree walker following the configured conventions
    pub fn tree_walker(&self) -> GuardianResult<TreeWalker> {
        Ok(TreeWalker::new(self.path_filter()?)
            .with_source_extension(&self.analysis.source_extension)
            .with_test_file_suffix(&self.analysis.test_file_suffix)
            .with_project_marker(&self.analysis.project_marker)
            .with_parallel(self.analysis.parallel))
    }

    /// Markers that take part in validation
    pub fn enabled_markers(&self) -> impl Iterator<Item = &MarkerDefinition> {
        self.markers.iter().filter(|m| m.enabled)
    }

    /// Look up a marker by kind, ignoring ASCII case
    pub fn marker(&self, kind: &str) -> Option<&MarkerDefinition> {
        self.markers.iter().find(|m| m.kind.eq_ignore_ascii_case(kind))
    }

    /// Convert to YAML for display or as a starting config file
    pub fn to_yaml(&self) -> GuardianResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GuardianError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_source_extension() -> String {
    "go".to_string()
}

fn default_test_file_suffix() -> String {
    "_test.go".to_string()
}

fn default_constructor_pattern() -> String {
    "^New".to_string()
}

fn default_project_marker() -> String {
    GO_MOD.to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: GuardianConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: GuardianConfig::default(),
        }
    }

    /// Add a path pattern
    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.patterns.push(pattern.into());
        self
    }

    /// Set the ignore file name
    pub fn ignore_file(mut self, filename: impl Into<String>) -> Self {
        self.config.paths.ignore_file = Some(filename.into());
        self
    }

    pub fn constructor_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.analysis.constructor_pattern = pattern.into();
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.analysis.parallel = parallel;
        self
    }

    /// Replace the marker table
    pub fn markers(mut self, markers: Vec<MarkerDefinition>) -> Self {
        self.config.markers = markers;
        self
    }

    /// Add a marker kind
    pub fn add_marker(mut self, marker: MarkerDefinition) -> Self {
        self.config.markers.push(marker);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GuardianResult<GuardianConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
