//! Domain Guardian - Zero-value construction checks for DDD domain objects in Go
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Marker kinds are data; one engine validates every kind
//! - The source tree is parsed once and shared read-only by all kinds
//! - Presentation and configuration stay at the edges

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod report;
pub mod syntax;
pub mod tree;

// Re-export main types for convenient access
pub use domain::declarations::{ConstructorKey, ConstructorRecord, QualifiedName};
pub use domain::markers::MarkerDefinition;
pub use domain::violations::{
    GuardianError, GuardianReport, GuardianResult, MarkerOutcome, Severity, ValidationReport,
    ValidationSummary, Violation, ViolationCounts,
};

pub use config::{ConfigBuilder, GuardianConfig};

pub use analyzer::{AnalysisOptions, Analyzer, Cancellation};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use tree::{find_project_root, SourceTree};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main Guardian validator providing high-level validation operations
#[derive(Debug, Clone)]
pub struct GuardianValidator {
    config: GuardianConfig,
    analyzer: Analyzer,
    report_formatter: ReportFormatter,
}

/// Options for a whole-tree validation run
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Marker kinds to run; empty runs every enabled kind
    pub kinds: Vec<String>,
    /// Analysis options
    pub analysis_options: AnalysisOptions,
}

impl GuardianValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: GuardianConfig) -> GuardianResult<Self> {
        config.validate()?;
        let analyzer = Analyzer::new(&config)?;

        Ok(Self {
            config,
            analyzer,
            report_formatter: ReportFormatter::default(),
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> GuardianResult<Self> {
        Self::new_with_config(GuardianConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let config = GuardianConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Use the config file found in `dir`, or defaults when there is none
    pub fn discover(dir: &Path) -> GuardianResult<Self> {
        match GuardianConfig::find_in(dir) {
            Some(path) => {
                tracing::debug!("Using configuration {}", path.display());
                Self::from_config_file(path)
            }
            None => Self::new(),
        }
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    /// Validate one marker kind; `Ok(None)` when the tree has no types of that kind
    pub fn validate<P: AsRef<Path>>(
        &self,
        marker: &MarkerDefinition,
        root: P,
    ) -> GuardianResult<Option<ValidationReport>> {
        self.analyzer.validate(marker, root.as_ref())
    }

    /// Validate every selected marker kind over the tree under `root`
    pub fn validate_all<P: AsRef<Path>>(
        &self,
        root: P,
        options: &ValidationOptions,
    ) -> GuardianResult<GuardianReport> {
        self.validate_all_with_cancel(root, options, &Cancellation::new())
    }

    /// Like `validate_all`, stopping with `Cancelled` at the next phase boundary once cancelled
    pub fn validate_all_with_cancel<P: AsRef<Path>>(
        &self,
        root: P,
        options: &ValidationOptions,
        cancel: &Cancellation,
    ) -> GuardianResult<GuardianReport> {
        let root = root.as_ref();
        let start_time = Instant::now();
        let markers = self.select_markers(&options.kinds)?;

        let analyzer = Analyzer::with_options(&self.config, &options.analysis_options)?;
        let tree = analyzer.load_tree(root)?;
        let outcomes = analyzer.validate_markers(&markers, &tree, cancel)?;

        let mut report = GuardianReport::new(root);
        for outcome in outcomes {
            report.add_outcome(outcome);
        }
        report.set_files_analyzed(tree.len(), tree.skipped.len());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);

        tracing::info!(
            "Validated {} marker kinds over {} files: {} violations",
            markers.len(),
            tree.len(),
            report.summary.violations_by_severity.total()
        );
        Ok(report)
    }

    /// Run `validate_all` on tokio's blocking pool
    pub async fn validate_async(
        &self,
        root: PathBuf,
        options: ValidationOptions,
    ) -> GuardianResult<GuardianReport> {
        let validator = self.clone();
        tokio::task::spawn_blocking(move || validator.validate_all(&root, &options))
            .await
            .map_err(|e| GuardianError::validation(format!("Validation task failed: {e}")))?
    }

    /// Format a report for output
    pub fn format_report(&self, report: &GuardianReport, format: OutputFormat) -> GuardianResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Write a formatted report to `writer`
    pub fn write_report<W: Write>(
        &self,
        report: &GuardianReport,
        format: OutputFormat,
        writer: W,
    ) -> GuardianResult<()> {
        self.report_formatter.write_report(report, format, writer)
    }

    /// Enabled markers, or the named ones (case-insensitive) when `kinds` is non-empty
    fn select_markers(&self, kinds: &[String]) -> GuardianResult<Vec<MarkerDefinition>> {
        if kinds.is_empty() {
            return Ok(self.config.enabled_markers().cloned().collect());
        }

        kinds
            .iter()
            .map(|kind| {
                self.config.marker(kind).cloned().ok_or_else(|| {
                    let known: Vec<&str> =
                        self.config.markers.iter().map(|m| m.kind.as_str()).collect();
                    GuardianError::config(format!(
                        "Unknown marker kind '{}'. Known kinds: {}",
                        kind,
                        known.join(", ")
                    ))
                })
            })
            .collect()
    }
}

/// Validate one marker kind over `root` with default settings
pub fn validate<P: AsRef<Path>>(
    marker: &MarkerDefinition,
    root: P,
) -> GuardianResult<Option<ValidationReport>> {
    Analyzer::with_defaults()?.validate(marker, root.as_ref())
}

/// Convenience function to validate every built-in kind with default settings
pub fn validate_directory<P: AsRef<Path>>(directory: P) -> GuardianResult<GuardianReport> {
    GuardianValidator::new()?.validate_all(directory, &ValidationOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::markers::{ENTITY_PACKAGE, VALUE_OBJECT_PACKAGE};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn shop() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "go.mod", "module example.com/shop\n\ngo 1.22\n");
        write(
            root,
            "money/money.go",
            &format!(
                r#"package money

import "{VALUE_OBJECT_PACKAGE}"

type Money struct {{
    amount int
    _      valueobject.ValueObject
}}

func NewMoney(a int) Money {{
    return Money{{amount: a}}
}}

var bad = Money{{}}
"#
            ),
        );
        write(
            root,
            "orders/order.go",
            &format!(
                r#"package orders

import ent "{ENTITY_PACKAGE}"

type Order struct {{
    _ ent.Entity
}}

func NewOrder() Order {{
    return Order{{}}
}}
"#
            ),
        );
        temp
    }

    #[test]
    fn test_free_validate_uses_builtin_markers() -> GuardianResult<()> {
        let temp = shop();
        let report = validate(&MarkerDefinition::value_object(), temp.path())?
            .expect("Money is a value object");

        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| (v.file_path.clone(), v.line_number))
            .collect();
        assert_eq!(violations, [(PathBuf::from("money/money.go"), 14)]);

        assert!(validate(&MarkerDefinition::command(), temp.path())?.is_none());
        Ok(())
    }

    #[test]
    fn test_validate_all_collects_every_kind() -> GuardianResult<()> {
        let temp = shop();
        let report = validate_directory(temp.path())?;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.summary.total_types, 2);
        assert!(report.has_errors());
        assert!(report.report("Entity").is_some_and(|r| !r.has_violations()));
        assert!(report.report("Aggregate").is_none());
        assert_eq!(report.violations().len(), 1);
        Ok(())
    }

    #[test]
    fn test_selected_kinds_only() -> GuardianResult<()> {
        let temp = shop();
        let validator = GuardianValidator::new()?;
        let options = ValidationOptions {
            kinds: vec!["entity".to_string()],
            ..Default::default()
        };
        let report = validator.validate_all(temp.path(), &options)?;

        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.has_violations());

        let options = ValidationOptions {
            kinds: vec!["Repository".to_string()],
            ..Default::default()
        };
        let err = validator.validate_all(temp.path(), &options).unwrap_err();
        assert!(err.to_string().contains("Unknown marker kind 'Repository'"));
        Ok(())
    }

    #[test]
    fn test_discover_reads_project_config() -> GuardianResult<()> {
        let temp = shop();
        write(
            temp.path(),
            "domain_guardian.yaml",
            "version: \"1.0\"\npaths:\n  patterns:\n    - \"money/\"\n",
        );

        let validator = GuardianValidator::discover(temp.path())?;
        let report = validator.validate_all(temp.path(), &ValidationOptions::default())?;
        assert_eq!(report.summary.total_files, 1);
        assert!(!report.has_violations());
        Ok(())
    }

    #[test]
    fn test_cancelled_run() -> GuardianResult<()> {
        let temp = shop();
        let cancel = Cancellation::new();
        cancel.cancel();
        let result = GuardianValidator::new()?.validate_all_with_cancel(
            temp.path(),
            &ValidationOptions::default(),
            &cancel,
        );
        assert!(matches!(result, Err(GuardianError::Cancelled)));
        Ok(())
    }

    #[test]
    fn test_report_formatting() -> GuardianResult<()> {
        let temp = shop();
        let validator = GuardianValidator::new()?.with_report_formatter(ReportFormatter::new(
            ReportOptions {
                use_colors: false,
                ..Default::default()
            },
        ));
        let report = validator.validate_all(temp.path(), &ValidationOptions::default())?;

        let human = validator.format_report(&report, OutputFormat::Human)?;
        assert!(human.contains("Zero-Value Violations Found"));

        let mut json = Vec::new();
        validator.write_report(&report, OutputFormat::Json, &mut json)?;
        assert!(json.ends_with(b"\n"));
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["violations"].as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_async() -> GuardianResult<()> {
        let temp = shop();
        let validator = GuardianValidator::new()?;
        let report = validator
            .validate_async(temp.path().to_path_buf(), ValidationOptions::default())
            .await?;
        assert_eq!(report.violations().len(), 1);

        let missing = validator
            .validate_async(temp.path().join("absent"), ValidationOptions::default())
            .await;
        assert!(matches!(missing, Err(GuardianError::RootAccess { .. })));
        Ok(())
    }
}
