//! Core domain models for zero-value violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are structured records, rendered only at the edge
//! - A violation knows its location, its marker kind and the qualified type it concerns
//! - ValidationReport is the aggregate for one marker kind; `None` means nothing to validate
//! - GuardianReport collects per-kind outcomes for a whole run

use crate::domain::declarations::{ConstructorKey, ConstructorRecord, QualifiedName};
use crate::domain::markers::MarkerDefinition;
use crate::syntax::ast::Line;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Severity levels for violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational findings
    Info,
    /// Findings that should be addressed but don't block builds
    Warning,
    /// Findings that fail the check
    Error,
}

impl Severity {
    /// Whether this severity level should cause validation to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A zero-value construction of a marked type outside its constructor.
///
/// Field order drives the derived ordering: file, line, then type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// File path relative to the validated root
    pub file_path: PathBuf,
    /// Line (1-indexed) where the literal starts
    pub line_number: Line,
    /// The marked type constructed
    pub type_name: QualifiedName,
    /// Marker kind that classified the type (`ValueObject`, `Entity`, ...)
    pub kind: String,
    pub severity: Severity,
}

impl Violation {
    pub fn new(
        marker: &MarkerDefinition,
        type_name: QualifiedName,
        file_path: PathBuf,
        line_number: Line,
    ) -> Self {
        Self {
            file_path,
            line_number,
            type_name,
            kind: marker.kind.clone(),
            severity: marker.severity,
        }
    }

    /// Whether this violation is blocking
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Short description without the location
    pub fn message(&self) -> String {
        format!(
            "Direct zero-value initialization of {} {}",
            self.kind, self.type_name
        )
    }

    /// Hint pointing at the sanctioned way to build the value
    pub fn suggestion(&self) -> String {
        format!(
            "Build {} through its New{} constructor, or initialize at least one field",
            self.type_name.name, self.type_name.name
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VIOLATION: {} {} at {}:{}",
            self.kind,
            self.type_name,
            self.file_path.display(),
            self.line_number
        )
    }
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Result of validating one marker kind over a tree that has marked types
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub marker: MarkerDefinition,
    pub types: BTreeSet<QualifiedName>,
    pub constructors: BTreeMap<ConstructorKey, ConstructorRecord>,
    pub violations: BTreeSet<Violation>,
}

impl ValidationReport {
    /// Combine phase outputs; `None` when the tree has no types carrying the marker
    pub fn assemble(
        marker: &MarkerDefinition,
        types: BTreeSet<QualifiedName>,
        constructors: BTreeMap<ConstructorKey, ConstructorRecord>,
        violations: BTreeSet<Violation>,
    ) -> Option<Self> {
        if types.is_empty() {
            return None;
        }
        Some(Self {
            marker: marker.clone(),
            types,
            constructors,
            violations,
        })
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains blocking violations
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_blocking)
    }

    pub fn counts(&self) -> ViolationCounts {
        let mut counts = ViolationCounts::default();
        for violation in &self.violations {
            counts.add(violation.severity);
        }
        counts
    }

    /// Constructors recorded for one type
    pub fn constructors_for<'a>(
        &'a self,
        type_name: &'a QualifiedName,
    ) -> impl Iterator<Item = (&'a ConstructorKey, &'a ConstructorRecord)> + 'a {
        self.constructors
            .iter()
            .filter(move |(key, _)| &key.produced == type_name)
    }

    /// Violations rendered as `VIOLATION: <kind> <type> at <file>:<line>`
    pub fn rendered_violations(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

/// What one marker kind produced during a run
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOutcome {
    pub marker: MarkerDefinition,
    /// `None` when the tree has no types of this kind
    pub report: Option<ValidationReport>,
}

impl MarkerOutcome {
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.report.iter().flat_map(|r| r.violations.iter())
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of source files parsed and analyzed
    pub total_files: usize,
    /// Number of source files dropped because they failed to parse
    pub skipped_files: usize,
    /// Number of marked types across all kinds
    pub total_types: usize,
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    pub validated_at: DateTime<Utc>,
}

/// All marker outcomes for one validated root
#[derive(Debug, Clone)]
pub struct GuardianReport {
    pub root: PathBuf,
    pub outcomes: Vec<MarkerOutcome>,
    pub summary: ValidationSummary,
}

impl GuardianReport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            outcomes: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
        }
    }

    pub fn add_outcome(&mut self, outcome: MarkerOutcome) {
        if let Some(report) = &outcome.report {
            self.summary.total_types += report.types.len();
            for violation in &report.violations {
                self.summary.violations_by_severity.add(violation.severity);
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn outcome(&self, kind: &str) -> Option<&MarkerOutcome> {
        self.outcomes.iter().find(|o| o.marker.kind == kind)
    }

    /// Report for a kind, `None` when the kind was not run or found no types
    pub fn report(&self, kind: &str) -> Option<&ValidationReport> {
        self.outcome(kind).and_then(|o| o.report.as_ref())
    }

    /// Every violation across kinds, sorted by location
    pub fn violations(&self) -> Vec<&Violation> {
        let mut all: Vec<_> = self.outcomes.iter().flat_map(|o| o.violations()).collect();
        all.sort();
        all
    }

    pub fn has_violations(&self) -> bool {
        self.summary.violations_by_severity.total() > 0
    }

    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Whether no kind found any marked type
    pub fn is_empty(&self) -> bool {
        self.outcomes.iter().all(|o| o.report.is_none())
    }

    pub fn set_files_analyzed(&mut self, total: usize, skipped: usize) {
        self.summary.total_files = total;
        self.summary.skipped_files = skipped;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }
}

/// Error types that can occur during validation
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Pattern compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// The validation root could not be enumerated
    #[error("Cannot read root {}: {source}", path.display())]
    RootAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No project marker file above the search origin
    #[error("No {marker} found in {} or any parent directory", origin.display())]
    ProjectRoot { origin: PathBuf, marker: String },

    /// The caller cancelled validation between phases
    #[error("Validation cancelled")]
    Cancelled,

    /// Validation operation failed
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl GuardianError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    pub fn root_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RootAccess {
            path: path.into(),
            source,
        }
    }

    pub fn project_root(origin: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self::ProjectRoot {
            origin: origin.into(),
            marker: marker.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type for Guardian operations
pub type GuardianResult<T> = Result<T, GuardianError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn money() -> QualifiedName {
        QualifiedName::new("example.com/shop", "Money")
    }

    fn violation(file: &str, line: Line) -> Violation {
        Violation::new(
            &MarkerDefinition::value_object(),
            money(),
            PathBuf::from(file),
            line,
        )
    }

    #[test]
    fn test_violation_rendering() {
        let v = violation("shop/money.go", 12);
        assert_eq!(
            v.to_string(),
            "VIOLATION: ValueObject example.com/shop.Money at shop/money.go:12"
        );
        assert!(v.is_blocking());
        assert!(v.message().contains("zero-value"));
    }

    #[test]
    fn test_duplicate_violations_collapse() {
        let mut set = BTreeSet::new();
        set.insert(violation("a.go", 3));
        set.insert(violation("a.go", 3));
        set.insert(violation("a.go", 1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().map(|v| v.line_number), Some(1));
    }

    #[test]
    fn test_assemble_signals_no_types() {
        let marker = MarkerDefinition::entity();
        let none = ValidationReport::assemble(
            &marker,
            BTreeSet::new(),
            BTreeMap::new(),
            BTreeSet::new(),
        );
        assert!(none.is_none());

        let some = ValidationReport::assemble(
            &marker,
            BTreeSet::from([money()]),
            BTreeMap::new(),
            BTreeSet::new(),
        )
        .unwrap();
        assert!(!some.has_violations());
        assert!(!some.has_errors());
    }

    #[test]
    fn test_guardian_report_counts() {
        let marker = MarkerDefinition::value_object();
        let report = ValidationReport::assemble(
            &marker,
            BTreeSet::from([money()]),
            BTreeMap::new(),
            BTreeSet::from([violation("b.go", 2), violation("a.go", 9)]),
        );
        let mut guardian = GuardianReport::new("/tmp/project");
        guardian.add_outcome(MarkerOutcome { marker, report });
        guardian.add_outcome(MarkerOutcome {
            marker: MarkerDefinition::command(),
            report: None,
        });

        assert!(guardian.has_errors());
        assert!(!guardian.is_empty());
        assert_eq!(guardian.summary.violations_by_severity.error, 2);
        assert_eq!(guardian.summary.total_types, 1);
        let files: Vec<_> = guardian
            .violations()
            .iter()
            .map(|v| v.file_path.clone())
            .collect();
        assert_eq!(files, [PathBuf::from("a.go"), PathBuf::from("b.go")]);
        assert!(guardian.report("Command").is_none());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Error.is_blocking());
        assert!(!Severity::Warning.is_blocking());
    }
}
