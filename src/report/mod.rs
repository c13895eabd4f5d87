//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - GuardianReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Violation ordering is imposed here, never relied upon in the engine

use crate::domain::violations::{
    GuardianError, GuardianReport, GuardianResult, MarkerOutcome, Severity, Violation,
};
use colored::Colorize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const TOOL_NAME: &str = "domain-guardian";

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI/CD integration
    Junit,
    /// SARIF format for code scanning tools
    Sarif,
    /// GitHub Actions workflow commands
    GitHub,
}

impl OutputFormat {
    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "junit", "sarif", "github"]
    }
}

impl FromStr for OutputFormat {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "junit" => Ok(Self::Junit),
            "sarif" => Ok(Self::Sarif),
            "github" => Ok(Self::GitHub),
            other => Err(GuardianError::config(format!(
                "Unknown output format '{}'. Available: {}",
                other,
                Self::all_formats().join(", ")
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Junit => "junit",
            Self::Sarif => "sarif",
            Self::GitHub => "github",
        };
        f.write_str(name)
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// List marked types and their constructors per kind (human format)
    pub show_declarations: bool,
    /// Whether to show violation suggestions
    pub show_suggestions: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_declarations: false,
            show_suggestions: true,
            max_violations: None,
            min_severity: None,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a report in the specified format
    pub fn format_report(&self, report: &GuardianReport, format: OutputFormat) -> GuardianResult<String> {
        let violations = self.filter_violations(report.violations());

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &violations)),
            OutputFormat::Json => self.format_json(report, &violations),
            OutputFormat::Junit => Ok(self.format_junit(report, &violations)),
            OutputFormat::Sarif => self.format_sarif(report, &violations),
            OutputFormat::GitHub => Ok(self.format_github(&violations)),
        }
    }

    /// Write a formatted report to a writer, newline-terminated
    pub fn write_report<W: Write>(
        &self,
        report: &GuardianReport,
        format: OutputFormat,
        mut writer: W,
    ) -> GuardianResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        if !formatted.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Filter violations based on report options; input is already sorted by location
    fn filter_violations<'a>(&self, violations: Vec<&'a Violation>) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> = violations
            .into_iter()
            .filter(|v| self.options.min_severity.is_none_or(|min| v.severity >= min))
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    fn paint(&self, text: &str, severity: Severity) -> String {
        if !self.options.use_colors {
            return text.to_string();
        }
        match severity {
            Severity::Error => text.red().to_string(),
            Severity::Warning => text.yellow().to_string(),
            Severity::Info => text.cyan().to_string(),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.options.use_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &GuardianReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        if violations.is_empty() {
            let text = if report.is_empty() {
                "No marked domain types found"
            } else {
                "No zero-value violations found"
            };
            if self.options.use_colors {
                output.push_str(&format!("✅ {}\n", text.green()));
            } else {
                output.push_str(&format!("✅ {text}\n"));
            }
        } else {
            let (icon, severity) = if report.has_errors() {
                ("❌", Severity::Error)
            } else {
                ("⚠️", Severity::Warning)
            };
            output.push_str(&format!(
                "{} {}\n\n",
                icon,
                self.paint("Zero-Value Violations Found", severity)
            ));

            let mut by_file: BTreeMap<&Path, Vec<&Violation>> = BTreeMap::new();
            for violation in violations {
                by_file.entry(&violation.file_path).or_default().push(violation);
            }

            for (file_path, file_violations) in by_file {
                output.push_str(&format!("📁 {}\n", file_path.display()));

                for violation in file_violations {
                    output.push_str(&format!(
                        "  {} [{}] {}\n",
                        self.dim(&format!("{}:{}", violation.line_number, violation.kind)),
                        self.paint(violation.severity.as_str(), violation.severity),
                        violation.message()
                    ));

                    if self.options.show_suggestions {
                        let hint = format!("💡 {}", violation.suggestion());
                        if self.options.use_colors {
                            output.push_str(&format!("    {}\n", hint.green()));
                        } else {
                            output.push_str(&format!("    {hint}\n"));
                        }
                    }
                }
                output.push('\n');
            }
        }

        if self.options.show_declarations {
            for outcome in &report.outcomes {
                output.push_str(&self.format_declarations(outcome));
            }
            output.push('\n');
        }

        output.push_str(&self.format_summary(report));
        output
    }

    fn format_declarations(&self, outcome: &MarkerOutcome) -> String {
        let Some(report) = &outcome.report else {
            return format!("{}: no marked types\n", outcome.marker.kind);
        };

        let mut out = format!(
            "{}: {} types, {} constructors\n",
            outcome.marker.kind,
            report.types.len(),
            report.constructors.len()
        );
        for type_name in &report.types {
            let constructors: Vec<String> = report
                .constructors_for(type_name)
                .map(|(key, record)| {
                    format!(
                        "{} ({}:{}-{})",
                        key.function,
                        record.file.display(),
                        record.start_line,
                        record.end_line
                    )
                })
                .collect();
            let listed = if constructors.is_empty() {
                self.dim("no constructor")
            } else {
                constructors.join(", ")
            };
            out.push_str(&format!("  {type_name} <- {listed}\n"));
        }
        out
    }

    /// Format report in JSON format
    fn format_json(&self, report: &GuardianReport, violations: &[&Violation]) -> GuardianResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "kind": v.kind,
                    "type": v.type_name.to_string(),
                    "severity": v.severity.as_str(),
                    "file_path": v.file_path.display().to_string(),
                    "line_number": v.line_number,
                    "message": v.message(),
                    "suggestion": v.suggestion(),
                })
            })
            .collect();

        let markers: Vec<JsonValue> = report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.report {
                None => serde_json::json!({
                    "kind": outcome.marker.kind,
                    "package": outcome.marker.package,
                    "types": null,
                }),
                Some(r) => serde_json::json!({
                    "kind": outcome.marker.kind,
                    "package": outcome.marker.package,
                    "types": r.types.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "constructors": r.constructors.iter().map(|(key, record)| serde_json::json!({
                        "function": key.function,
                        "type": key.produced.to_string(),
                        "file_path": record.file.display().to_string(),
                        "start_line": record.start_line,
                        "end_line": record.end_line,
                    })).collect::<Vec<_>>(),
                    "violation_count": r.violations.len(),
                }),
            })
            .collect();

        let summary = &report.summary;
        let json_report = serde_json::json!({
            "root": report.root.display().to_string(),
            "violations": json_violations,
            "markers": markers,
            "summary": {
                "total_files": summary.total_files,
                "skipped_files": summary.skipped_files,
                "total_types": summary.total_types,
                "violations_by_severity": {
                    "error": summary.violations_by_severity.error,
                    "warning": summary.violations_by_severity.warning,
                    "info": summary.violations_by_severity.info
                },
                "execution_time_ms": summary.execution_time_ms,
                "validated_at": summary.validated_at.to_rfc3339()
            }
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| GuardianError::validation(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format, one test case per marker kind
    fn format_junit(&self, report: &GuardianReport, violations: &[&Violation]) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let failures = report
            .outcomes
            .iter()
            .filter(|o| violations.iter().any(|v| v.kind == o.marker.kind && v.is_blocking()))
            .count();
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        xml.push_str(&format!(
            "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
            TOOL_NAME,
            report.outcomes.len(),
            failures,
            execution_time
        ));

        for outcome in &report.outcomes {
            let kind = &outcome.marker.kind;
            xml.push_str(&format!(
                "  <testcase classname=\"{}\" name=\"{}\">\n",
                TOOL_NAME,
                escape_xml(kind)
            ));

            let own: Vec<&&Violation> = violations.iter().filter(|v| &v.kind == kind).collect();
            if outcome.report.is_none() {
                xml.push_str("    <skipped message=\"no marked types\"/>\n");
            } else if own.iter().any(|v| v.is_blocking()) {
                xml.push_str(&format!(
                    "    <failure message=\"{} zero-value violations\">\n",
                    own.len()
                ));
                for violation in own {
                    xml.push_str(&format!("      {}\n", escape_xml(&violation.to_string())));
                }
                xml.push_str("    </failure>\n");
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Format report in SARIF 2.1.0 format
    fn format_sarif(&self, report: &GuardianReport, violations: &[&Violation]) -> GuardianResult<String> {
        let rules: Vec<JsonValue> = report
            .outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "id": rule_id(&o.marker.kind),
                    "shortDescription": {
                        "text": format!("Zero-value construction of a {}", o.marker.kind)
                    },
                    "fullDescription": {
                        "text": o.marker.description.clone().unwrap_or_else(|| o.marker.to_string())
                    }
                })
            })
            .collect();

        let results: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                let level = match v.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "note",
                };

                serde_json::json!({
                    "ruleId": rule_id(&v.kind),
                    "level": level,
                    "message": {
                        "text": v.message()
                    },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": crate::tree::slash_path(&v.file_path)
                            },
                            "region": {
                                "startLine": v.line_number
                            }
                        }
                    }]
                })
            })
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": TOOL_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": rules
                    }
                },
                "results": results
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map_err(|e| GuardianError::validation(format!("SARIF serialization failed: {e}")))
    }

    /// Format report as GitHub Actions workflow commands
    fn format_github(&self, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };

            output.push_str(&format!(
                "::{} file={},line={},title={}::{}\n",
                level,
                crate::tree::slash_path(&violation.file_path),
                violation.line_number,
                rule_id(&violation.kind),
                violation.message()
            ));
        }

        output
    }

    /// Format the summary section
    fn format_summary(&self, report: &GuardianReport) -> String {
        let summary = &report.summary;
        let counts = &summary.violations_by_severity;
        let execution_time = (summary.execution_time_ms as f64) / 1000.0;

        let label = if self.options.use_colors {
            "Summary:".bold().to_string()
        } else {
            "Summary:".to_string()
        };

        let findings = if counts.total() == 0 {
            let text = "0 violations";
            if self.options.use_colors {
                text.green().to_string()
            } else {
                text.to_string()
            }
        } else {
            let mut parts = Vec::new();
            for (count, severity, noun) in [
                (counts.error, Severity::Error, "error"),
                (counts.warning, Severity::Warning, "warning"),
                (counts.info, Severity::Info, "info"),
            ] {
                if count > 0 {
                    let plural = if count == 1 || severity == Severity::Info { "" } else { "s" };
                    parts.push(self.paint(&format!("{count} {noun}{plural}"), severity));
                }
            }
            parts.join(", ")
        };

        let skipped = if summary.skipped_files > 0 {
            format!(", {} unparseable", summary.skipped_files)
        } else {
            String::new()
        };

        format!(
            "📊 {} {} across {} marked types in {} files{} ({:.1}s)\n",
            label, findings, summary.total_types, summary.total_files, skipped, execution_time
        )
    }
}

fn rule_id(kind: &str) -> String {
    format!("zero-value/{}", kind.to_lowercase())
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::declarations::{ConstructorKey, ConstructorRecord, QualifiedName};
    use crate::domain::markers::MarkerDefinition;
    use crate::domain::violations::ValidationReport;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    fn create_test_report() -> GuardianReport {
        let marker = MarkerDefinition::value_object();
        let money = QualifiedName::new("example.com/shop/money", "Money");

        let record = ConstructorRecord {
            produced: money.clone(),
            file: PathBuf::from("money/money.go"),
            start_line: 10,
            end_line: 14,
        };
        let key = ConstructorKey {
            file: record.file.clone(),
            function: "NewMoney".to_string(),
            produced: money.clone(),
        };
        let violations = BTreeSet::from([
            Violation::new(&marker, money.clone(), PathBuf::from("money/money.go"), 16),
            Violation::new(&marker, money.clone(), PathBuf::from("billing/<a>.go"), 3),
        ]);

        let mut report = GuardianReport::new("/work/shop");
        report.add_outcome(MarkerOutcome {
            report: ValidationReport::assemble(
                &marker,
                BTreeSet::from([money]),
                BTreeMap::from([(key, record)]),
                violations,
            ),
            marker,
        });
        report.add_outcome(MarkerOutcome {
            marker: MarkerDefinition::entity().with_severity(Severity::Warning),
            report: None,
        });
        report.set_files_analyzed(12, 1);
        report.set_execution_time(1200);
        report
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_format_names() {
        for name in OutputFormat::all_formats() {
            let format: OutputFormat = name.parse().unwrap();
            assert_eq!(&format.to_string(), name);
        }
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }

    #[test]
    fn test_write_report_terminates_output() {
        let report = create_test_report();
        for format in [OutputFormat::Json, OutputFormat::GitHub] {
            let mut out = Vec::new();
            plain().write_report(&report, format, &mut out).unwrap();
            let written = String::from_utf8(out).unwrap();
            let formatted = plain().format_report(&report, format).unwrap();
            assert!(written.starts_with(&formatted));
            assert!(written.ends_with('\n'));
            assert!(!written.ends_with("\n\n"));
        }
    }

    #[test]
    fn test_human_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::Human)
            .unwrap();

        assert!(output.contains("Zero-Value Violations Found"));
        assert!(output.contains("📁 money/money.go"));
        assert!(output.contains("16:ValueObject [error]"));
        assert!(output.contains("Build Money through its NewMoney constructor"));
        assert!(output.contains("Summary: 2 errors across 1 marked types in 12 files, 1 unparseable"));

        let billing = output.find("billing/").unwrap();
        let money = output.find("money/money.go").unwrap();
        assert!(billing < money);
    }

    #[test]
    fn test_human_declarations() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            show_declarations: true,
            ..Default::default()
        });
        let output = formatter
            .format_report(&create_test_report(), OutputFormat::Human)
            .unwrap();

        assert!(output.contains("ValueObject: 1 types, 1 constructors"));
        assert!(output.contains("example.com/shop/money.Money <- NewMoney (money/money.go:10-14)"));
        assert!(output.contains("Entity: no marked types"));
    }

    #[test]
    fn test_json_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Json)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        let violations = json["violations"].as_array().unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1]["type"], "example.com/shop/money.Money");
        assert_eq!(violations[1]["line_number"], 16);
        assert_eq!(json["summary"]["total_files"], 12);
        assert_eq!(json["markers"][0]["constructors"][0]["function"], "NewMoney");
        assert!(json["markers"][1]["types"].is_null());
    }

    #[test]
    fn test_junit_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Junit)
            .unwrap();

        assert!(output.contains("<?xml version=\"1.0\""));
        assert!(output.contains("tests=\"2\" failures=\"1\""));
        assert!(output.contains("<failure message=\"2 zero-value violations\">"));
        assert!(output.contains("billing/&lt;a&gt;.go"));
        assert!(output.contains("<skipped message=\"no marked types\"/>"));
    }

    #[test]
    fn test_sarif_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Sarif)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["version"], "2.1.0");
        let run = &json["runs"][0];
        assert_eq!(run["tool"]["driver"]["rules"].as_array().unwrap().len(), 2);
        assert_eq!(run["results"][0]["ruleId"], "zero-value/valueobject");
        assert_eq!(
            run["results"][1]["locations"][0]["physicalLocation"]["region"]["startLine"],
            16
        );
    }

    #[test]
    fn test_github_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();

        assert!(output.contains(
            "::error file=money/money.go,line=16,title=zero-value/valueobject::Direct zero-value initialization of ValueObject example.com/shop/money.Money"
        ));
    }

    #[test]
    fn test_empty_report() {
        let mut report = GuardianReport::new("/work/empty");
        report.add_outcome(MarkerOutcome {
            marker: MarkerDefinition::value_object(),
            report: None,
        });
        let output = plain().format_report(&report, OutputFormat::Human).unwrap();
        assert!(output.contains("No marked domain types found"));
        assert!(output.contains("0 violations"));
    }

    #[test]
    fn test_violation_limits() {
        let formatter = ReportFormatter::new(ReportOptions {
            max_violations: Some(1),
            ..Default::default()
        });
        let output = formatter
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();
        assert_eq!(output.lines().count(), 1);

        let formatter = ReportFormatter::new(ReportOptions {
            min_severity: Some(Severity::Error),
            ..Default::default()
        });
        let mut report = create_test_report();
        report.outcomes[0].marker.severity = Severity::Warning;
        if let Some(r) = report.outcomes[0].report.as_mut() {
            r.violations = r
                .violations
                .iter()
                .cloned()
                .map(|mut v| {
                    v.severity = Severity::Warning;
                    v
                })
                .collect();
        }
        let output = formatter.format_report(&report, OutputFormat::GitHub).unwrap();
        assert!(output.is_empty());
    }
}
