//! Marker definitions for DDD domain object kinds
//!
//! Architecture: Value Objects - A marker kind is data, not code
//! - Each definition names the sentinel type a struct embeds as its `_` field
//! - Kinds are evaluated independently; several may share one declaring package
//! - The built-in table covers the dddgo marker packages

use crate::domain::violations::Severity;
use crate::syntax::default_package_name;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaring package of the `ValueObject` marker
pub const VALUE_OBJECT_PACKAGE: &str = "github.com/nobuenhombre/dddgo/pkg/layers/infrastructure/interface-adapters/application/domain/objects/value-object/valueobject";
/// Declaring package of the `Entity` marker
pub const ENTITY_PACKAGE: &str = "github.com/nobuenhombre/dddgo/pkg/layers/infrastructure/interface-adapters/application/domain/objects/entity";
/// Declaring package of the `Aggregate` and `AggregateRoot` markers
pub const AGGREGATE_PACKAGE: &str = "github.com/nobuenhombre/dddgo/pkg/layers/infrastructure/interface-adapters/application/domain/objects/aggregate";
/// Declaring package of the `Command` marker
pub const COMMAND_PACKAGE: &str = "github.com/nobuenhombre/dddgo/pkg/layers/infrastructure/interface-adapters/application/objects/commands";

/// The blank identifier, used as the marker field name by every built-in kind
pub const BLANK_FIELD: &str = "_";

/// How one kind of domain object is recognized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerDefinition {
    /// Kind name used in reports (`ValueObject`, `Entity`, ...)
    pub kind: String,
    /// Import path of the package declaring the marker type
    pub package: String,
    /// Name the package is referred to by when imported without an alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Name of the marker field inside the struct
    #[serde(default = "default_marker_field")]
    pub field: String,
    /// Name of the marker type inside `package`
    pub type_name: String,
    /// Severity assigned to violations of this kind
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MarkerDefinition {
    /// Create a definition using the blank marker field and error severity
    pub fn new(
        kind: impl Into<String>,
        package: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            package: package.into(),
            package_name: None,
            field: BLANK_FIELD.to_string(),
            type_name: type_name.into(),
            severity: Severity::Error,
            enabled: true,
            description: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Qualifier used in source when the marker package is imported without an alias
    pub fn default_alias(&self) -> &str {
        self.package_name
            .as_deref()
            .unwrap_or_else(|| default_package_name(&self.package))
    }

    pub fn value_object() -> Self {
        Self::new("ValueObject", VALUE_OBJECT_PACKAGE, "ValueObject").with_description(
            "Immutable values compared by content; build them with their New* constructor",
        )
    }

    pub fn entity() -> Self {
        Self::new("Entity", ENTITY_PACKAGE, "Entity")
            .with_description("Objects with identity; build them with their New* constructor")
    }

    pub fn aggregate() -> Self {
        Self::new("Aggregate", AGGREGATE_PACKAGE, "Aggregate")
            .with_description("Consistency boundaries; build them with their New* constructor")
    }

    pub fn aggregate_root() -> Self {
        Self::new("AggregateRoot", AGGREGATE_PACKAGE, "AggregateRoot").with_description(
            "Entry points of an aggregate; build them with their New* constructor",
        )
    }

    pub fn command() -> Self {
        Self::new("Command", COMMAND_PACKAGE, "Command")
            .with_description("Application commands; build them with their New* constructor")
    }

    /// The dddgo marker table
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::value_object(),
            Self::entity(),
            Self::aggregate(),
            Self::aggregate_root(),
            Self::command(),
        ]
    }
}

impl fmt::Display for MarkerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}.{})",
            self.kind,
            self.field,
            self.default_alias(),
            self.type_name
        )
    }
}

fn default_marker_field() -> String {
    BLANK_FIELD.to_string()
}

fn default_severity() -> Severity {
    Severity::Error
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let markers = MarkerDefinition::builtin();
        let kinds: Vec<_> = markers.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(
            kinds,
            ["ValueObject", "Entity", "Aggregate", "AggregateRoot", "Command"]
        );
        assert!(markers.iter().all(|m| m.field == "_" && m.enabled));
        assert!(markers
            .iter()
            .all(|m| m.package.starts_with("github.com/nobuenhombre/dddgo/")));
    }

    #[test]
    fn test_aggregate_root_shares_package() {
        let aggregate = MarkerDefinition::aggregate();
        let root = MarkerDefinition::aggregate_root();
        assert_eq!(aggregate.package, root.package);
        assert_ne!(aggregate.type_name, root.type_name);
    }

    #[test]
    fn test_default_alias() {
        assert_eq!(MarkerDefinition::value_object().default_alias(), "valueobject");
        assert_eq!(MarkerDefinition::command().default_alias(), "commands");

        let custom = MarkerDefinition::new("Thing", "example.com/markers/v2", "Thing");
        assert_eq!(custom.default_alias(), "markers");

        let renamed = custom.with_package_name("mk");
        assert_eq!(renamed.default_alias(), "mk");
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = "kind: Policy\npackage: example.com/ddd/policy\ntype_name: Policy\n";
        let marker: MarkerDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(marker.field, "_");
        assert_eq!(marker.severity, Severity::Error);
        assert!(marker.enabled);
        assert!(marker.package_name.is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MarkerDefinition::entity().to_string(),
            "Entity (_ entity.Entity)"
        );
    }
}
