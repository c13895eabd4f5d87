//! Marker detection: which struct declarations carry a marker field
//!
//! A struct is marked when one of its fields has exactly one name, equal to the
//! marker field name, and a type `<q>.<MarkerType>` where `q` is bound to the
//! marker package by the declaring file's own imports.

use crate::analyzer::FilePass;
use crate::domain::declarations::QualifiedName;
use crate::domain::markers::MarkerDefinition;
use crate::syntax::ast::{Expr, Field, TypeSpec};
use crate::syntax::visit::{self, Visit};
use crate::tree::ParsedFile;
use std::collections::BTreeSet;

/// Finds the types carrying one marker
pub struct MarkerDetector<'a> {
    marker: &'a MarkerDefinition,
}

impl<'a> MarkerDetector<'a> {
    pub fn new(marker: &'a MarkerDefinition) -> Self {
        Self { marker }
    }

    fn is_marker_field(&self, field: &Field, aliases: &[&str]) -> bool {
        let [name] = field.names.as_slice() else {
            return false;
        };
        if name.name != self.marker.field {
            return false;
        }
        match &field.ty {
            Expr::Selector { base, sel } => {
                sel.name == self.marker.type_name
                    && matches!(base.as_ref(), Expr::Ident(q) if aliases.contains(&q.name.as_str()))
            }
            _ => false,
        }
    }
}

impl FilePass for MarkerDetector<'_> {
    type Output = BTreeSet<QualifiedName>;

    fn handles_file(&self, file: &ParsedFile) -> bool {
        file.imports.imports(&self.marker.package)
    }

    fn analyze(&self, file: &ParsedFile) -> Self::Output {
        let aliases: Vec<&str> = file
            .imports
            .aliases_of(&self.marker.package, self.marker.default_alias())
            .collect();
        if aliases.is_empty() {
            return BTreeSet::new();
        }

        let mut collector = StructCollector::default();
        collector.visit_file(&file.syntax);

        collector
            .structs
            .into_iter()
            .filter(|(_, fields)| fields.iter().any(|f| self.is_marker_field(f, &aliases)))
            .map(|(spec, _)| QualifiedName::new(file.package_path.as_str(), spec.name.name.as_str()))
            .collect()
    }
}

/// Every struct type declaration in a file, including ones local to function bodies
#[derive(Default)]
struct StructCollector<'ast> {
    structs: Vec<(&'ast TypeSpec, &'ast [Field])>,
}

impl<'ast> Visit<'ast> for StructCollector<'ast> {
    fn visit_type_spec(&mut self, node: &'ast TypeSpec) {
        if let Expr::StructType(fields) = &node.ty {
            self.structs.push((node, fields.as_slice()));
        }
        visit::visit_type_spec(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;
    use std::path::PathBuf;

    const VO: &str = "example.com/ddd/valueobject";

    fn marker() -> MarkerDefinition {
        MarkerDefinition::new("ValueObject", VO, "ValueObject")
    }

    fn detect(marker: &MarkerDefinition, source: &str) -> Vec<String> {
        let file = ParsedFile::new(
            PathBuf::from("shop/money.go"),
            "example.com/shop".to_string(),
            parse_file(source).unwrap(),
        );
        let detector = MarkerDetector::new(marker);
        if !detector.handles_file(&file) {
            return Vec::new();
        }
        detector.analyze(&file).into_iter().map(|q| q.name).collect()
    }

    #[test]
    fn test_unaliased_import() {
        let found = detect(
            &marker(),
            r#"package shop
import "example.com/ddd/valueobject"
type Money struct {
    amount int
    _ valueobject.ValueObject
}
type Plain struct { amount int }
"#,
        );
        assert_eq!(found, ["Money"]);
    }

    #[test]
    fn test_aliased_import() {
        let found = detect(
            &marker(),
            "package shop\nimport vo \"example.com/ddd/valueobject\"\ntype Money struct { _ vo.ValueObject }\n",
        );
        assert_eq!(found, ["Money"]);
    }

    #[test]
    fn test_alias_hides_default_name() {
        let found = detect(
            &marker(),
            "package shop\nimport vo \"example.com/ddd/valueobject\"\ntype Money struct { _ valueobject.ValueObject }\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_requires_import_of_marker_package() {
        let found = detect(
            &marker(),
            "package shop\nimport valueobject \"example.com/other/valueobject\"\ntype Money struct { _ valueobject.ValueObject }\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_unqualified_marker_type_is_ignored() {
        let found = detect(
            &marker(),
            "package shop\nimport vo \"example.com/ddd/valueobject\"\nvar _ vo.ValueObject\ntype ValueObject struct{}\ntype Money struct { _ ValueObject }\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_field_shape_must_match() {
        let found = detect(
            &marker(),
            r#"package shop
import vo "example.com/ddd/valueobject"
type Named struct { m vo.ValueObject }
type Embedded struct { vo.ValueObject }
type Pointer struct { _ *vo.ValueObject }
type Double struct { _, _ vo.ValueObject }
type Padded struct {
    _ [8]byte
    _ vo.ValueObject
}
"#,
        );
        assert_eq!(found, ["Padded"]);
    }

    #[test]
    fn test_local_type_declarations() {
        let found = detect(
            &marker(),
            "package shop\nimport vo \"example.com/ddd/valueobject\"\nfunc f() {\n\ttype Local struct { _ vo.ValueObject }\n}\n",
        );
        assert_eq!(found, ["Local"]);
    }

    #[test]
    fn test_package_name_override() {
        let marker = MarkerDefinition::new("ValueObject", "example.com/ddd/value-object", "ValueObject")
            .with_package_name("valueobject");
        let found = detect(
            &marker,
            "package shop\nimport \"example.com/ddd/value-object\"\ntype Money struct { _ valueobject.ValueObject }\n",
        );
        assert_eq!(found, ["Money"]);
    }

    #[test]
    fn test_custom_marker_field() {
        let marker = marker().with_field("marker");
        let found = detect(
            &marker,
            "package shop\nimport vo \"example.com/ddd/valueobject\"\ntype A struct { marker vo.ValueObject }\ntype B struct { _ vo.ValueObject }\n",
        );
        assert_eq!(found, ["A"]);
    }
}
