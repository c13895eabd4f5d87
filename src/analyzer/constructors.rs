//! Constructor location: functions that are the sanctioned origin of a marked type

use crate::analyzer::imports::resolve_type;
use crate::analyzer::FilePass;
use crate::domain::declarations::{ConstructorKey, ConstructorRecord, QualifiedName};
use crate::syntax::ast::{Decl, FuncDecl};
use crate::tree::ParsedFile;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Records functions whose name follows the constructor convention and whose
/// first result is a marked type, written as `T`, `pkg.T` or `T[A]`.
/// Pointer results do not count.
pub struct ConstructorLocator<'a> {
    types: &'a BTreeSet<QualifiedName>,
    pattern: &'a Regex,
}

impl<'a> ConstructorLocator<'a> {
    pub fn new(types: &'a BTreeSet<QualifiedName>, pattern: &'a Regex) -> Self {
        Self { types, pattern }
    }

    fn produced_type(&self, func: &FuncDecl, file: &ParsedFile) -> Option<QualifiedName> {
        if !self.pattern.is_match(&func.name.name) {
            return None;
        }
        let first = func.ty.results.first()?;
        let produced = resolve_type(&first.ty, &file.package_path, &file.imports)?;
        self.types.contains(&produced).then_some(produced)
    }
}

impl FilePass for ConstructorLocator<'_> {
    type Output = BTreeMap<ConstructorKey, ConstructorRecord>;

    fn analyze(&self, file: &ParsedFile) -> Self::Output {
        let mut found = BTreeMap::new();

        for decl in &file.syntax.decls {
            let Decl::Func(func) = decl else {
                continue;
            };
            let Some(produced) = self.produced_type(func, file) else {
                continue;
            };

            let function = match func.receiver_type_name() {
                Some(receiver) => format!("{}.{}", receiver, func.name.name),
                None => func.name.name.clone(),
            };
            let key = ConstructorKey {
                file: file.path.clone(),
                function,
                produced: produced.clone(),
            };
            let record = ConstructorRecord {
                produced,
                file: file.path.clone(),
                start_line: func.start_line,
                end_line: func.end_line,
            };
            found.insert(key, record);
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;
    use std::path::PathBuf;

    const PKG: &str = "example.com/shop/money";

    fn locate(source: &str, types: &[(&str, &str)]) -> Vec<(String, u32, u32)> {
        let file = ParsedFile::new(
            PathBuf::from("money/money.go"),
            PKG.to_string(),
            parse_file(source).unwrap(),
        );
        let types: BTreeSet<_> = types
            .iter()
            .map(|(pkg, name)| QualifiedName::new(*pkg, *name))
            .collect();
        let pattern = Regex::new("^New").unwrap();
        ConstructorLocator::new(&types, &pattern)
            .analyze(&file)
            .into_iter()
            .map(|(key, record)| (key.function, record.start_line, record.end_line))
            .collect()
    }

    #[test]
    fn test_records_span() {
        let found = locate(
            r#"package money

func NewMoney(a int) Money {
    m := Money{}
    m.amount = a
    return m
}
"#,
            &[(PKG, "Money")],
        );
        assert_eq!(found, [("NewMoney".to_string(), 3, 7)]);
    }

    #[test]
    fn test_requires_name_convention_and_marked_result() {
        let found = locate(
            r#"package money

func MakeMoney() Money { return Money{} }
func NewPrice() Price { return Price{} }
func NewNothing() {}
func NewMoneyPtr() *Money { return &Money{} }
func NewPair() (Money, error) { return Money{}, nil }
"#,
            &[(PKG, "Money")],
        );
        assert_eq!(found, [("NewPair".to_string(), 7, 7)]);
    }

    #[test]
    fn test_qualified_results_resolve_through_imports() {
        let found = locate(
            r#"package money

import (
    vo "example.com/shop/values"
    "example.com/shop/other"
)

func NewAmount() vo.Amount { return vo.Amount{} }
func NewOtherAmount() other.Amount { return other.Amount{} }
"#,
            &[("example.com/shop/values", "Amount")],
        );
        assert_eq!(found, [("NewAmount".to_string(), 8, 8)]);
    }

    #[test]
    fn test_same_named_type_in_other_package_is_not_matched() {
        let found = locate(
            "package money\n\nfunc NewMoney() Money { return Money{} }\n",
            &[("example.com/shop/billing", "Money")],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_methods_and_generics() {
        let found = locate(
            r#"package money

func (f Factory) NewMoney() Money { return Money{} }
func NewBox[T any](v T) Box[T] { return Box[T]{} }
"#,
            &[(PKG, "Money"), (PKG, "Box")],
        );
        assert_eq!(
            found,
            [
                ("Factory.NewMoney".to_string(), 3, 3),
                ("NewBox".to_string(), 4, 4)
            ]
        );
    }
}
