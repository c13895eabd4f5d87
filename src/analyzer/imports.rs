//! Per-file import resolution
//!
//! Type references resolve through the importing file's own table, so a
//! qualifier only means something in the file that declares it.

use crate::domain::declarations::QualifiedName;
use crate::syntax::ast::{Expr, File};
use crate::syntax::default_package_name;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportEntry {
    /// Qualifier used in source
    name: String,
    path: String,
    /// Whether `name` was written in the import spec
    explicit: bool,
}

/// Qualifier-to-path bindings of one file; blank and dot imports bind nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    pub fn from_file(file: &File) -> Self {
        let entries = file
            .imports
            .iter()
            .filter_map(|spec| match &spec.name {
                Some(name) if name.name == "_" || name.name == "." => None,
                Some(name) => Some(ImportEntry {
                    name: name.name.clone(),
                    path: spec.path.clone(),
                    explicit: true,
                }),
                None => Some(ImportEntry {
                    name: default_package_name(&spec.path).to_string(),
                    path: spec.path.clone(),
                    explicit: false,
                }),
            })
            .collect();
        Self { entries }
    }

    /// Whether `path` is imported under some qualifier
    pub fn imports(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Qualifiers bound to `path`; unaliased imports use `default_name`
    pub fn aliases_of<'a>(
        &'a self,
        path: &'a str,
        default_name: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.path == path)
            .map(move |e| if e.explicit { e.name.as_str() } else { default_name })
    }

    /// Import path bound to `qualifier`
    pub fn resolve(&self, qualifier: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == qualifier)
            .map(|e| e.path.as_str())
    }
}

/// Resolve a type reference written in a file of package `package_path`.
///
/// `T` names a type of the file's own package, `q.T` goes through the import
/// table and `T[A]` resolves to its generic base. Anything else is not a named type.
pub fn resolve_type(expr: &Expr, package_path: &str, imports: &ImportTable) -> Option<QualifiedName> {
    match expr {
        Expr::Ident(ident) => Some(QualifiedName::new(package_path, ident.name.as_str())),
        Expr::Selector { base, sel } => match base.as_ref() {
            Expr::Ident(qualifier) => imports
                .resolve(&qualifier.name)
                .map(|path| QualifiedName::new(path, sel.name.as_str())),
            _ => None,
        },
        Expr::Index { base, .. } => resolve_type(base, package_path, imports),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;

    fn table(source: &str) -> ImportTable {
        ImportTable::from_file(&parse_file(source).unwrap())
    }

    #[test]
    fn test_aliases() {
        let imports = table(
            r#"package p
import (
    "example.com/ddd/valueobject"
    vo "example.com/ddd/valueobject"
    _ "example.com/side/effect"
    . "example.com/dot"
)
"#,
        );

        let aliases: Vec<_> = imports
            .aliases_of("example.com/ddd/valueobject", "valueobject")
            .collect();
        assert_eq!(aliases, ["valueobject", "vo"]);
        assert!(!imports.imports("example.com/side/effect"));
        assert!(!imports.imports("example.com/dot"));
        assert_eq!(imports.resolve("vo"), Some("example.com/ddd/valueobject"));
        assert_eq!(imports.resolve("effect"), None);
    }

    #[test]
    fn test_package_name_override_applies_to_unaliased_imports() {
        let imports = table("package p\nimport \"example.com/ddd/value-object\"\n");
        let aliases: Vec<_> = imports
            .aliases_of("example.com/ddd/value-object", "valueobject")
            .collect();
        assert_eq!(aliases, ["valueobject"]);
    }

    #[test]
    fn test_resolve_type() {
        let file = parse_file(
            "package p\nimport m \"example.com/shop/money\"\nvar a, b, c, d = Money{}, m.Money{}, List[int]{}, x.Y{}\n",
        )
        .unwrap();
        let imports = ImportTable::from_file(&file);
        let crate::syntax::ast::Decl::Gen(crate::syntax::ast::GenDecl::Var(specs)) = &file.decls[0]
        else {
            panic!()
        };
        let types: Vec<_> = specs[0]
            .values
            .iter()
            .map(|v| match v {
                Expr::CompositeLit(lit) => lit
                    .ty
                    .as_deref()
                    .and_then(|ty| resolve_type(ty, "example.com/shop/p", &imports))
                    .map(|q| q.to_string()),
                _ => None,
            })
            .collect();

        assert_eq!(
            types,
            [
                Some("example.com/shop/p.Money".to_string()),
                Some("example.com/shop/money.Money".to_string()),
                Some("example.com/shop/p.List".to_string()),
                None,
            ]
        );
    }
}
