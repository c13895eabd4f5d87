//! Zero-value scanning: empty composite literals of marked types outside their constructors
//!
//! Architecture: Domain Service - Occurrences are transient; only violations leave this module
//! - Literals are classified by position: assignment value, return value, or anywhere else
//! - Elided element literals (`[]Money{{}}`) take their type from the enclosing literal
//! - Exemption is file-local: only a constructor for the same type in the same file counts

use crate::analyzer::imports::resolve_type;
use crate::analyzer::FilePass;
use crate::domain::declarations::{ConstructorRecord, QualifiedName};
use crate::domain::markers::MarkerDefinition;
use crate::domain::violations::Violation;
use crate::syntax::ast::{CompositeLit, Expr, Line, Stmt, ValueSpec};
use crate::syntax::visit::{self, Visit};
use crate::tree::ParsedFile;
use std::collections::BTreeSet;
use std::fmt;

/// Syntactic position of a zero-value literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroValueContext {
    /// Used directly as an expression
    Bare,
    /// Right-hand side of an assignment or a `var`/`const` initializer
    Assignment,
    /// A return value
    Return,
}

impl fmt::Display for ZeroValueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bare => "bare literal",
            Self::Assignment => "assignment",
            Self::Return => "return value",
        };
        f.write_str(name)
    }
}

/// An empty composite literal whose type is written (or implied) in source
#[derive(Debug, Clone, Copy)]
pub struct ZeroValueOccurrence<'ast> {
    pub ty: &'ast Expr,
    pub line: Line,
    pub context: ZeroValueContext,
}

/// Collect every zero-value occurrence in a file, in source order
pub fn find_occurrences(file: &ParsedFile) -> Vec<ZeroValueOccurrence<'_>> {
    let mut collector = OccurrenceCollector::default();
    collector.visit_file(&file.syntax);
    collector.occurrences
}

/// Flags zero-value occurrences of one marker's types
pub struct ZeroValueScanner<'a> {
    marker: &'a MarkerDefinition,
    types: &'a BTreeSet<QualifiedName>,
    constructors: Vec<&'a ConstructorRecord>,
}

impl<'a> ZeroValueScanner<'a> {
    pub fn new(
        marker: &'a MarkerDefinition,
        types: &'a BTreeSet<QualifiedName>,
        constructors: impl IntoIterator<Item = &'a ConstructorRecord>,
    ) -> Self {
        Self {
            marker,
            types,
            constructors: constructors.into_iter().collect(),
        }
    }

    fn is_exempt(&self, type_name: &QualifiedName, file: &ParsedFile, line: Line) -> bool {
        self.constructors
            .iter()
            .any(|record| record.exempts(type_name, &file.path, line))
    }
}

impl FilePass for ZeroValueScanner<'_> {
    type Output = BTreeSet<Violation>;

    fn analyze(&self, file: &ParsedFile) -> Self::Output {
        let mut violations = BTreeSet::new();

        for occurrence in find_occurrences(file) {
            let Some(type_name) = resolve_type(occurrence.ty, &file.package_path, &file.imports)
            else {
                continue;
            };
            if !self.types.contains(&type_name) || self.is_exempt(&type_name, file, occurrence.line)
            {
                continue;
            }

            tracing::debug!(
                "Zero-value {} {} ({}) at {}:{}",
                self.marker.kind,
                type_name,
                occurrence.context,
                file.path.display(),
                occurrence.line
            );
            violations.insert(Violation::new(
                self.marker,
                type_name,
                file.path.clone(),
                occurrence.line,
            ));
        }

        violations
    }
}

#[derive(Default)]
struct OccurrenceCollector<'ast> {
    occurrences: Vec<ZeroValueOccurrence<'ast>>,
}

impl<'ast> OccurrenceCollector<'ast> {
    /// Visit an expression sitting in `context`; only a literal directly there takes it
    fn positioned(&mut self, expr: &'ast Expr, context: ZeroValueContext) {
        match expr {
            Expr::CompositeLit(lit) => self.literal(lit, None, context),
            _ => self.visit_expr(expr),
        }
    }

    fn literal(
        &mut self,
        lit: &'ast CompositeLit,
        implied: Option<&'ast Expr>,
        context: ZeroValueContext,
    ) {
        let ty = lit.ty.as_deref().or(implied);
        if let Some(ty) = ty {
            if lit.is_zero_value() {
                self.occurrences.push(ZeroValueOccurrence {
                    ty,
                    line: lit.line,
                    context,
                });
            }
        }
        if let Some(written) = lit.ty.as_deref() {
            self.visit_expr(written);
        }

        let (key_ty, elem_ty) = match ty {
            Some(Expr::ArrayType { elem, .. }) => (None, Some(element_type(elem))),
            Some(Expr::MapType { key, value }) => {
                (Some(element_type(key)), Some(element_type(value)))
            }
            _ => (None, None),
        };

        for elt in &lit.elts {
            match elt {
                Expr::KeyValue { key, value } => {
                    self.element(key, key_ty);
                    self.element(value, elem_ty);
                }
                _ => self.element(elt, elem_ty),
            }
        }
    }

    fn element(&mut self, expr: &'ast Expr, implied: Option<&'ast Expr>) {
        match expr {
            Expr::CompositeLit(lit) if lit.ty.is_none() => {
                self.literal(lit, implied, ZeroValueContext::Bare)
            }
            _ => self.visit_expr(expr),
        }
    }
}

/// `{}` inside `[]*T{...}` builds a `T`
fn element_type(ty: &Expr) -> &Expr {
    match ty {
        Expr::Star(inner) => inner,
        _ => ty,
    }
}

impl<'ast> Visit<'ast> for OccurrenceCollector<'ast> {
    fn visit_composite_lit(&mut self, node: &'ast CompositeLit) {
        self.literal(node, None, ZeroValueContext::Bare);
    }

    fn visit_value_spec(&mut self, node: &'ast ValueSpec) {
        if let Some(ty) = &node.ty {
            self.visit_expr(ty);
        }
        for value in &node.values {
            self.positioned(value, ZeroValueContext::Assignment);
        }
    }

    fn visit_stmt(&mut self, node: &'ast Stmt) {
        match node {
            Stmt::Assign { lhs, rhs, .. } => {
                for target in lhs {
                    self.visit_expr(target);
                }
                for value in rhs {
                    self.positioned(value, ZeroValueContext::Assignment);
                }
            }
            Stmt::Return { results, .. } => {
                for result in results {
                    self.positioned(result, ZeroValueContext::Return);
                }
            }
            _ => visit::visit_stmt(self, node),
        }
    }
}
