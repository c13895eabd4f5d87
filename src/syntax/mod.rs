//! Go source syntax: tree-sitter parsing lowered into an owned tree, plus traversal
//!
//! CDD Principle: Anti-Corruption Layer - Neither source text nor tree-sitter nodes leak past this module
//! - Consumers see only the `ast` types and the `Visit` trait
//! - Any syntax error becomes a `ParseError` carrying its line

pub mod ast;
pub mod parser;
pub mod visit;

pub use ast::File;
pub use parser::parse_file;
pub use visit::Visit;

use ast::Line;

/// A lexical or syntax error in a single source file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: Line,
    pub message: String,
}

impl ParseError {
    pub fn new(line: Line, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Name a package is referred to by when imported without an alias.
///
/// This is the last path segment, with a trailing major-version segment (`/v2`)
/// or a `gopkg.in` style suffix (`yaml.v3`) removed.
pub fn default_package_name(import_path: &str) -> &str {
    let mut segments = import_path.trim_end_matches('/').rsplit('/');
    let last = segments.next().unwrap_or(import_path);

    if is_major_version(last) {
        if let Some(parent) = segments.next() {
            return parent;
        }
    }

    match last.rsplit_once(".v") {
        Some((name, version)) if !name.is_empty() && is_version_number(version) => name,
        _ => last,
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| is_version_number(n) && n != "0" && n != "1")
}

fn is_version_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
