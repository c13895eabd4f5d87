//! Records produced by marker detection and constructor location

use crate::syntax::ast::Line;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A type identified by its package import path and local name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub package: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Identity of a constructor: two same-named functions producing different types never collide
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstructorKey {
    pub file: PathBuf,
    /// Function name, or `Receiver.Name` for methods
    pub function: String,
    pub produced: QualifiedName,
}

impl fmt::Display for ConstructorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file.display(),
            self.function,
            self.produced
        )
    }
}

/// Where a constructor lives; the span covers declaration start to closing brace, inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorRecord {
    pub produced: QualifiedName,
    pub file: PathBuf,
    pub start_line: Line,
    pub end_line: Line,
}

impl ConstructorRecord {
    /// Whether `line` of `file` falls inside this constructor for `produced`
    pub fn exempts(&self, produced: &QualifiedName, file: &Path, line: Line) -> bool {
        &self.produced == produced && self.file == file && self.contains(line)
    }

    pub fn contains(&self, line: Line) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}
