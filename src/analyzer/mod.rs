//! Validation engine orchestrating the three analysis phases
//!
//! CDD Principle: Domain Services - Analyzer drives marker detection, constructor location and zero-value scanning
//! - Each phase completes over the whole tree before the next one starts
//! - Per-file work inside a phase runs on the rayon pool and merges by set/map union
//! - Marker kinds are independent runs over one shared parsed snapshot

pub mod constructors;
pub mod imports;
pub mod markers;
pub mod zero_values;

use crate::analyzer::constructors::ConstructorLocator;
use crate::analyzer::markers::MarkerDetector;
use crate::analyzer::zero_values::ZeroValueScanner;
use crate::config::GuardianConfig;
use crate::domain::declarations::{ConstructorKey, ConstructorRecord, QualifiedName};
use crate::domain::markers::MarkerDefinition;
use crate::domain::violations::{
    GuardianError, GuardianResult, MarkerOutcome, ValidationReport, Violation,
};
use crate::tree::{ParsedFile, SourceTree, TreeWalker};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One phase's per-file analysis
pub trait FilePass: Sync {
    /// Per-file result; results of different files are merged by `Extend`
    type Output: Default
        + Send
        + IntoIterator
        + Extend<<Self::Output as IntoIterator>::Item>;

    /// Analyze a single parsed file
    fn analyze(&self, file: &ParsedFile) -> Self::Output;

    /// Check if this pass has anything to look for in the given file
    fn handles_file(&self, _file: &ParsedFile) -> bool {
        true
    }
}

/// Run a pass over every file and union the results
pub fn run_pass<P: FilePass>(pass: &P, files: &[ParsedFile], parallel: bool) -> P::Output {
    let analyze = |file: &ParsedFile| {
        if pass.handles_file(file) {
            pass.analyze(file)
        } else {
            P::Output::default()
        }
    };

    if parallel && files.len() > 1 {
        files
            .par_iter()
            .map(analyze)
            .reduce(P::Output::default, union)
    } else {
        files.iter().map(analyze).fold(P::Output::default(), union)
    }
}

fn union<T>(mut acc: T, next: T) -> T
where
    T: IntoIterator + Extend<<T as IntoIterator>::Item>,
{
    acc.extend(next);
    acc
}

/// Cooperative cancellation, observed between phases
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel` has been called on any clone
    pub fn check(&self) -> GuardianResult<()> {
        if self.is_cancelled() {
            Err(GuardianError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Additional paths to exclude (temporary)
    pub exclude_patterns: Vec<String>,
    /// Whether to ignore .guardianignore files
    pub ignore_ignore_files: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            exclude_patterns: Vec::new(),
            ignore_ignore_files: false,
        }
    }
}

/// Main analyzer that orchestrates the validation pipeline
#[derive(Debug, Clone)]
pub struct Analyzer {
    walker: TreeWalker,
    constructor_pattern: Regex,
    parallel: bool,
}

impl Analyzer {
    /// Create a new analyzer following the given configuration
    pub fn new(config: &GuardianConfig) -> GuardianResult<Self> {
        Self::with_options(config, &AnalysisOptions::default())
    }

    /// Create an analyzer with per-run adjustments on top of the configuration
    pub fn with_options(config: &GuardianConfig, options: &AnalysisOptions) -> GuardianResult<Self> {
        let mut filter = config.path_filter()?;
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern)?;
        }
        if options.ignore_ignore_files {
            filter = filter.without_ignore_files();
        }

        let parallel = config.analysis.parallel && options.parallel;
        let walker = config
            .tree_walker()?
            .with_filter(filter)
            .with_parallel(parallel);

        Ok(Self {
            walker,
            constructor_pattern: config.constructor_regex()?,
            parallel,
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> GuardianResult<Self> {
        Self::new(&GuardianConfig::default())
    }

    pub fn walker(&self) -> &TreeWalker {
        &self.walker
    }

    /// Enumerate and parse the tree under `root`
    pub fn load_tree(&self, root: &Path) -> GuardianResult<SourceTree> {
        self.walker.load(root)
    }

    /// Validate one marker kind over the tree under `root`
    pub fn validate(
        &self,
        marker: &MarkerDefinition,
        root: &Path,
    ) -> GuardianResult<Option<ValidationReport>> {
        let tree = self.load_tree(root)?;
        self.validate_tree(marker, &tree)
    }

    /// Validate one marker kind over an already parsed tree
    pub fn validate_tree(
        &self,
        marker: &MarkerDefinition,
        tree: &SourceTree,
    ) -> GuardianResult<Option<ValidationReport>> {
        self.validate_tree_with_cancel(marker, tree, &Cancellation::new())
    }

    /// Validate one marker kind, checking `cancel` before every phase
    pub fn validate_tree_with_cancel(
        &self,
        marker: &MarkerDefinition,
        tree: &SourceTree,
        cancel: &Cancellation,
    ) -> GuardianResult<Option<ValidationReport>> {
        cancel.check()?;
        let types = self.find_types(marker, tree);
        if types.is_empty() {
            tracing::info!("No {} types under {}", marker.kind, tree.root.display());
            return Ok(None);
        }
        tracing::info!("Found {} {} types", types.len(), marker.kind);

        cancel.check()?;
        let constructors = self.find_constructors(&types, tree);
        tracing::info!("Found {} {} constructors", constructors.len(), marker.kind);

        cancel.check()?;
        let violations = self.find_violations(marker, &types, &constructors, tree);
        tracing::info!("Found {} {} violations", violations.len(), marker.kind);

        Ok(ValidationReport::assemble(
            marker,
            types,
            constructors,
            violations,
        ))
    }

    /// Validate several marker kinds independently over one parsed tree
    pub fn validate_markers(
        &self,
        markers: &[MarkerDefinition],
        tree: &SourceTree,
        cancel: &Cancellation,
    ) -> GuardianResult<Vec<MarkerOutcome>> {
        let run = |marker: &MarkerDefinition| -> GuardianResult<MarkerOutcome> {
            let report = self.validate_tree_with_cancel(marker, tree, cancel)?;
            Ok(MarkerOutcome {
                marker: marker.clone(),
                report,
            })
        };

        if self.parallel {
            markers.par_iter().map(run).collect()
        } else {
            markers.iter().map(run).collect()
        }
    }

    /// Phase one: types carrying the marker
    pub fn find_types(&self, marker: &MarkerDefinition, tree: &SourceTree) -> BTreeSet<QualifiedName> {
        run_pass(&MarkerDetector::new(marker), &tree.files, self.parallel)
    }

    /// Phase two: constructors producing one of `types`
    pub fn find_constructors(
        &self,
        types: &BTreeSet<QualifiedName>,
        tree: &SourceTree,
    ) -> BTreeMap<ConstructorKey, ConstructorRecord> {
        let locator = ConstructorLocator::new(types, &self.constructor_pattern);
        run_pass(&locator, &tree.files, self.parallel)
    }

    /// Phase three: zero-value literals of `types` outside their same-file constructors
    pub fn find_violations(
        &self,
        marker: &MarkerDefinition,
        types: &BTreeSet<QualifiedName>,
        constructors: &BTreeMap<ConstructorKey, ConstructorRecord>,
        tree: &SourceTree,
    ) -> BTreeSet<Violation> {
        let scanner = ZeroValueScanner::new(marker, types, constructors.values());
        run_pass(&scanner, &tree.files, self.parallel)
    }
}
