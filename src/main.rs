//! Domain Guardian CLI - Command-line interface for zero-value enforcement
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and business logic

use clap::{Args, Parser, Subcommand, ValueEnum};
use domain_guardian::config::CONFIG_FILE_NAMES;
use domain_guardian::tree::GO_MOD;
use domain_guardian::{
    find_project_root, AnalysisOptions, GuardianConfig, GuardianError, GuardianResult,
    GuardianValidator, OutputFormat, ReportFormatter, ReportOptions, Severity, ValidationOptions,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// Domain Guardian - Keep DDD domain objects out of their zero value
#[derive(Parser)]
#[command(name = "domain-guardian")]
#[command(version)]
#[command(about = "Detects zero-value construction of DDD domain objects outside their constructors")]
#[command(
    long_about = "Domain Guardian scans a Go source tree for structs tagged with a dddgo marker field (value objects, entities, aggregates, commands) and reports every empty composite literal of such a type that appears outside its New* constructor."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a source tree for zero-value violations
    Check(CheckArgs),

    /// Watch a source tree and re-run checks on changes
    Watch {
        /// Root to watch (defaults to the project root above the current directory)
        path: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// List configured marker kinds
    Markers {
        /// Show only enabled markers
        #[arg(long)]
        enabled_only: bool,
    },

    /// Print the project root found by walking up from a directory
    Root {
        /// Directory to start from (defaults to the current directory)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct CheckArgs {
    /// Root to analyze (defaults to the project root above the current directory)
    path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormatArg,

    /// Marker kinds to check (defaults to every enabled kind)
    #[arg(short, long, action = clap::ArgAction::Append)]
    kind: Vec<String>,

    /// Minimum severity level to report
    #[arg(short, long, value_enum)]
    severity: Option<SeverityArg>,

    /// Maximum number of violations to report
    #[arg(long)]
    max_violations: Option<usize>,

    /// Additional exclude patterns
    #[arg(long, action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Ignore .guardianignore files
    #[arg(long)]
    no_ignore: bool,

    /// Disable parallel processing
    #[arg(long)]
    no_parallel: bool,

    /// List marked types and constructors in human output
    #[arg(long)]
    show_declarations: bool,
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
    Sarif,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> GuardianResult<i32> {
    let use_colors = !cli.no_color;
    match cli.command {
        Commands::Check(args) => run_check(cli.config, args, use_colors).await,
        Commands::Watch { path, delay } => run_watch(cli.config, path, delay, use_colors).await,
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Markers { enabled_only } => run_list_markers(cli.config, enabled_only),
        Commands::Root { path } => run_root(path),
    }
}

/// Explicit path, or the project root above the current directory, or the current directory
fn resolve_root(path: Option<PathBuf>) -> GuardianResult<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd, GO_MOD) {
        Ok(root) => Ok(root),
        Err(e) => {
            tracing::debug!("{}; using {}", e, cwd.display());
            Ok(cwd)
        }
    }
}

/// Explicit config file, or the one found in `root`, or defaults
fn load_validator(config_path: Option<&Path>, root: &Path) -> GuardianResult<GuardianValidator> {
    match config_path {
        Some(path) => GuardianValidator::from_config_file(path),
        None => GuardianValidator::discover(root),
    }
}

async fn run_check(
    config_path: Option<PathBuf>,
    args: CheckArgs,
    use_colors: bool,
) -> GuardianResult<i32> {
    let root = resolve_root(args.path)?;
    let report_options = ReportOptions {
        use_colors,
        show_declarations: args.show_declarations,
        max_violations: args.max_violations,
        min_severity: args.severity.map(Into::into),
        ..Default::default()
    };
    let format = OutputFormat::from(args.format);
    let validator = load_validator(config_path.as_deref(), &root)?
        .with_report_formatter(ReportFormatter::new(report_options));

    let options = ValidationOptions {
        kinds: args.kind,
        analysis_options: AnalysisOptions {
            parallel: !args.no_parallel,
            exclude_patterns: args.exclude,
            ignore_ignore_files: args.no_ignore,
        },
    };

    let report = validator.validate_async(root, options).await?;
    validator.write_report(&report, format, io::stdout().lock())?;

    Ok(if report.has_errors() { 1 } else { 0 })
}

async fn run_watch(
    config_path: Option<PathBuf>,
    path: Option<PathBuf>,
    delay_ms: u64,
    use_colors: bool,
) -> GuardianResult<i32> {
    use notify::{Event, RecursiveMode, Result as NotifyResult, Watcher};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    let root = watch_root(path)?;
    let mut validator = load_validator(config_path.as_deref(), &root)?;
    let mut walker = validator.config().tree_walker()?;

    println!("🔍 Starting Domain Guardian watch mode...");
    println!("📂 Watching: {}", root.display());
    println!("⏱️  Debounce delay: {delay_ms}ms");
    println!("Press Ctrl+C to stop watching\n");

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
        Ok(event) => {
            if let Err(e) = tx.send(event) {
                eprintln!("Error sending event: {e}");
            }
        }
        Err(e) => eprintln!("Watch error: {e}"),
    })
    .map_err(|e| GuardianError::config(format!("Failed to create file watcher: {e}")))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| {
            GuardianError::config(format!("Failed to watch path '{}': {}", root.display(), e))
        })?;

    println!("🚀 Running initial analysis...");
    run_watch_analysis(&validator, &root, use_colors).await;

    let debounce = Duration::from_millis(delay_ms);
    let mut last_change: Option<Instant> = None;
    let mut reload_config = false;

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if config_path.is_none() && is_config_change(&event) {
                    reload_config = true;
                    last_change = Some(Instant::now());
                } else if should_trigger_analysis(&event, &root, &walker) {
                    last_change = Some(Instant::now());
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                eprintln!("File watcher disconnected");
                break;
            }
        }

        let settled = last_change.is_some_and(|at| at.elapsed() >= debounce);
        if !settled {
            continue;
        }
        last_change = None;

        if reload_config {
            reload_config = false;
            match GuardianValidator::discover(&root).and_then(|v| {
                let w = v.config().tree_walker()?;
                Ok((v, w))
            }) {
                Ok((v, w)) => {
                    println!("🔄 Configuration reloaded");
                    validator = v;
                    walker = w;
                }
                Err(e) => eprintln!("⚠️  Keeping previous configuration: {e}"),
            }
        }

        print!("\x1B[2J\x1B[H");
        println!("📝 Changes detected, running analysis...");
        run_watch_analysis(&validator, &root, use_colors).await;
    }

    Ok(0)
}

/// Watcher events carry absolute paths, so the watched root is made absolute up front
fn watch_root(path: Option<PathBuf>) -> GuardianResult<PathBuf> {
    let root = resolve_root(path)?;
    root.canonicalize()
        .map_err(|e| GuardianError::root_access(&root, e))
}

/// Whether any path touched by a create/modify/remove event can change results
fn should_trigger_analysis(
    event: &notify::Event,
    root: &Path,
    walker: &domain_guardian::tree::TreeWalker,
) -> bool {
    use notify::EventKind;

    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    event.paths.iter().any(|path| {
        let relative = path.strip_prefix(root).unwrap_or(path);
        walker.is_relevant_change(relative)
    })
}

/// Whether an event touches one of the recognized config file names
fn is_config_change(event: &notify::Event) -> bool {
    use notify::EventKind;

    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
    })
}

async fn run_watch_analysis(validator: &GuardianValidator, root: &Path, use_colors: bool) {
    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        ..Default::default()
    });

    match validator
        .validate_async(root.to_path_buf(), ValidationOptions::default())
        .await
    {
        Ok(report) => match formatter.format_report(&report, OutputFormat::Human) {
            Ok(formatted) => {
                println!("{formatted}");
                println!("⌚ Watching for changes... (Press Ctrl+C to stop)\n");
            }
            Err(e) => eprintln!("❌ Formatting failed: {e}"),
        },
        Err(e) => eprintln!("❌ Analysis error: {e}"),
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> GuardianResult<i32> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir()?;
            GuardianConfig::find_in(&cwd)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAMES[0]))
        }
    };

    println!("Validating configuration: {}", config_path.display());

    match GuardianConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");

            let enabled = config.enabled_markers().count();
            println!("📊 Configuration summary:");
            println!(
                "  Markers: {} total, {} enabled",
                config.markers.len(),
                enabled
            );
            println!("  Constructor pattern: {}", config.analysis.constructor_pattern);
            println!("  Path patterns: {}", config.paths.patterns.len());

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn run_list_markers(config_path: Option<PathBuf>, enabled_only: bool) -> GuardianResult<i32> {
    let config = match config_path {
        Some(path) => GuardianConfig::load_from_file(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            match GuardianConfig::find_in(&cwd) {
                Some(path) => GuardianConfig::load_from_file(path)?,
                None => GuardianConfig::default(),
            }
        }
    };

    println!("📋 Marker kinds:");
    for marker in &config.markers {
        if enabled_only && !marker.enabled {
            continue;
        }
        let status = if marker.enabled { "✅" } else { "❌" };
        println!(
            "  {} {} [{}]: {} {}.{}",
            status,
            marker.kind,
            marker.severity.as_str(),
            marker.field,
            marker.default_alias(),
            marker.type_name
        );
        println!("     package {}", marker.package);
        if let Some(description) = &marker.description {
            println!("     {description}");
        }
    }

    Ok(0)
}

fn run_root(path: Option<PathBuf>) -> GuardianResult<i32> {
    let origin = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let root = find_project_root(&origin, GO_MOD)?;
    println!("{}", root.display());
    Ok(0)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_guardian::domain::markers::VALUE_OBJECT_PACKAGE;
    use notify::event::{CreateKind, ModifyKind};
    use notify::{Event, EventKind};
    use std::fs;
    use tempfile::TempDir;

    fn check_args(path: &Path, format: OutputFormatArg) -> CheckArgs {
        CheckArgs {
            path: Some(path.to_path_buf()),
            format,
            kind: Vec::new(),
            severity: None,
            max_violations: None,
            exclude: Vec::new(),
            no_ignore: false,
            no_parallel: false,
            show_declarations: false,
        }
    }

    fn project(with_violation: bool) -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("go.mod"), "module example.com/shop\n").unwrap();
        fs::create_dir_all(root.join("money")).unwrap();
        let usage = if with_violation { "var bad = Money{}\n" } else { "" };
        fs::write(
            root.join("money/money.go"),
            format!(
                "package money\n\nimport vo \"{VALUE_OBJECT_PACKAGE}\"\n\ntype Money struct {{\n\t_ vo.ValueObject\n}}\n\n{usage}"
            ),
        )
        .unwrap();
        temp
    }

    #[tokio::test]
    async fn test_check_command_exit_codes() {
        let dirty = project(true);
        let result = run_check(None, check_args(dirty.path(), OutputFormatArg::Json), false).await;
        assert_eq!(result.unwrap(), 1);

        let clean = project(false);
        let result = run_check(None, check_args(clean.path(), OutputFormatArg::Human), false).await;
        assert_eq!(result.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_command_missing_root() {
        let temp = TempDir::new().unwrap();
        let args = check_args(&temp.path().join("absent"), OutputFormatArg::Human);
        assert!(run_check(None, args, false).await.is_err());
    }

    #[test]
    fn test_validate_config() {
        let temp = TempDir::new().unwrap();
        let config_file = temp.path().join("domain_guardian.yaml");
        fs::write(&config_file, GuardianConfig::default().to_yaml().unwrap()).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "analysis:\n  constructor_pattern: \"(\"\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 1);
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(run_list_markers(None, false).unwrap(), 0);
        assert_eq!(run_list_markers(None, true).unwrap(), 0);
    }

    #[test]
    fn test_root_command() {
        let temp = project(false);
        let nested = temp.path().join("money");
        assert_eq!(run_root(Some(nested)).unwrap(), 0);

        let bare = TempDir::new().unwrap();
        assert!(run_root(Some(bare.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_watch_root_is_absolute() {
        let temp = project(false);
        let root = watch_root(Some(temp.path().join("money/.."))).unwrap();
        assert!(root.is_absolute());
        assert_eq!(root, temp.path().canonicalize().unwrap());

        let walker = GuardianConfig::default().tree_walker().unwrap();
        let vendored = Event::new(EventKind::Create(CreateKind::File))
            .add_path(root.join("vendor/x/x.go"));
        assert!(!should_trigger_analysis(&vendored, &root, &walker));
        let source = Event::new(EventKind::Create(CreateKind::File))
            .add_path(root.join("money/money.go"));
        assert!(should_trigger_analysis(&source, &root, &walker));

        assert!(watch_root(Some(PathBuf::from("."))).unwrap().is_absolute());
        assert!(watch_root(Some(temp.path().join("absent"))).is_err());
    }

    #[test]
    fn test_event_filters() {
        let root = Path::new("/work/shop");
        let walker = GuardianConfig::default().tree_walker().unwrap();

        let modify = |path: &str| {
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from(path))
        };

        assert!(should_trigger_analysis(&modify("/work/shop/money/money.go"), root, &walker));
        assert!(should_trigger_analysis(&modify("/work/shop/go.mod"), root, &walker));
        assert!(!should_trigger_analysis(&modify("/work/shop/money/money_test.go"), root, &walker));
        assert!(!should_trigger_analysis(&modify("/work/shop/vendor/x/x.go"), root, &walker));
        assert!(!should_trigger_analysis(
            &Event::new(EventKind::Access(notify::event::AccessKind::Any))
                .add_path(PathBuf::from("/work/shop/money/money.go")),
            root,
            &walker
        ));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/work/shop/domain_guardian.yaml"));
        assert!(is_config_change(&created));
        assert!(!is_config_change(&modify("/work/shop/money/money.go")));
    }
}
