//! Command-line interface for routercheck.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerOptions};
use crate::config::{self, Config};
use crate::export;
use crate::report::{self, Format};
use crate::rules::RuleSet;
use crate::trace::Trace;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ROUTERCHECK_LOG";

static INIT_TRACING: Once = Once::new();

/// Static analyzer for tRPC routers.
///
/// Routercheck finds router definitions, extracts every query and mutation
/// with its visibility, validation and resolver characteristics, and reports
/// consistency and safety issues.
#[derive(Parser)]
#[command(name = "routercheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract procedures and report findings
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Print API definitions for discovered procedures
    Export(ExportArgs),
    /// Create a routercheck.yaml from a template
    Init(InitArgs),
    /// List the rules an analysis would run
    Rules(RulesArgs),
}

/// Options shared by every command that runs an analysis.
#[derive(Args)]
pub struct AnalysisArgs {
    /// Project root to analyse
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analysis target: trpc or next-trpc
    #[arg(short, long)]
    pub target: Option<String>,

    /// Include glob, relative to the root (repeatable)
    #[arg(short, long = "include")]
    pub include: Vec<String>,

    /// Callee name that constructs a router, e.g. createTRPCRouter (repeatable)
    #[arg(long = "router-factory")]
    pub router_factories: Vec<String>,

    /// Regex for identifiers that name a router (default: /router$/i)
    #[arg(long)]
    pub router_pattern: Option<String>,

    /// Print extraction progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Output format: table or json
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Path prefix of the tRPC handler, e.g. /api/trpc
    #[arg(long)]
    pub prefix: Option<String>,

    /// Base URL prepended to every path
    #[arg(long)]
    pub domain: Option<String>,

    /// Show a table instead of the JSON payload
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "routercheck.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    /// Project root used for config discovery
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Available configuration templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Built-in rules and thresholds, default include set",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "strict",
        description: "Tighter size limits and escalated side-effect severities",
        content: include_str!("templates/strict.yaml"),
    },
];

/// Install the tracing subscriber. Reads the filter from `ROUTERCHECK_LOG`,
/// falling back to `routercheck=warn`. Safe to call more than once.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("routercheck=warn"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

/// Resolve the root, load the configuration and apply command-line overrides.
fn load_options(args: &AnalysisArgs) -> anyhow::Result<(AnalyzerOptions, Config)> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot access path {:?}", args.path))?;
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let config_path = args.config.clone().or_else(|| Config::discover(&root));
    let config = match &config_path {
        Some(path) => {
            let config = Config::parse_file(path)
                .with_context(|| format!("parsing config {}", path.display()))?;
            config::validate(&config).context("invalid config")?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => Config::default(),
    };

    let mut options = config.analyzer_options(&root)?;
    if let Some(target) = &args.target {
        options.target = target.parse()?;
    }
    if !args.include.is_empty() {
        options.include = args.include.clone();
    }
    if !args.router_factories.is_empty() {
        options.router_factories = args.router_factories.clone();
    }
    if let Some(pattern) = &args.router_pattern {
        options.router_identifier_pattern = Some(pattern.clone());
    }

    Ok((options, config))
}

fn analyze(
    options: AnalyzerOptions,
    verbose: bool,
    show_progress: bool,
) -> anyhow::Result<AnalysisResult> {
    let mut analyzer = Analyzer::new(options);
    if verbose {
        analyzer = analyzer.with_trace(Trace::stderr());
    }

    let spinner = (show_progress && !verbose).then(progress_spinner);
    let result = analyzer.run();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    Ok(result?)
}

fn progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing tRPC routers...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let format: Format = args.format.parse().map_err(anyhow::Error::msg)?;
    let (options, _) = load_options(&args.analysis)?;

    let result = analyze(options, args.analysis.verbose, format == Format::Table)?;

    let mut out = io::stdout().lock();
    match format {
        Format::Json => report::write_json(&mut out, &result)?,
        Format::Table => report::write_table(&mut out, &result)?,
    }

    if result.has_errors() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the export command.
pub fn run_export(args: &ExportArgs) -> anyhow::Result<i32> {
    let (options, config) = load_options(&args.analysis)?;

    let mut export_options = config.export;
    if args.prefix.is_some() {
        export_options.prefix = args.prefix.clone();
    }
    if args.domain.is_some() {
        export_options.domain = args.domain.clone();
    }

    let result = analyze(options, args.analysis.verbose, false)?;
    let definitions = export::to_api_definitions(&result.procedures, &export_options);

    let mut out = io::stdout().lock();
    if args.dry_run {
        report::write_api_table(&mut out, &definitions)?;
    } else {
        report::write_api_json(&mut out, &definitions)?;
    }

    Ok(EXIT_SUCCESS)
}

/// Run the rules command. Disabled rules are left out and severity overrides
/// are shown as configured.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let config_path = args.config.clone().or_else(|| Config::discover(&args.path));
    let rules = match &config_path {
        Some(path) => {
            let config = Config::parse_file(path)
                .with_context(|| format!("parsing config {}", path.display()))?;
            RuleSet::configured(&config.rules).context("invalid config")?
        }
        None => RuleSet::defaults(),
    };

    report::write_rules(&mut io::stdout().lock(), &rules)?;
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'routercheck init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    std::fs::write(&args.output, template.content)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your router factories", args.output.display());
    println!("  2. Run: routercheck analyze --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  routercheck init --template <name>");

    Ok(EXIT_SUCCESS)
}
