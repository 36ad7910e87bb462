//! Metalint CLI - Salesforce Metadata Linter

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use metalint::catalog::{OverrideCatalog, RuleCatalog};
use metalint::config::{self, ColorMode, OutputFormat, SeverityThreshold};
use metalint::discovery::collect_files;
use metalint::document::MetadataDocument;
use metalint::engine::Engine;
use metalint::output::{CsvFormatter, JsonFormatter, OutputFormatter, TextFormatter};
use metalint::rules::builtin_rules;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "metalint",
    version,
    about = "Salesforce Metadata Linter",
    long_about = "Analyze Salesforce metadata XML files for potential issues and best-practice violations."
)]
struct Cli {
    /// Files or directories to lint
    #[arg(default_value = "force-app")]
    paths: Vec<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a custom rules file (YAML/JSON overrides)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Severity threshold for a non-zero exit code
    #[arg(short, long, value_enum)]
    severity: Option<MinSeverity>,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List active rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MinSeverity {
    Error,
    Warning,
    Info,
    None,
}

impl From<MinSeverity> for SeverityThreshold {
    fn from(severity: MinSeverity) -> Self {
        match severity {
            MinSeverity::Error => SeverityThreshold::Error,
            MinSeverity::Warning => SeverityThreshold::Warning,
            MinSeverity::Info => SeverityThreshold::Info,
            MinSeverity::None => SeverityThreshold::None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            std::process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = config::resolve(cli.config.as_ref()).context("failed to load configuration")?;

    let overrides: OverrideCatalog = match &cli.rules {
        Some(path) => config::load_overrides(path)
            .with_context(|| format!("failed to load custom rules from {}", path.display()))?,
        None => config.rules.clone(),
    };

    let base = builtin_rules();
    let catalog = if overrides.is_empty() {
        base
    } else {
        RuleCatalog::merge(&base, &overrides).context("failed to build rule catalog")?
    };

    if cli.list_rules {
        print_rules(&catalog);
        return Ok(0);
    }

    let rules = catalog
        .materialize()
        .context("failed to build rule catalog")?;
    log::info!("number of rules to evaluate: {}", rules.len());

    let files = collect_files(&cli.paths, &config.files);
    log::info!("number of files to lint: {}", files.len());

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let doc = MetadataDocument::read(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        documents.push(doc);
    }

    let jobs = if cli.jobs > 0 {
        cli.jobs
    } else {
        config.engine.jobs
    };
    let engine = Engine::new()
        .with_parallel(config.engine.parallel)
        .with_jobs(jobs);

    let findings = engine.evaluate(&documents, &rules)?;

    let use_color = match config.output.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => !cli.no_color,
    };
    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let formatter: Box<dyn OutputFormatter> = match format {
        OutputFormat::Text => {
            let text = TextFormatter::new();
            Box::new(if use_color { text } else { text.without_color() })
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
    };
    print!("{}", formatter.format(&findings));

    let threshold: SeverityThreshold = cli
        .severity
        .map(Into::into)
        .unwrap_or(config.severity);
    if findings.iter().any(|f| threshold.is_met_by(f.priority)) {
        return Ok(1);
    }
    Ok(0)
}

fn print_rules(catalog: &RuleCatalog) {
    for (name, def) in catalog.iter() {
        println!("{:<45} [{}] {}", name, def.priority, def.description);
    }
}
