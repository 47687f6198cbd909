//! capi CLI - C API header diff and compatibility checker
//!
//! Compares two versions of an SDK's C headers and classifies every change
//! as compatible or incompatible for existing callers.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{check, diff, rules};
use config::CapiConfig;
use output::{OutputConfig, OutputFormat};

/// Structural diff and compatibility checks for C API headers.
#[derive(Parser)]
#[command(name = "capi")]
#[command(author, version)]
#[command(about = "Structural diff and compatibility checks for C API headers")]
#[command(
    long_about = "capi parses two versions of a header tree, pairs declarations by identity\nand reports every prototype, member, value and doc-tag change together with\nits compatibility verdict."
)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  capi diff sdk-old/ sdk-new/                 Show all API changes
  capi diff old.h new.h --incompatible-only   Only changes that break callers
  capi diff old/ new/ -o reports/             Also write JSON and per-kit markdown
  capi check old/ new/ --fail-on-findings     Exit non-zero on rule violations
  capi rules                                  List violation rules")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file (defaults to ./.capirc.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diff two header trees (or two header files)
    #[command(visible_alias = "d")]
    Diff {
        /// Old header directory or file
        old: PathBuf,

        /// New header directory or file
        new: PathBuf,

        /// Write diff_result.json, api_changes.json, syntax_errors.json and diff_by_kit/
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Worker threads (default: one per core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Only show changes that break existing callers
        #[arg(short, long)]
        incompatible_only: bool,
    },

    /// Report compatibility rule violations between two header trees
    Check {
        /// Old header directory or file
        old: PathBuf,

        /// New header directory or file
        new: PathBuf,

        /// Enable only these rule ids (repeatable)
        #[arg(short, long = "rule")]
        rule: Vec<String>,

        /// Exit with an error when any violation is found
        #[arg(long)]
        fail_on_findings: bool,

        /// Worker threads (default: one per core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },

    /// List compatibility violation rules
    Rules,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn load_config(path: Option<&Path>) -> CapiConfig {
    match path {
        Some(path) => CapiConfig::load_file(path),
        None => CapiConfig::load(Path::new(".")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config(cli.config.as_deref());

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    // --no-color > config > TTY detection
    let color = if cli.no_color { Some(false) } else { config.use_color() };
    let output = OutputConfig::auto_detect(format, color);
    colored::control::set_override(output.use_colors());

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Diff {
            old,
            new,
            output_dir,
            threads,
            incompatible_only,
        } => {
            let output_dir = output_dir.or_else(|| config.output_dir().map(PathBuf::from));
            diff::run(
                &old,
                &new,
                config.diff_options(threads),
                output_dir.as_deref(),
                incompatible_only,
                &output,
            )
            .await
        }
        Commands::Check {
            old,
            new,
            rule,
            fail_on_findings,
            threads,
        } => {
            check::run(
                &old,
                &new,
                config.diff_options(threads),
                config.enabled_rules(&rule),
                fail_on_findings || config.check.fail_on_findings,
                &output,
            )
            .await
        }
        Commands::Rules => rules::run(&output).await,
    }
}
