//! HeaderCrawl CLI
//!
//! Harvests the headers a built CMake project includes into an output tree.

use anyhow::{Context, Result};
use clap::Parser;
use headercrawl_core::HarvestConfig;
use headercrawl_harvest::{HarvestReport, Harvester};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headercrawl")]
#[command(author, version, about = "Copy the headers a project includes", long_about = None)]
struct Cli {
    /// Build directory holding the CMake cache
    #[arg(value_name = "BUILD_DIR")]
    build_dir: PathBuf,

    /// Directory receiving the harvested headers
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source file glob (repeatable, replaces the defaults)
    #[arg(short, long = "pattern", value_name = "GLOB")]
    patterns: Vec<String>,

    /// Lines without an include tolerated after the first one (0 scans whole files)
    #[arg(long, value_name = "N")]
    include_window: Option<usize>,

    /// Scan the whole source tree instead of its top level
    #[arg(short, long)]
    recursive: bool,

    /// Cache key naming the source root
    #[arg(long, value_name = "KEY")]
    source_root_key: Option<String>,

    /// Show what would be copied without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write the header table and stage statistics as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Log every header and file
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Configuration file values overridden by explicit flags
    fn harvest_config(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HarvestConfig::default(),
        };

        if !self.patterns.is_empty() {
            config.patterns = self.patterns.clone();
        }
        if let Some(window) = self.include_window {
            config.include_window = (window > 0).then_some(window);
        }
        if let Some(key) = &self.source_root_key {
            config.source_root_key = key.clone();
        }
        config.recursive |= self.recursive;
        config.dry_run |= self.dry_run;
        Ok(config)
    }

    fn log_filter(&self) -> EnvFilter {
        let default = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let harvester = Harvester::new(cli.harvest_config()?)?;
    let report = harvester.run(&cli.build_dir, &cli.output_dir)?;

    print_summary(&report, harvester.config().dry_run);

    if let Some(path) = &cli.report {
        write_report(&report, path)?;
        println!("   Report written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &HarvestReport, dry_run: bool) {
    println!("📂 Source root: {}", report.source_root.display());
    println!("   Include paths: {}", report.include_paths.len());
    for path in &report.resolve.missing_include_paths {
        println!("     ! missing {}", path.display());
    }
    println!(
        "   Scanned {} files ({} unreadable), {} unique headers",
        report.scan.files_scanned,
        report.scan.files_unreadable,
        report.headers.len()
    );
    println!(
        "   Resolved {}, unresolved {}",
        report.headers.resolved_count(),
        report.resolve.unresolved.len()
    );
    for name in &report.resolve.unresolved {
        println!("     ? {}", name);
    }

    if dry_run {
        println!("\n📋 Would copy {} headers:", report.copy.planned.len());
        for dest in &report.copy.planned {
            println!("   {}", dest.display());
        }
    } else {
        println!(
            "\n📊 Copied {}, skipped {}, failed {}",
            report.copy.copied, report.copy.skipped, report.copy.failed
        );
    }
}

fn write_report(report: &HarvestReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}
