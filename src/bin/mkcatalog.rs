// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use mkcatalog::{
    catalog::{Catalog, DuplicatePolicy, Roots},
    config::{expand_config_path, ColorMode, ReporterConfig},
    guard::{require_env_vars, require_executables},
    input::{read_streams, StreamSource},
    make::MakeInvocation,
    path::{absolutize, default_config_path},
    report::{OutputFormat, Palette},
    Reporter,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{
    env::{current_dir, var_os},
    io::{stdin, stdout, IsTerminal, Write},
    path::PathBuf,
    process::exit,
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  mkcatalog [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<String>,

    /// When to color the report.
    #[arg(long, value_enum, value_name = "when")]
    pub color: Option<ColorChoice>,

    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }

    fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let color = self.color.map(ColorMode::from).unwrap_or(config.output.color);
        let colored = color.enabled(stdout().is_terminal(), var_os("NO_COLOR").is_some());
        let palette = Palette::new(colored);

        match self.command {
            Command::Report(opts) => run_report(opts, config, palette),
            Command::Scan(opts) => run_scan(opts, config, palette),
            Command::Guard(opts) => run_guard(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Report targets from a target listing and a make database dump.
    #[command(
        override_usage = "mkcatalog report [options] --targets <source> --database <source>"
    )]
    Report(ReportOptions),

    /// Run make to dump its database, and report the targets found in it.
    #[command(override_usage = "mkcatalog scan [options]")]
    Scan(ScanOptions),

    /// Check required variables and executables.
    #[command(override_usage = "mkcatalog guard [--var <name>]... [--exe <name>]...")]
    Guard(GuardOptions),
}

#[derive(Args, Clone, Debug)]
struct RenderOptions {
    /// Shape of the rendered output.
    #[arg(long, value_enum, default_value_t = FormatChoice::Text, value_name = "format")]
    pub format: FormatChoice,

    /// Report every definition of a target instead of only the last one.
    #[arg(long)]
    pub all_definitions: bool,
}

impl RenderOptions {
    fn policy(&self) -> DuplicatePolicy {
        if self.all_definitions {
            DuplicatePolicy::AllDefinitions
        } else {
            DuplicatePolicy::LastSeen
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReportOptions {
    /// Listing of candidate target names, or "-" for stdin.
    #[arg(short, long, value_name = "source")]
    pub targets: Option<StreamSource>,

    /// Make internal database dump, or "-" for stdin.
    #[arg(short, long, value_name = "source")]
    pub database: Option<StreamSource>,

    /// Directory relative paths in the dump are resolved against.
    #[arg(long, value_name = "dir")]
    pub source_root: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ScanOptions {
    /// Change into directory before reading makefiles.
    #[arg(short = 'C', long, value_name = "dir")]
    pub directory: Option<PathBuf>,

    /// Makefile to read.
    #[arg(short, long, value_name = "makefile")]
    pub file: Option<PathBuf>,

    /// Make binary to run.
    #[arg(long, default_value = "make", value_name = "program")]
    pub make: String,

    #[command(flatten)]
    pub render: RenderOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GuardOptions {
    /// Environment variable that must be set and non-empty.
    #[arg(long = "var", value_name = "name")]
    pub vars: Vec<String>,

    /// Executable that must be on PATH.
    #[arg(long = "exe", value_name = "name")]
    pub exes: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl From<ColorChoice> for ColorMode {
    fn from(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => ColorMode::Auto,
            ColorChoice::Always => ColorMode::Always,
            ColorChoice::Never => ColorMode::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatChoice {
    Text,
    Names,
}

impl From<FormatChoice> for OutputFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Text => OutputFormat::Text,
            FormatChoice::Names => OutputFormat::Names,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_filter()))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = cli.run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn load_config(path: Option<&str>) -> Result<ReporterConfig> {
    if let Some(path) = path {
        let path = expand_config_path(path)?;
        debug!("load configuration from {:?}", path.display());
        return ReporterConfig::load(&path)
            .with_context(|| format!("cannot load configuration {:?}", path.display()));
    }

    match default_config_path() {
        Ok(path) => Ok(ReporterConfig::load_or_default(&path)
            .with_context(|| format!("cannot load configuration {:?}", path.display()))?),
        Err(error) => {
            debug!("use default configuration: {error}");
            Ok(ReporterConfig::default())
        }
    }
}

fn run_report(opts: ReportOptions, config: ReporterConfig, palette: Palette) -> Result<()> {
    let (listing, dump) = read_streams(
        opts.targets.as_ref(),
        opts.database.as_ref(),
        stdin().lock(),
    )?;

    let cwd = current_dir().context("cannot determine current directory")?;
    let mut roots = Roots::new(&cwd);
    if let Some(source_root) = opts.source_root {
        roots.source = absolutize(source_root, &cwd);
    }

    let mut reporter = Reporter::new(config, palette, roots).with_policy(opts.render.policy());
    let catalog = reporter.catalog(&listing, &dump);
    write_report(&reporter, &catalog, opts.render.format)
}

fn run_scan(opts: ScanOptions, config: ReporterConfig, palette: Palette) -> Result<()> {
    let invocation = MakeInvocation {
        program: opts.make.into(),
        directory: opts.directory.clone(),
        makefile: opts.file,
    };
    let dump = invocation.dump_database()?;

    let cwd = current_dir().context("cannot determine current directory")?;
    let mut roots = Roots::new(&cwd);
    if let Some(directory) = opts.directory {
        roots.source = absolutize(directory, &cwd);
    }

    let mut reporter = Reporter::new(config, palette, roots).with_policy(opts.render.policy());
    let catalog = reporter.catalog_from_dump(&dump);
    write_report(&reporter, &catalog, opts.render.format)
}

fn run_guard(opts: GuardOptions) -> Result<()> {
    require_env_vars(opts.vars)?;
    let found = require_executables(&opts.exes)?;
    info!("all {} executable(s) found", found.len());

    Ok(())
}

fn write_report(reporter: &Reporter, catalog: &Catalog, format: FormatChoice) -> Result<()> {
    let mut out = stdout().lock();
    reporter
        .write(catalog, format.into(), &mut out)
        .context("cannot write report")?;
    out.flush().context("cannot write report")?;

    Ok(())
}
