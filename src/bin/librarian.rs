//! # Librarian CLI Entry Point
//!
//! ```bash
//! librarian --db bugs.db --templates sql                 # interactive shell
//! librarian --db bugs.db --templates sql t_count         # one-shot run
//! librarian --templates sql --layout blocks --check      # compile every tag
//! librarian --config librarian.toml                      # settings file
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use eyre::{bail, Result, WrapErr};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use librarian::cli::commands::{parse_assignment, render_context};
use librarian::cli::{Layout, Repl, Settings, ShellLibrarian};
use librarian::Context;

#[derive(Parser)]
#[command(name = "librarian")]
#[command(version, about = "Run named SQL templates against a database", long_about = None)]
struct Cli {
    /// SQLite database file (in-memory when omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory holding the templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Template layout
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Template file extension
    #[arg(long)]
    extension: Option<String>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave transactions open until an explicit commit
    #[arg(long)]
    no_auto_commit: bool,

    /// Read and write index 0 of top-level sequences
    #[arg(long)]
    all_arrays: bool,

    /// Compile every tag, report failures and exit
    #[arg(long)]
    check: bool,

    /// Tag to run once, instead of starting the shell
    tag: Option<String>,

    /// Context assignments for the one-shot run
    #[arg(value_name = "KEY=VALUE", requires = "tag")]
    assignments: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Files,
    Blocks,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Files => Layout::Files,
            LayoutArg::Blocks => Layout::Blocks,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = merge_settings(&cli)?;
    let mut librarian = settings.open().wrap_err("failed to open librarian")?;

    if cli.check {
        return check_all(&mut librarian);
    }

    if let Some(tag) = &cli.tag {
        run_once(&mut librarian, tag, &cli.assignments)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut repl = Repl::new(librarian)?;
    repl.run()?;
    Ok(ExitCode::SUCCESS)
}

fn merge_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(db) = &cli.db {
        settings.database = Some(db.clone());
    }
    if let Some(dir) = &cli.templates {
        settings.templates = Some(dir.clone());
    }
    if let Some(layout) = cli.layout {
        settings.layout = layout.into();
    }
    if let Some(ext) = &cli.extension {
        settings.extension = Some(ext.clone());
    }
    if cli.no_auto_commit {
        settings.librarian.auto_commit = false;
    }
    if cli.all_arrays {
        settings.librarian.all_arrays = true;
    }

    Ok(settings)
}

fn check_all(librarian: &mut ShellLibrarian) -> Result<ExitCode> {
    let tags = librarian.toc()?;
    let mut failures = 0;

    for tag in &tags {
        match librarian.prepare([tag]) {
            Ok(()) => println!("ok    {}", tag),
            Err(err) => {
                failures += 1;
                println!("FAIL  {}: {}", tag, err);
            }
        }
    }

    println!("{} tag(s), {} failed", tags.len(), failures);
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_once(librarian: &mut ShellLibrarian, tag: &str, assignments: &[String]) -> Result<()> {
    let mut ctx = Context::new();
    for arg in assignments {
        match parse_assignment(arg) {
            Ok((key, value)) => {
                ctx.insert(key, value);
            }
            Err(msg) => bail!(msg),
        }
    }

    let affected = librarian
        .execute(tag, &mut ctx)
        .wrap_err_with(|| format!("failed to execute '{}'", tag))?;
    librarian.disconnect()?;

    eprintln!("{} row(s) affected", affected);
    println!("{}", render_context(&ctx));
    Ok(())
}
