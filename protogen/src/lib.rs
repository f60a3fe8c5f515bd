//! # Protogen
//!
//! Command-line driver for the protogen generator.
//!
//! This crate provides:
//! - Argument parsing for the `render` and `list` commands
//! - Rules file loading with command-line overrides
//! - Parallel rendering of every selected type into an output directory

pub mod batch;
pub mod cli;

pub use batch::{BatchReport, render_all, select};
pub use cli::{Cli, Command, ListArgs, RenderArgs};

use anyhow::{Context, bail};
use protogen_codegen::{Generator, RenderOptions};
use protogen_schema::{ExceptionStore, parse_tree_file};
use tracing_subscriber::EnvFilter;

/// Installs the log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs a parsed command line.
///
/// # Errors
/// Returns an error if an input cannot be loaded, the output cannot be
/// written, or any type failed to render.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Render(args) => cmd_render(&args),
        Command::List(args) => cmd_list(&args),
    }
}

fn cmd_render(args: &RenderArgs) -> anyhow::Result<()> {
    let (store, options) = args.load_rules()?;
    let tree = parse_tree_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let generator = Generator::new(&tree, &store, options);

    let decls = select(&generator, &args.types, args.exported_only)?;
    let report = render_all(&generator, &decls, &args.output)?;
    for path in &report.written {
        println!("{}", path.display());
    }
    if !report.is_success() {
        bail!("{} of {} types failed to render", report.failed.len(), decls.len());
    }
    Ok(())
}

fn cmd_list(args: &ListArgs) -> anyhow::Result<()> {
    let tree = parse_tree_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let generator = Generator::new(&tree, &ExceptionStore::new(), RenderOptions::default());
    for name in generator.file_names(args.exported_only) {
        println!("{}", name);
    }
    Ok(())
}
