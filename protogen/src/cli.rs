//! Command-line arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use protogen_codegen::{ProtoVersion, RenderOptions};
use protogen_schema::{ExceptionStore, RulesFile};

#[derive(Debug, Parser)]
#[command(name = "protogen")]
#[command(about = "Generates IDL declarations and transcoding functions from structure descriptions")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render .proto, .h and .cpp files for the types of a description
    Render(RenderArgs),
    /// Print the names of the files a render would produce
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Structure description (XML)
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Rules file (TOML)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Emit proto3 syntax
    #[arg(long)]
    pub proto3: bool,

    /// IDL package
    #[arg(long)]
    pub package: Option<String>,

    /// Emit a comment in place of ignored fields
    #[arg(long)]
    pub comment_ignored: bool,

    /// Ignore fields without an export flag
    #[arg(long)]
    pub ignore_no_export: bool,

    /// Render only these types (repeatable)
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,

    /// Render only types marked export="true"
    #[arg(long)]
    pub exported_only: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Structure description (XML)
    pub input: PathBuf,

    /// List only types marked export="true"
    #[arg(long)]
    pub exported_only: bool,
}

impl RenderArgs {
    /// Loads the rules file, if any, and overlays the command-line flags on
    /// its options.
    ///
    /// # Errors
    /// Returns an error if the rules file cannot be loaded.
    pub fn load_rules(&self) -> anyhow::Result<(ExceptionStore, RenderOptions)> {
        let (store, mut options) = match &self.rules {
            Some(path) => {
                let file = RulesFile::from_path(path)
                    .with_context(|| format!("failed to load rules from {}", path.display()))?;
                let options = RenderOptions::new().merge(&file.options)?;
                (file.to_store()?, options)
            }
            None => (ExceptionStore::new(), RenderOptions::new()),
        };

        if self.proto3 {
            options = options.version(ProtoVersion::Proto3);
        }
        if let Some(package) = &self.package {
            options = options.proto_package(package.as_str());
        }
        if self.comment_ignored {
            options = options.comment_ignored(true);
        }
        if self.ignore_no_export {
            options = options.ignore_no_export(true);
        }
        Ok((store, options))
    }
}
