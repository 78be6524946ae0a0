use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hive_types::ValueType;

#[derive(Parser)]
#[command(
    name = "hive",
    about = "Hive: inspect and edit hierarchical value stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store file. Created on the first write.
    #[arg(long, global = true, default_value = "hive.db")]
    pub store: PathBuf,

    /// TOML file with store limits.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a node and any missing parents
    Mkdir(MkdirArgs),
    /// List the children of a node
    Ls(LsArgs),
    /// Print a value
    Get(GetArgs),
    /// Write a value
    Set(SetArgs),
    /// Dump a subtree as JSON
    Export(ExportArgs),
}

#[derive(Args)]
pub struct MkdirArgs {
    pub path: String,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "")]
    pub path: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub path: String,
    /// Value name; empty for the default value.
    #[arg(default_value = "")]
    pub name: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub path: String,
    pub name: String,
    /// Value text. `multi-sz` takes one argument per segment, `binary` takes hex.
    #[arg(num_args = 0..)]
    pub values: Vec<String>,
    #[arg(short = 't', long = "type", default_value = "sz")]
    pub value_type: ValueType,
}

#[derive(Args)]
pub struct ExportArgs {
    pub path: Option<String>,
}
