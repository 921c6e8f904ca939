use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

pub const USAGE: &str = "Requires two args: file or dir, mapping file";

#[derive(Debug, Clone, Parser)]
#[command(name = "metadata-remapper", version)]
#[command(about = "Remap class names inside compiled class metadata annotations")]
pub struct Cli {
    /// File or directory to remap in place
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Tiny mapping file (v1 or v2)
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Source namespace; detected from the mapping header when omitted
    #[arg(long, value_enum, value_name = "NS")]
    pub source_namespace: Option<SourceNamespaceArg>,

    /// Rewrite each reference span once instead of running the whole-string replace loop
    #[arg(long)]
    pub span_replace: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum SourceNamespaceArg {
    Intermediary,
    Hashed,
}
