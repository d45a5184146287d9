use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Names accepted as the first positional argument.
pub const COMMANDS: &[&str] = &["comment", "docstring", "readme", "scan"];

/// CLI argument parsing with environment variable support.
///
/// Flags override the config file and `PARROTY_*` environment variables.
/// Example: `PARROTY_MODEL_NAME=gemini-1.5-pro` is overridden by
/// `--model gemini-2.0-flash`.
#[derive(Parser, Debug)]
#[command(name = "parroty")]
#[command(about = "Generate code comments, docstrings and READMEs with a hosted LLM")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(
        short,
        long,
        global = true,
        default_value = "parroty.toml",
        env = "PARROTY_CONFIG"
    )]
    pub config: PathBuf,

    /// Model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress logs and the progress spinner
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summarize a code snippet as a one-line comment
    Comment {
        /// Code snippet, or `-` to read it from stdin
        snippet: String,

        /// Line-comment marker placed before the summary
        #[arg(long)]
        marker: Option<String>,
    },

    /// Write a docstring with Args and Returns sections for a code snippet
    Docstring {
        /// Code snippet, or `-` to read it from stdin
        snippet: String,
    },

    /// Generate a README.md from a project structure and key file contents
    Readme {
        /// Project structure listing
        structure: Option<String>,

        /// Concatenated key file contents
        contents: Option<String>,

        /// Scan this directory instead of passing structure and contents
        #[arg(short, long, conflicts_with_all = ["structure", "contents"])]
        project: Option<PathBuf>,

        /// Write the README to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the project structure and key files the README prompt would use
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Comment { .. } => "comment",
            Self::Docstring { .. } => "docstring",
            Self::Readme { .. } => "readme",
            Self::Scan { .. } => "scan",
        }
    }
}

/// Parse arguments without exiting, so the caller controls exit codes.
pub fn try_parse() -> Result<Args, clap::Error> {
    Args::try_parse()
}
