//! Command-line argument parsing for admitbuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// admitbuddy - Grounded Q&A for the MS in Applied Data Science program
#[derive(Parser, Debug)]
#[command(name = "admitbuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version = "0.3.0")]
#[command(about = "Ask questions about the MS in Applied Data Science program", long_about = None)]
pub struct Args {
    /// Ollama model used for answer generation
    #[arg(short, long)]
    pub model: Option<String>,

    /// Qdrant URL override
    #[arg(long)]
    pub qdrant_url: Option<String>,

    /// Verbosity level: default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the answer)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Reference date for the temporal filter (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Candidates fetched from the vector index
        #[arg(long)]
        k: Option<usize>,

        /// Passages kept after reranking
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start an interactive chat session
    Chat,

    /// Ingest a directory of program documents into the index
    Ingest {
        /// Directory of .txt documents
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Run service health checks
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Check if pipeline stage details should be shown
    pub fn show_stages(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Check if progress spinners should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
