use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "file-scout")]
#[command(about = "Catalog, search, count and dedupe a directory of text files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the text files in a directory with their size, word and char counts
    Load { dir: PathBuf },
    /// Create a new file; fails if the name is taken
    Create {
        dir: PathBuf,
        name: String,
        content: String,
    },
    /// Delete a file
    Delete { dir: PathBuf, name: String },
    /// Append content to an existing file
    Append {
        dir: PathBuf,
        name: String,
        content: String,
    },
    /// Delete files whose content duplicates another file, keeping the first by name
    Dedupe {
        dir: PathBuf,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List files containing a keyword (case-sensitive)
    Search { dir: PathBuf, keyword: String },
    /// Word frequencies of one file
    Count {
        dir: PathBuf,
        name: String,
        /// Number of counting workers
        #[arg(short, long, default_value_t = 4)]
        workers: usize,
        /// Only show the N most frequent words
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Print configuration values
    PrintConfig,
}
