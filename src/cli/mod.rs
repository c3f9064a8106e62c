//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// Quote Sync - keep a local quote collection and merge quotes from a server.
#[derive(Parser, Debug)]
#[command(name = "quotes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for listings: plain, json, or table.
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Data directory holding the quote database and config file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a random quote.
    Show {
        /// Restrict to this category ("all" for none). Defaults to the last selection.
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add a new quote.
    Add {
        /// The quote text.
        text: String,

        /// The quote's category.
        category: String,
    },

    /// List stored quotes.
    List {
        /// Restrict to this category ("all" for none). Defaults to the last selection.
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List known categories.
    Categories,

    /// Select a category for later `show` and `list` calls.
    Filter {
        /// Category name, or "all".
        category: String,
    },

    /// Export all quotes as a JSON file.
    Export {
        /// Output file path.
        #[arg(short, long, default_value = "quotes.json")]
        output: PathBuf,
    },

    /// Import quotes from a JSON file and append them.
    Import {
        /// File containing a JSON array of quotes.
        file: PathBuf,
    },

    /// Run one sync cycle against the server now.
    Sync,

    /// Sync periodically until interrupted.
    Daemon {
        /// Override the configured interval in seconds.
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show the paths being used.
    Paths,

    /// Write a default config file.
    InitConfig {
        /// Overwrite an existing file with the effective configuration.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
