use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediafeed")]
#[command(about = "An infinite media feed in the terminal", long_about = None)]
pub struct Cli {
    /// Feed server base URL (default: settings file, then http://127.0.0.1:5000)
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Maximum number of items kept rendered at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_items: Option<u64>,

    /// Force dark mode
    #[arg(long, conflicts_with = "light")]
    pub dark: bool,

    /// Force light mode
    #[arg(long, conflicts_with = "dark")]
    pub light: bool,

    /// Custom config directory (default: ~/.config/mediafeed)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one page from the feed server and print it as JSON
    Peek {
        /// Number of items to request
        #[arg(short, long, default_value_t = 6)]
        count: usize,
    },
    /// Show where settings and logs are kept
    Path,
}
