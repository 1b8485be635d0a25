use clap::{Parser, Subcommand};
use series::{DEFAULT_LANGUAGE, parse_episode_code};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "series")]
#[command(author, version, about = "Rename downloaded TV episodes and keep track of watched ones")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename the episodes in a download directory and add them to the index
    Rename {
        /// Directory holding the downloads (defaults to the configured one)
        dir: Option<PathBuf>,

        /// Only update the index, leave the files untouched
        #[arg(long)]
        no_rename: bool,

        /// Rename the files without adding them to the index
        #[arg(long)]
        no_index: bool,
    },

    /// Manage the series index
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },
}

#[derive(Subcommand)]
pub enum IndexCommands {
    /// Create an empty index file
    Init,

    /// Start watching series
    Add {
        /// Series names
        #[arg(required = true)]
        names: Vec<String>,

        /// Language the series are watched in
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        lang: String,

        /// First episode to watch; everything before counts as watched
        #[arg(short, long, default_value = "S01E01", value_parser = parse_first_episode)]
        first_episode: EpisodeCode,
    },

    /// Stop watching series
    Remove {
        /// Canonical series names
        #[arg(required = true)]
        names: Vec<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add alternative names to a series
    Alias {
        /// Series name or existing alias
        name: String,

        /// New aliases
        #[arg(required = true)]
        aliases: Vec<String>,
    },

    /// List all watched series
    List,

    /// Show the languages and episodes of a series
    Show {
        /// Series name or alias
        name: String,
    },

    /// Mark a single episode as watched
    Mark {
        /// Series name or alias
        name: String,

        /// Episode code like S01E05
        #[arg(value_parser = parse_episode)]
        episode: EpisodeCode,

        /// Language the episode was watched in
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        lang: String,
    },
}

/// A season/episode pair given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeCode {
    pub season: u32,
    pub episode: u32,
}

fn parse_episode(value: &str) -> Result<EpisodeCode, String> {
    parse_episode_code(value)
        .map(|(season, episode)| EpisodeCode { season, episode })
        .ok_or_else(|| format!("'{value}' is not an episode code like S01E05"))
}

fn parse_first_episode(value: &str) -> Result<EpisodeCode, String> {
    let code = parse_episode(value)?;
    if code.season < 1 || code.episode < 1 {
        return Err(format!("'{value}': season and episode must be at least 1"));
    }
    Ok(code)
}
