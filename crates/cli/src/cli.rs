use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mpcfill_core::{CardType, Query};

#[derive(Parser, Debug)]
#[command(name = "mpcfill", about = "MPCFill helper CLI", version)]
pub struct Cli {
    /// Configuration file (TOML); MPCFILL_* environment variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for cards and print best candidates
    Search {
        /// Card name(s) to search; prefix with "t:" for tokens
        #[arg(required = true)]
        query: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output results as JSON (Type, Name, ID)
        #[arg(long)]
        json: bool,
    },

    /// Search and download best images to a folder
    Download {
        /// Card name(s) to search; prefix with "t:" for tokens
        #[arg(required = true)]
        query: Vec<String>,

        /// Destination folder
        #[arg(long)]
        dest: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Parallel downloads (default from config, 1)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// List catalog data
    List {
        /// What to list
        #[arg(value_enum)]
        what: ListTarget,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListTarget {
    Sources,
    Languages,
    Tags,
    Dfcs,
}

/// Search filters shared by `search` and `download`.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Language codes or names (e.g. EN, ENGLISH)
    #[arg(long, num_args = 0..)]
    pub languages: Vec<String>,

    /// Tags to require, by name or constant (e.g. FULL_ART)
    #[arg(long, num_args = 0..)]
    pub include_tags: Vec<String>,

    /// Tags to exclude, by name or constant (e.g. NSFW)
    #[arg(long, num_args = 0..)]
    pub exclude_tags: Vec<String>,

    #[arg(long)]
    pub minimum_dpi: Option<i32>,

    #[arg(long)]
    pub maximum_dpi: Option<i32>,

    /// Maximum file size in MB
    #[arg(long)]
    pub maximum_size: Option<i32>,

    #[arg(long)]
    pub fuzzy: bool,

    #[arg(long)]
    pub filter_cardbacks: bool,

    /// Do not search back faces of double-faced cards
    #[arg(long)]
    pub no_backs: bool,

    /// Source names to prefer. Priority follows order (left to right)
    #[arg(long, num_args = 0..)]
    pub prefer_sources: Vec<String>,

    /// Source names to disable
    #[arg(long, num_args = 0..)]
    pub disable_sources: Vec<String>,
}

/// Build search queries; a case-insensitive `t:` prefix marks a token.
pub fn build_queries(raw: &[String]) -> Vec<Query> {
    raw.iter()
        .map(|item| {
            let is_token = item
                .get(..2)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("t:"));
            if is_token {
                Query::new(&item[2..], CardType::Token)
            } else {
                Query::new(item.as_str(), CardType::Card)
            }
        })
        .collect()
}
