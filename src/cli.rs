use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "aniview",
    version,
    about = "Browse seasonal anime rankings, airing calendar, and favorites"
)]
pub struct Cli {
    /// Directory holding the dataset snapshots and the local store.
    /// Defaults to the platform data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the rankings table
    Rankings {
        /// Sort key: overall, anilist, mal, anitrendz, weekly
        #[arg(long)]
        sort: Option<String>,
        /// Show only the top N rows
        #[arg(long)]
        limit: Option<usize>,
        /// Show favorited titles only
        #[arg(long)]
        favorites: bool,
        /// Hide one title by exact name
        #[arg(long, value_name = "TITLE")]
        hide: Option<String>,
    },
    /// Print a month of the airing calendar
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12
        #[arg(long)]
        month: Option<u32>,
        /// Show favorited titles only
        #[arg(long)]
        favorites: bool,
    },
    /// List favorites, or toggle one by id
    Favorites {
        /// Item id to toggle
        #[arg(value_name = "ID")]
        toggle: Option<String>,
    },
    /// Show, set, or clear the custom link override for an item
    Link {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "URL")]
        url: Option<String>,
        /// Remove the override
        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },
    /// Trigger the dataset refresh endpoint and stream its progress
    Refresh {
        #[arg(value_name = "URL")]
        url: String,
    },
    Tui,
}
