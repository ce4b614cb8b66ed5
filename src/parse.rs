use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SavedListKind;

#[derive(Parser)]
#[command(name = "birding-buddy")]
#[command(about = "Browse recent bird sightings nearby and keep a list of the birds you have seen")]
#[command(version = "1.0")]
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// eBird API token (defaults to $EBIRD_API_TOKEN)
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Latitude to search around
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to search around
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Local storage file (defaults to $BIRDING_BUDDY_STORE or birding-buddy.json)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Which saved list to use
    #[arg(short, long, global = true, value_enum, default_value_t = SavedListKind::Checklist)]
    pub list: SavedListKind,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Show the bird of the day and recent sightings
    Home {
        /// Only show birds whose common name contains this text
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Also write the shown sightings to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show details and a photo for one species
    Details {
        /// eBird species code, e.g. amerob
        species_code: String,
    },
    /// Add a species to the saved list, or remove it if already there
    Toggle { species_code: String },
    /// Remove a species from the saved list
    Remove { species_code: String },
    /// Show saved species that were sighted recently
    Saved {
        /// Resolve a photo for every listed bird
        #[arg(long)]
        images: bool,

        /// Maximum number of concurrent image requests
        #[arg(short, long, default_value = "5")]
        concurrent: usize,
    },
}
