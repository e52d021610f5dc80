use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Move a clip from the source platform to the destination platform
    Process {
        /// Asset id on the source platform
        #[arg(short, long)]
        id: String,

        /// Start of the clip in format hh:mm:ss
        #[arg(short, long)]
        start: String,

        /// End of the clip in format hh:mm:ss
        #[arg(short, long)]
        end: String,

        /// Resolution of the clip
        #[arg(short, long, default_value = "1080p")]
        resolution: String,

        /// Title of the published clip (defaults to a dated title)
        #[arg(short, long)]
        title: Option<String>,

        /// Path to a thumbnail image activated on the published clip
        #[arg(long)]
        thumbnail: Option<PathBuf>,

        /// Also archive the trimmed clip to blob storage
        #[arg(long)]
        archive: bool,
    },

    /// Show metadata for an asset on the source platform
    Metadata {
        /// Asset id on the source platform
        #[arg(short, long)]
        id: String,
    },

    /// Trim a local media file via stream copy
    Trim {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Output media file
        #[arg(short, long)]
        output: PathBuf,

        /// Start of the range in format hh:mm:ss
        #[arg(short, long)]
        start: String,

        /// End of the range in format hh:mm:ss
        #[arg(short, long)]
        end: String,
    },
}
