//! Clipcast - Clip Republishing Pipeline
//!
//! This is the main entry point for the Clipcast application, which moves
//! clips from a source streaming platform to a destination platform using
//! yt-dlp, ffmpeg, and the destination's upload API.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipcast::cli::{Args, Commands};
use clipcast::config::Config;
use clipcast::media::{MediaProcessor, MediaProcessorFactory};
use clipcast::model::{AssetMetadata, ProcessRequest, TimeRange};
use clipcast::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Process {
            id,
            start,
            end,
            resolution,
            title,
            thumbnail,
            archive,
        } => {
            info!("Processing asset {}", id);

            let pipeline = Pipeline::new(config)?;
            let request = ProcessRequest {
                asset_id: id,
                range: TimeRange::parse(&start, &end)?,
                resolution,
                title,
                thumbnail_path: thumbnail,
                archive,
            };

            let result = pipeline.process(request).await?;
            if let Some(url) = &result.destination_url {
                println!("Published: {}", url);
            }
            if let Some(url) = &result.archive_url {
                println!("Archived:  {}", url);
            }
        }
        Commands::Metadata { id } => {
            info!("Resolving metadata for asset {}", id);

            let pipeline = Pipeline::new(config)?;
            let metadata = pipeline.metadata(&id).await?;
            print_metadata(&metadata);
        }
        Commands::Trim {
            input,
            output,
            start,
            end,
        } => {
            info!("Trimming {} locally", input.display());

            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;

            let range = TimeRange::parse(&start, &end)?;
            media.trim(&input, &output, &range).await?;
            println!("Trimmed:   {}", output.display());
        }
    }

    info!("Clipcast completed successfully");
    Ok(())
}

fn print_metadata(metadata: &AssetMetadata) {
    println!("\nAsset {}", metadata.asset_id);
    println!("{}", "-".repeat(50));
    println!("{:<14} {}", "Title", metadata.title);
    println!("{:<14} {}", "Author", metadata.author);
    println!(
        "{:<14} {}",
        "Duration",
        format_duration(metadata.duration_secs)
    );
    if let Some(date) = metadata.publish_date {
        println!("{:<14} {}", "Published", date.format("%Y-%m-%d"));
    }
    println!("{:<14} {}", "Resolutions", metadata.resolutions.join(", "));
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let app_dir = std::env::current_dir()?.join(".clipcast");
    let log_dir = app_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "clipcast.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer().with_target(false);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Format duration in seconds to human readable string
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
