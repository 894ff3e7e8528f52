#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the retail radar toolchain.
//!
//! `analyze` clusters a local JSON file of raw records, `scan` runs the
//! full online pipeline around an address, and `serve` starts the API
//! server.

mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use retail_radar_analysis_models::{DEFAULT_EPS_METERS, DEFAULT_MIN_PTS};
use retail_radar_source::DEFAULT_RADIUS_METERS;

#[derive(Parser)]
#[command(name = "retail_radar", about = "Retail store clustering and market insight")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a JSON array of raw records and print the summaries
    Analyze {
        /// Path to a JSON file containing `[RawRecord]`
        #[arg(long)]
        input: PathBuf,
        /// Neighborhood radius in meters
        #[arg(long, default_value_t = DEFAULT_EPS_METERS)]
        eps: f64,
        /// Minimum points per dense neighborhood
        #[arg(long, default_value_t = DEFAULT_MIN_PTS)]
        min_pts: usize,
        /// Use the R-tree neighbor index instead of a full scan
        #[arg(long)]
        rtree: bool,
        /// Also write a `GeoJSON` `FeatureCollection` to this path
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Geocode an address, fetch nearby shops, and cluster them
    Scan {
        /// Address to center the scan on
        address: String,
        /// Search radius in meters
        #[arg(long, default_value_t = DEFAULT_RADIUS_METERS)]
        radius: f64,
        /// Neighborhood radius in meters
        #[arg(long, default_value_t = DEFAULT_EPS_METERS)]
        eps: f64,
        /// Minimum points per dense neighborhood
        #[arg(long, default_value_t = DEFAULT_MIN_PTS)]
        min_pts: usize,
        /// Ask the configured AI provider to describe the clusters
        #[arg(long)]
        insight: bool,
        /// Population JSON file (overrides `POPULATION_PATH`)
        #[arg(long)]
        population: Option<PathBuf>,
    },
    /// Start the API server (`BIND_ADDR`, `PORT`)
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            eps,
            min_pts,
            rtree,
            geojson,
        } => {
            pipeline::analyze_file(&input, eps, min_pts, rtree, geojson.as_deref())?;
        }
        Commands::Scan {
            address,
            radius,
            eps,
            min_pts,
            insight,
            population,
        } => {
            pipeline::scan(&pipeline::ScanOptions {
                address,
                radius,
                eps,
                min_pts,
                insight,
                population,
            })
            .await?;
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so run it in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(retail_radar_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}
