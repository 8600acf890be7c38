//! generate_flight_summary: build the review folder of a processed flight run
//!
//! Sample usage:
//!   generate_flight_summary --yyyymmdd 20091016 --site AN

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use flight_summary::io::run::default_output_folder;
use flight_summary::types::{LARGEST_FRAME, SMALLEST_FRAME};
use flight_summary::{
    CommandKmlMerger, FlightRun, FlightSummary, GdalGeoLocator, Site, SummaryOptions,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSite {
    #[value(name = "AN")]
    AN,
    #[value(name = "GR")]
    GR,
    #[value(name = "AL")]
    AL,
}

impl From<CliSite> for Site {
    fn from(site: CliSite) -> Self {
        match site {
            CliSite::AN => Site::AN,
            CliSite::GR => Site::GR,
            CliSite::AL => Site::AL,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "generate_flight_summary")]
#[command(about = "Generate a folder of handy review files for a processed flight run", version)]
struct Cli {
    /// Year, month and day of the flight in one YYYYMMDD string
    #[arg(long)]
    yyyymmdd: String,

    /// Location of the images
    #[arg(long, value_enum, ignore_case = true)]
    site: CliSite,

    /// Output folder [default: <SITE>_<YYYYMMDD>]
    #[arg(long)]
    output_folder: Option<PathBuf>,

    /// Folder holding all the runs [default: current directory]
    #[arg(long)]
    parent_folder: Option<PathBuf>,

    /// Skip combining kml files
    #[arg(long = "skip-kml-gen")]
    skip_kml: bool,

    /// Skip computing the geocenter of each batch, which is expensive
    #[arg(long = "skip-geo-center")]
    skip_geo: bool,

    /// Frame to start with
    #[arg(long, default_value_t = SMALLEST_FRAME)]
    start_frame: i64,

    /// Frame to stop on
    #[arg(long, default_value_t = LARGEST_FRAME)]
    stop_frame: i64,

    /// Executable that merges camera kml files
    #[arg(long, default_value = "merge_orbitviz.py")]
    merge_tool: PathBuf,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli) {
        log::error!("Flight summary failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    log::debug!("Parsed CLI args: {:?}", cli);

    NaiveDate::parse_from_str(&cli.yyyymmdd, "%Y%m%d")
        .with_context(|| format!("Invalid --yyyymmdd value: {}", cli.yyyymmdd))?;
    let site = Site::from(cli.site);

    let parent_folder = match cli.parent_folder {
        Some(folder) => folder,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    let output_folder = cli
        .output_folder
        .unwrap_or_else(|| PathBuf::from(default_output_folder(site, &cli.yyyymmdd)));

    let options = SummaryOptions {
        output_folder,
        skip_kml: cli.skip_kml,
        skip_geo: cli.skip_geo,
        start_frame: cli.start_frame,
        stop_frame: cli.stop_frame,
        merge_tool: cli.merge_tool,
    };

    let run = FlightRun::new(site, &cli.yyyymmdd, &parent_folder);
    let locator = GdalGeoLocator;
    let merger = CommandKmlMerger::new(&options.merge_tool);

    let report = FlightSummary::new(&run, &options, &locator, &merger)
        .generate()
        .with_context(|| format!("Failed to summarize run {}", run.folder().display()))?;

    log::info!(
        "Reported {} batches, {} failed geolocation, {} browse links",
        report.batches_reported,
        report.batches_failed,
        report.browse_links.len()
    );
    Ok(())
}
