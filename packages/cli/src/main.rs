#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the property map.
//!
//! Subcommands cover the whole session: `ingest` pulls the dataset
//! archive, `backfill` fills computed columns, `map` / `export` / `stats`
//! filter the listings and produce the interactive map, the audit CSV,
//! or price-per-sqft statistics. Run with no subcommand for an
//! interactive picker.
//!
//! Uses `indicatif-log-bridge` (via [`property_map_cli_utils::init_logger`])
//! so that log lines and progress bars never fight for the terminal.

mod config;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use dialoguer::{Confirm, Select};
use property_map_cli_utils::{IndicatifProgress, MultiProgress};
use property_map_database::{paths, queries};
use property_map_filter::{FilterContext, ListingFilter};
use property_map_generate::{HeatWeight, MapInputs, Viewport};
use property_map_listings_models::ListingCriteria;
use property_map_spatial::{AreaOfInterest, TransitIndex};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "property-map", about = "Personal real-estate listing map")]
struct Cli {
    /// Config file path (defaults to ./property-map.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack the listings dataset archive
    Ingest {
        /// Archive URL; defaults to the published dataset.
        #[arg(long)]
        url: Option<String>,
        /// Overwrite an existing store without asking.
        #[arg(long)]
        force: bool,
    },
    /// Fill in computed size and price-per-sqft columns
    Backfill,
    /// Filter listings and write the interactive map
    Map {
        /// Output HTML path.
        #[arg(long, default_value = "index.html")]
        output: PathBuf,
        /// Add a heat overlay weighted by the given figure.
        #[arg(long, value_enum)]
        heat: Option<HeatArg>,
        #[command(flatten)]
        criteria: CriteriaArgs,
    },
    /// Filter listings and export the audit CSV
    Export {
        /// Output CSV path.
        #[arg(long, default_value = "listings_to_audit.csv")]
        output: PathBuf,
        #[command(flatten)]
        criteria: CriteriaArgs,
    },
    /// Print price-per-sqft statistics for the filtered set
    Stats {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },
}

/// Heat overlay weighting choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum HeatArg {
    /// Weight by asking price.
    Price,
    /// Weight by price per square foot.
    PerSqft,
}

impl From<HeatArg> for HeatWeight {
    fn from(value: HeatArg) -> Self {
        match value {
            HeatArg::Price => Self::Price,
            HeatArg::PerSqft => Self::PricePerSqft,
        }
    }
}

/// Filter criteria flags, mapped 1:1 onto [`ListingCriteria`].
///
/// Default-on exclusions take an explicit value so they can be switched
/// off: `--exclude-high-rise false`.
#[derive(Debug, clap::Args)]
struct CriteriaArgs {
    /// Exclusive lower price bound.
    #[arg(long, default_value_t = 100_000)]
    min_price: i64,

    /// Exclusive upper price bound.
    #[arg(long, default_value_t = 10_000_000)]
    max_price: i64,

    /// Exclude listings with no interior size information.
    #[arg(long)]
    must_have_size: bool,

    /// Exclude listings with no recorded price change.
    #[arg(long)]
    must_have_price_change: bool,

    /// Exclude flagged new builds.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    exclude_new_construction: bool,

    /// Exclude agricultural zoning and vacant land.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    exclude_agricultural_zoning: bool,

    /// Exclude high rises (5+ stories or a 5th-floor-plus unit number).
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    exclude_high_rise: bool,

    /// Keep only listings inside the area of interest.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    within_area_of_interest: bool,

    /// Keep only listings within this many meters of a transit stop.
    #[arg(long)]
    min_transit_distance: Option<f64>,

    /// Exclude listings with a known bedroom count below this.
    #[arg(long)]
    min_bedrooms: Option<i64>,

    /// Exclude listings with a known size below this (sqft).
    #[arg(long)]
    min_size: Option<f64>,

    /// Exclude listings with a known price-per-sqft above this.
    #[arg(long)]
    max_price_per_size: Option<f64>,

    /// Exclude listings not updated within this many days; 0 disables.
    #[arg(long, default_value_t = 14)]
    max_age_days: i64,

    /// Require a parking description containing a garage.
    #[arg(long)]
    has_garage: bool,

    /// Require any parking description.
    #[arg(long)]
    require_parking_info: bool,

    /// Exclude undivided co-ownership listings.
    #[arg(long)]
    exclude_undivided_ownership: bool,

    /// Require an upcoming open house.
    #[arg(long)]
    require_upcoming_open_house: bool,

    /// Drop listings annotated keep=false at query time.
    #[arg(long)]
    exclude_discarded: bool,

    /// Cap the result count; -1 means unbounded.
    #[arg(long, default_value_t = -1)]
    limit: i64,
}

impl From<CriteriaArgs> for ListingCriteria {
    fn from(args: CriteriaArgs) -> Self {
        Self {
            min_price: args.min_price,
            max_price: args.max_price,
            must_have_size: args.must_have_size,
            must_have_price_change: args.must_have_price_change,
            exclude_new_construction: args.exclude_new_construction,
            exclude_agricultural_zoning: args.exclude_agricultural_zoning,
            exclude_high_rise: args.exclude_high_rise,
            within_area_of_interest: args.within_area_of_interest,
            min_transit_distance: args.min_transit_distance,
            min_bedrooms: args.min_bedrooms,
            min_size: args.min_size,
            max_price_per_size: args.max_price_per_size,
            max_age_days: (args.max_age_days != 0).then_some(args.max_age_days),
            has_garage: args.has_garage,
            require_parking_info: args.require_parking_info,
            exclude_undivided_ownership: args.exclude_undivided_ownership,
            require_upcoming_open_house: args.require_upcoming_open_house,
            exclude_discarded: args.exclude_discarded,
            limit: args.limit,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = property_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Ingest { url, force }) => run_ingest(&config, url, force, &multi)?,
        Some(Commands::Backfill) => run_backfill(&config)?,
        Some(Commands::Map {
            output,
            heat,
            criteria,
        }) => run_map(&config, &output, heat, criteria.into())?,
        Some(Commands::Export { output, criteria }) => {
            run_export(&config, &output, criteria.into())?;
        }
        Some(Commands::Stats { criteria }) => run_stats(&config, criteria.into())?,
        None => run_interactively(&config, &multi)?,
    }

    Ok(())
}

/// Interactive tool picker shown when no subcommand is given. Every tool
/// runs with its default settings.
fn run_interactively(
    config: &AppConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels = [
        "Write the listing map",
        "Export the audit CSV",
        "Price-per-sqft statistics",
        "Download the dataset",
    ];

    println!("Property Map");
    println!();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match idx {
        0 => run_map(
            config,
            &PathBuf::from("index.html"),
            None,
            ListingCriteria::default(),
        ),
        1 => run_export(
            config,
            &PathBuf::from("listings_to_audit.csv"),
            ListingCriteria::default(),
        ),
        2 => run_stats(config, ListingCriteria::default()),
        _ => run_ingest(config, None, false, multi),
    }
}

/// Loads the optional geometry and annotation sources named in the
/// config. An absent file leaves that source unconfigured.
fn load_context(config: &AppConfig) -> Result<FilterContext, Box<dyn std::error::Error>> {
    let mut context = FilterContext::default();

    let aoi_path = config.area_of_interest_path();
    if aoi_path.exists() {
        context.area_of_interest = Some(AreaOfInterest::from_geojson_file(&aoi_path)?);
    } else {
        log::info!("no area of interest at {}", aoi_path.display());
    }

    let stations_path = config.stations_path();
    if stations_path.exists() {
        context.transit = Some(TransitIndex::from_geojson_file(&stations_path)?);
    } else {
        log::info!("no transit stations at {}", stations_path.display());
    }

    let notes_path = config.notes_path();
    if notes_path.exists() {
        context.annotations = property_map_annotations::load_notes_file(&notes_path)?;
    } else {
        log::info!("no notes file at {}", notes_path.display());
    }

    Ok(context)
}

fn run_map(
    config: &AppConfig,
    output: &std::path::Path,
    heat: Option<HeatArg>,
    criteria: ListingCriteria,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = property_map_database::open_read_only(&config.db_path())?;
    let context = load_context(config)?;

    let filter = ListingFilter::new(&conn, &context);
    let listings = filter.filter_listings(&criteria)?;
    let history = queries::fetch_all_price_history(&conn)?;
    let tile_key = std::env::var("THUNDERFOREST_API_KEY").ok();

    let inputs = MapInputs {
        viewport: Viewport {
            center: (config.map.center[0], config.map.center[1]),
            zoom: config.map.zoom,
        },
        annotations: &context.annotations,
        history: &history,
        area_of_interest: context.area_of_interest.as_ref(),
        transit: context.transit.as_ref(),
        heat: heat.map(HeatWeight::from),
        transport_tile_key: tile_key.as_deref(),
        today: chrono::Local::now().date_naive(),
    };

    let summary = property_map_generate::write_map(output, &listings, &inputs)?;
    println!(
        "Wrote {} listings to {} ({} skipped for missing coordinates)",
        summary.markers,
        output.display(),
        summary.skipped
    );

    Ok(())
}

fn run_export(
    config: &AppConfig,
    output: &std::path::Path,
    criteria: ListingCriteria,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = property_map_database::open_read_only(&config.db_path())?;
    let context = load_context(config)?;

    let filter = ListingFilter::new(&conn, &context);
    let listings = filter.filter_listings(&criteria)?;

    let written = property_map_generate::write_csv(output, &listings, &context.annotations)?;
    println!("Wrote {written} listings to {}", output.display());

    Ok(())
}

fn run_stats(
    config: &AppConfig,
    criteria: ListingCriteria,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = property_map_database::open_read_only(&config.db_path())?;
    let context = load_context(config)?;

    let filter = ListingFilter::new(&conn, &context);
    let listings = filter.filter_listings(&criteria)?;

    match property_map_analytics::price_per_sqft_stats(&listings) {
        Some(stats) => {
            println!("Price per sqft over {} listings:", stats.count);
            println!("  arithmetic mean: ${:.0}", stats.mean);
            println!("  geometric mean:  ${:.0}", stats.geometric_mean);
            match stats.std_dev {
                Some(std_dev) => println!("  std deviation:   ${std_dev:.0}"),
                None => println!("  std deviation:   n/a (need at least 2 samples)"),
            }
            println!("  median:          ${:.0}", stats.median);
            if stats.skipped > 0 {
                println!("  ({} listings had no usable figure)", stats.skipped);
            }
        }
        None => println!(
            "No usable price-per-sqft figures in {} listings",
            listings.len()
        ),
    }

    Ok(())
}

fn run_ingest(
    config: &AppConfig,
    url: Option<String>,
    force: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.db_path();

    if db_path.exists() && !force {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "{} already exists, download and overwrite?",
                db_path.display()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            return Ok(());
        }
    }

    let data_dir = db_path
        .parent()
        .map_or_else(paths::data_dir, std::path::Path::to_path_buf);

    let url = url.unwrap_or_else(|| config.dataset_url());
    let progress = IndicatifProgress::bytes_bar(multi, "downloading dataset");
    let archive = property_map_ingest::fetch_dataset(&url, &data_dir, &progress)?;

    log::info!("archive kept at {}", archive.display());

    run_backfill(config)
}

fn run_backfill(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = property_map_database::open(&config.db_path())?;
    let stats = property_map_database::backfill_computed(&conn)?;
    println!(
        "Backfilled {} listings ({} skipped for unparseable sizes)",
        stats.updated, stats.skipped
    );
    Ok(())
}
