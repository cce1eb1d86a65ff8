//! Batch enrichment of observation coordinates.
//!
//! Reads a CSV of observation coordinates, resolves the areas containing
//! each one against an area catalog, and writes the enriched records.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use alvar::models::Area;
use alvar::{AreaEnricher, EnrichmentConfig, JsonCatalog, Location};

#[derive(Parser, Debug)]
#[command(name = "enrich")]
#[command(about = "Enrich observation coordinates with the areas containing them")]
struct Args {
    /// Area catalog (JSON)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Optional TOML config (economic zone buffer, cache sizing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input CSV with id,decimalLongitude,decimalLatitude columns
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV
    #[arg(short, long)]
    output: PathBuf,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputRecord {
    id: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    decimal_longitude: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    decimal_latitude: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputRecord {
    id: String,
    decimal_longitude: Option<f64>,
    decimal_latitude: Option<f64>,
    county_id: Option<String>,
    county_name: Option<String>,
    province_id: Option<String>,
    province_name: Option<String>,
    municipality_id: Option<String>,
    municipality_name: Option<String>,
    parish_id: Option<String>,
    parish_name: Option<String>,
    country_region_id: Option<String>,
    atlas5x5_id: Option<String>,
    atlas10x10_id: Option<String>,
    is_in_economic_zone: bool,
    province_part_id: Option<String>,
    county_part_id: Option<String>,
}

impl OutputRecord {
    fn new(id: String, location: Location) -> Self {
        let id_of = |area: &Option<Area>| area.as_ref().map(|a| a.feature_id.clone());
        let name_of = |area: &Option<Area>| area.as_ref().and_then(|a| a.name.clone());

        Self {
            id,
            decimal_longitude: location.decimal_longitude,
            decimal_latitude: location.decimal_latitude,
            county_id: id_of(&location.county),
            county_name: name_of(&location.county),
            province_id: id_of(&location.province),
            province_name: name_of(&location.province),
            municipality_id: id_of(&location.municipality),
            municipality_name: name_of(&location.municipality),
            parish_id: id_of(&location.parish),
            parish_name: name_of(&location.parish),
            country_region_id: id_of(&location.country_region),
            atlas5x5_id: id_of(&location.atlas5x5),
            atlas10x10_id: id_of(&location.atlas10x10),
            is_in_economic_zone: location.is_in_economic_zone,
            province_part_id: location.province_part_id,
            county_part_id: location.county_part_id,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alvar=info,enrich=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Alvar Area Enrichment");
    info!("Input: {}", args.input.display());

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let config = match &args.config {
        Some(path) => EnrichmentConfig::load_from_file(path)?,
        None => EnrichmentConfig::default(),
    };

    let catalog = JsonCatalog::load(&args.catalog).context("Failed to load area catalog")?;
    let enricher = Arc::new(AreaEnricher::new(catalog, config));
    enricher
        .initialize()
        .await
        .context("Failed to build area index")?;

    // Read input records
    let file = File::open(&args.input).context("Failed to open input CSV")?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records: Vec<(String, Location)> = Vec::new();
    for row in reader.deserialize() {
        let row: InputRecord = row.context("Failed to read input record")?;
        let location = Location {
            decimal_longitude: row.decimal_longitude,
            decimal_latitude: row.decimal_latitude,
            ..Default::default()
        };
        records.push((row.id, location));
    }
    info!("Read {} records", records.len());

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    records.par_iter_mut().for_each(|(_, location)| {
        enricher.enrich_location(location);
        pb.inc(1);
    });

    pb.finish_with_message("Enrichment complete");

    // Write output records
    let file = File::create(&args.output).context("Failed to create output CSV")?;
    let mut writer = csv::Writer::from_writer(file);
    for (id, location) in records {
        writer.serialize(OutputRecord::new(id, location))?;
    }
    writer.flush()?;

    let stats = enricher.stats();
    info!(
        "Indexed {} areas ({} skipped) in generation {}",
        stats.indexed_areas, stats.skipped_areas, stats.generation
    );
    info!(
        "Cache: {} entries, {} hits, {} misses, {} evictions",
        stats.cache.entries, stats.cache.hits, stats.cache.misses, stats.cache.evictions
    );
    info!(
        "{} containment tests, {} overlap anomalies",
        stats.containment_tests, stats.overlap_anomalies
    );
    info!("Wrote {}", args.output.display());

    Ok(())
}
