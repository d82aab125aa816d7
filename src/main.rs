use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use lyrics_enrich::cache::LyricsCache;
use lyrics_enrich::config::EnrichConfig;
use lyrics_enrich::fetcher::LyricsFetcher;
use lyrics_enrich::models::LYRICS_COLUMN;
use lyrics_enrich::progress::{format_duration, init_logging, set_log_only};
use lyrics_enrich::provider::GeniusProvider;
use lyrics_enrich::runner::EnrichmentRunner;
use lyrics_enrich::safety::validate_output_path;
use lyrics_enrich::table::Table;

#[derive(Parser)]
#[command(name = "lyrics-enrich")]
#[command(about = "Attach cleaned lyrics to every row of a chart table")]
struct Args {
    /// Input CSV (default: charts.csv, or `input` from --config)
    input: Option<PathBuf>,

    /// Output CSV (default: lyrics_enriched_tracks.csv)
    output: Option<PathBuf>,

    /// TOML file with run settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    title_column: Option<String>,

    #[arg(long)]
    artist_column: Option<String>,

    /// Minimum politeness delay between rows, in seconds
    #[arg(long)]
    min_delay: Option<f64>,

    /// Maximum politeness delay between rows, in seconds
    #[arg(long)]
    max_delay: Option<f64>,

    /// Provider request timeout, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// SQLite lyrics cache (created if missing)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide progress bars and log periodic progress lines instead
    #[arg(long)]
    log_only: bool,
}

impl Args {
    fn into_config(self) -> Result<EnrichConfig> {
        let mut config = match &self.config {
            Some(path) => EnrichConfig::load(path)?,
            None => EnrichConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(column) = self.title_column {
            config.title_column = column;
        }
        if let Some(column) = self.artist_column {
            config.artist_column = column;
        }
        if let Some(secs) = self.min_delay {
            config.min_delay_secs = secs;
        }
        if let Some(secs) = self.max_delay {
            config.max_delay_secs = secs;
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if self.cache.is_some() {
            config.cache = self.cache;
        }
        if self.stats.is_some() {
            config.stats = self.stats;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // A missing .env is fine; the token may come from the real environment.
    dotenv::dotenv().ok();
    init_logging();

    let args = Args::parse();
    set_log_only(args.log_only);
    let config = args.into_config()?;

    // Everything that can be wrong with the setup fails here, before any row.
    let delay = config.delay_policy()?;
    validate_output_path(&config.output, &[config.input.as_path()])?;
    let provider = GeniusProvider::from_env(config.timeout())?;
    info!("Genius API client initialized");

    let mut table = Table::read_csv(&config.input)?;
    let (title_index, artist_index) =
        table.resolve_columns(&config.title_column, &config.artist_column)?;
    let records = table.track_records(title_index, artist_index);

    let mut fetcher = LyricsFetcher::new(provider);
    if let Some(path) = &config.cache {
        info!("Using lyrics cache: {}", path.display());
        fetcher = fetcher.with_cache(LyricsCache::open(path)?);
    }

    let mut runner = EnrichmentRunner::new(fetcher, delay);
    let run = runner.run(&records);

    table.set_column(LYRICS_COLUMN, run.lyrics_column())?;
    table.write_csv(&config.output)?;
    info!("Saved lyrics to {}", config.output.display());

    if let Some(path) = &config.stats {
        let json = serde_json::to_string_pretty(&run.stats)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write stats {}", path.display()))?;
    }

    let stats = &run.stats;
    println!("\n{:=<60}", "");
    println!("Lyrics enrichment complete!");
    println!("  Rows: {}", stats.total);
    println!("  Found: {} ({:.1}%)", stats.found, stats.hit_rate());
    println!("  Missing: {}", stats.missing);
    println!("  Skipped (empty title): {}", stats.skipped_empty_title);
    if config.cache.is_some() {
        println!("  Cache hits: {}", stats.cache_hits);
    }
    println!(
        "  Elapsed: {}",
        format_duration(Duration::from_secs_f64(stats.elapsed_secs))
    );
    println!("{:=<60}", "");

    Ok(())
}
