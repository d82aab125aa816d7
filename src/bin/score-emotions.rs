use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use lyrics_enrich::emotion::{score_table, HostedClassifier, DEFAULT_EMOTION_MODEL};
use lyrics_enrich::progress::{format_duration, init_logging, set_log_only};
use lyrics_enrich::safety::validate_output_path;
use lyrics_enrich::table::Table;

#[derive(Parser)]
#[command(name = "score-emotions")]
#[command(about = "Append per-emotion probability columns computed from the lyrics column")]
struct Args {
    /// Lyrics-enriched CSV (must have a `lyrics` column)
    input: PathBuf,

    output: PathBuf,

    /// Model id on the hosted inference service
    #[arg(long, default_value = DEFAULT_EMOTION_MODEL)]
    model: String,

    /// Full classification endpoint URL; overrides --model
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout, in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    let args = Args::parse();
    set_log_only(args.log_only);
    let start = Instant::now();

    validate_output_path(&args.output, &[args.input.as_path()])?;
    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| HostedClassifier::model_endpoint(&args.model));
    let classifier = HostedClassifier::from_env(endpoint.as_str(), Duration::from_secs(args.timeout))?;
    info!("Emotion classifier endpoint: {}", endpoint);

    let mut table = Table::read_csv(&args.input)?;
    info!("Running emotion analysis...");
    let scored = score_table(&mut table, &classifier)?;

    info!("Saving results to {}", args.output.display());
    table.write_csv(&args.output)?;

    println!("\n{:=<60}", "");
    println!("Emotion scoring complete!");
    println!("  Rows: {}", table.len());
    println!("  Scored: {}", scored);
    println!("  Null (no lyrics or failed): {}", table.len() - scored);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
