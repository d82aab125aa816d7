use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};

use lyrics_enrich::charts::{date_range, merge_snapshots, parse_date, plan_snapshots, snapshot_path};
use lyrics_enrich::progress::{init_logging, set_log_only};
use lyrics_enrich::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "merge-charts")]
#[command(about = "Merge daily chart snapshots (YYYY-MM-DD.csv) into one dated table")]
struct Args {
    /// Directory holding one YYYY-MM-DD.csv per chart date
    snapshot_dir: PathBuf,

    output: PathBuf,

    /// First date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: String,

    /// Last date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: String,

    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    set_log_only(args.log_only);

    let dates = date_range(parse_date(&args.start)?, parse_date(&args.end)?)?;
    info!("Processing {} dates.", dates.len());

    let plan = plan_snapshots(&args.snapshot_dir, &dates);
    for date in &plan.present {
        info!("Skipping {} (already exists)", date);
    }
    for date in &plan.missing {
        warn!("{} not downloaded", date);
    }

    let sources: Vec<PathBuf> = plan
        .present
        .iter()
        .map(|date| snapshot_path(&args.snapshot_dir, *date))
        .collect();
    let source_refs: Vec<&Path> = sources.iter().map(PathBuf::as_path).collect();
    validate_output_path(&args.output, &source_refs)?;

    let table = merge_snapshots(&args.snapshot_dir, &plan.present)?;
    table.write_csv(&args.output)?;

    println!("\n{:=<60}", "");
    println!("Chart merge complete!");
    println!("  Dates present: {}", plan.present.len());
    println!("  Dates missing: {}", plan.missing.len());
    println!("  Rows: {}", table.len());
    println!("  Output: {}", args.output.display());
    println!("{:=<60}", "");

    Ok(())
}
