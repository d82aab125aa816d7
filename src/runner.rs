//! Sequential enrichment loop.
//!
//! One fetch per row, strictly in input order, followed by a politeness delay
//! drawn uniformly from `[min, max]`. The delay is the only throttle on the
//! provider, so it is applied after every row, hit or miss, including the last.
//! A miss is data (a null lyrics cell); nothing in the loop is fatal.
//!
//! The runner takes an already-constructed provider: credentials are checked
//! when the provider is built, before any row is seen.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use log::info;
use rand::Rng;

use crate::fetcher::{FetchSource, LyricsFetcher};
use crate::models::{EnrichedRecord, FetchOutcome, RunStats, TrackRecord};
use crate::progress::{create_progress_bar, log_progress};
use crate::provider::LyricsProvider;

/// Rows between log lines in log-only mode.
const LOG_INTERVAL: u64 = 25;

// ============================================================================
// Delay Policy
// ============================================================================

/// Uniform politeness delay bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayPolicy {
    min_secs: f64,
    max_secs: f64,
}

impl DelayPolicy {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 {
            bail!(
                "Delay bounds must be finite and non-negative (got {} .. {})",
                min_secs,
                max_secs
            );
        }
        if min_secs > max_secs {
            bail!(
                "Minimum delay {}s is greater than maximum delay {}s",
                min_secs,
                max_secs
            );
        }
        for secs in [min_secs, max_secs] {
            if Duration::try_from_secs_f64(secs).is_err() {
                bail!("Delay of {}s cannot be represented as a duration", secs);
            }
        }
        Ok(Self { min_secs, max_secs })
    }

    /// No delay at all (tests, replaying from cache only).
    pub fn none() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs)
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_secs_f64(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

// ============================================================================
// Throttle
// ============================================================================

/// Where the politeness delay is spent.
pub trait Throttle {
    fn pause(&mut self, delay: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepThrottle;

impl Throttle for SleepThrottle {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Output of one run: enriched rows in input order, plus counters.
#[derive(Debug, Clone)]
pub struct EnrichmentRun {
    pub records: Vec<EnrichedRecord>,
    pub stats: RunStats,
}

impl EnrichmentRun {
    /// The lyrics column, one cell per input row, `None` for misses.
    pub fn lyrics_column(&self) -> Vec<Option<String>> {
        self.records.iter().map(|r| r.lyrics.clone()).collect()
    }
}

pub struct EnrichmentRunner<P, T = SleepThrottle> {
    fetcher: LyricsFetcher<P>,
    delay: DelayPolicy,
    throttle: T,
}

impl<P: LyricsProvider> EnrichmentRunner<P, SleepThrottle> {
    pub fn new(fetcher: LyricsFetcher<P>, delay: DelayPolicy) -> Self {
        Self::with_throttle(fetcher, delay, SleepThrottle)
    }
}

impl<P: LyricsProvider, T: Throttle> EnrichmentRunner<P, T> {
    pub fn with_throttle(fetcher: LyricsFetcher<P>, delay: DelayPolicy, throttle: T) -> Self {
        Self {
            fetcher,
            delay,
            throttle,
        }
    }

    pub fn fetcher(&self) -> &LyricsFetcher<P> {
        &self.fetcher
    }

    pub fn throttle(&self) -> &T {
        &self.throttle
    }

    /// Enrich every record, in order. Never fails: misses become `None`.
    pub fn run(&mut self, records: &[TrackRecord]) -> EnrichmentRun {
        let start = Instant::now();
        let total = records.len() as u64;
        let mut rng = rand::thread_rng();
        let mut stats = RunStats {
            total: records.len(),
            ..Default::default()
        };
        let mut enriched = Vec::with_capacity(records.len());

        info!("Total rows to process: {}", records.len());
        let pb = create_progress_bar(total, "Fetching lyrics");

        for (index, record) in records.iter().enumerate() {
            pb.set_message(record.title().to_string());

            let (outcome, source) = self
                .fetcher
                .fetch_with_source(record.title(), record.artists());
            match source {
                FetchSource::SkippedEmptyTitle => stats.skipped_empty_title += 1,
                FetchSource::Cache => stats.cache_hits += 1,
                FetchSource::Provider => {}
            }
            match outcome {
                FetchOutcome::Found(_) => stats.found += 1,
                FetchOutcome::Missing => stats.missing += 1,
            }

            enriched.push(EnrichedRecord {
                record: record.clone(),
                lyrics: outcome.into_lyrics(),
            });

            self.throttle.pause(self.delay.sample(&mut rng));

            pb.inc(1);
            log_progress("lyrics", index as u64 + 1, total, LOG_INTERVAL);
        }

        pb.finish_and_clear();
        stats.elapsed_secs = start.elapsed().as_secs_f64();

        EnrichmentRun {
            records: enriched,
            stats,
        }
    }
}
