//! Core data models for lyrics enrichment.
//!
//! Row types that flow through the pipeline (input record, derived query,
//! fetch outcome, enriched record) plus the provider-facing and run-level
//! types shared by the binaries.

use serde::Serialize;

/// Name of the column appended (or replaced) by the enrichment run.
pub const LYRICS_COLUMN: &str = "lyrics";

// ============================================================================
// Row Models
// ============================================================================

/// One input row.
///
/// `track_name` / `artist_names` are the cells used for searching. `None`
/// means the cell was absent (short row), which normalizes to an empty query.
/// `fields` is the complete original row, carried through unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRecord {
    pub track_name: Option<String>,
    pub artist_names: Option<String>,
    pub fields: Vec<String>,
}

impl TrackRecord {
    /// Convenience constructor for a row that only has the two search cells.
    pub fn new(track_name: &str, artist_names: &str) -> Self {
        Self {
            track_name: Some(track_name.to_string()),
            artist_names: Some(artist_names.to_string()),
            fields: vec![track_name.to_string(), artist_names.to_string()],
        }
    }

    pub fn title(&self) -> &str {
        self.track_name.as_deref().unwrap_or("")
    }

    pub fn artists(&self) -> &str {
        self.artist_names.as_deref().unwrap_or("")
    }
}

/// Search key derived from a `TrackRecord`. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedQuery {
    pub search_title: String,
    /// Empty when the credit string had no usable artist.
    pub search_artist: String,
}

impl NormalizedQuery {
    /// Artist to send to the provider, or `None` when empty.
    pub fn artist(&self) -> Option<&str> {
        if self.search_artist.is_empty() {
            None
        } else {
            Some(self.search_artist.as_str())
        }
    }
}

/// Result of one lyrics fetch. Errors never appear here: they collapse to `Missing`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(String),
    Missing,
}

impl FetchOutcome {
    /// `Found(text)` → `Some(text)`, `Missing` → `None` (a null cell).
    pub fn into_lyrics(self) -> Option<String> {
        match self {
            FetchOutcome::Found(text) => Some(text),
            FetchOutcome::Missing => None,
        }
    }
}

/// Input row plus its lyrics cell. Built once per row, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: TrackRecord,
    pub lyrics: Option<String>,
}

// ============================================================================
// Provider Models
// ============================================================================

/// A song hit as listed by a provider search, before its lyrics are loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCandidate {
    pub title: String,
    pub artist: String,
    pub url: String,
    /// Provider reports the lyrics transcription as complete.
    pub lyrics_complete: bool,
}

/// The match a provider returns for a query, with raw (uncleaned) lyrics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderMatch {
    pub title: String,
    pub artist: String,
    pub lyrics: String,
    pub url: String,
}

// ============================================================================
// Run Statistics
// ============================================================================

/// Counters for one enrichment run, written as JSON with `--stats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub total: usize,
    pub found: usize,
    pub missing: usize,
    /// Rows whose normalized title was empty (no provider call issued).
    pub skipped_empty_title: usize,
    /// Rows served from the lyrics cache.
    pub cache_hits: usize,
    pub elapsed_secs: f64,
}

impl RunStats {
    /// Share of rows that ended with lyrics, in percent.
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.found as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_outcome_into_lyrics() {
        assert_eq!(
            FetchOutcome::Found("la".to_string()).into_lyrics(),
            Some("la".to_string())
        );
        assert_eq!(FetchOutcome::Missing.into_lyrics(), None);
    }

    #[test]
    fn test_query_artist_empty_is_none() {
        let query = NormalizedQuery {
            search_title: "Song".to_string(),
            search_artist: String::new(),
        };
        assert_eq!(query.artist(), None);
    }

    #[test]
    fn test_hit_rate() {
        let stats = RunStats {
            total: 4,
            found: 3,
            missing: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 75.0).abs() < f64::EPSILON);
        assert_eq!(RunStats::default().hit_rate(), 0.0);
    }
}
