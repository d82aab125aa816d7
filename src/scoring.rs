//! Scoring functions for provider search hits.
//!
//! A provider search returns a ranked list of hits; this module decides which
//! one is "the match" for a query:
//! - Non-song filtering (tracklists, liner notes, skits, incomplete transcriptions)
//! - Title similarity (exact after normalization, else Levenshtein ratio)
//! - Artist similarity (token Jaccard)
//!
//! The best score wins; ties keep the provider's own order.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::models::SearchCandidate;
use crate::normalize::{fold_key, normalize_title};

// ============================================================================
// Score Weights
// ============================================================================

/// Score for a title identical to the query after normalization and folding.
pub const EXACT_TITLE_SCORE: i32 = 100;

/// Maximum partial credit for a non-exact title (scaled by similarity).
pub const TITLE_SIMILARITY_WEIGHT: f64 = 60.0;

/// Score for an identical primary artist.
pub const EXACT_ARTIST_SCORE: i32 = 50;

/// Maximum partial credit for a non-exact artist (scaled by similarity).
pub const ARTIST_SIMILARITY_WEIGHT: f64 = 30.0;

// ============================================================================
// Regex Patterns
// ============================================================================

/// Hits whose titles mark them as something other than a song's lyrics.
pub static NON_SONG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\btrack\s?list\b").unwrap(),
        Regex::new(r"(?i)\balbum art(?:work)?\b").unwrap(),
        Regex::new(r"(?i)\bliner notes\b").unwrap(),
        Regex::new(r"(?i)\bbooklet\b").unwrap(),
        Regex::new(r"(?i)\bcredits\b").unwrap(),
        Regex::new(r"(?i)\binterview\b").unwrap(),
        Regex::new(r"(?i)\bskit\b").unwrap(),
        Regex::new(r"(?i)\binstrumental\b").unwrap(),
        Regex::new(r"(?i)\bsetlist\b").unwrap(),
    ]
});

// ============================================================================
// Pattern Matching Helpers
// ============================================================================

pub fn is_non_song_title(title: &str) -> bool {
    NON_SONG_PATTERNS.iter().any(|p| p.is_match(title))
}

/// Whether a hit can carry song lyrics at all.
pub fn is_lyrics_candidate(candidate: &SearchCandidate) -> bool {
    candidate.lyrics_complete && !candidate.url.trim().is_empty() && !is_non_song_title(&candidate.title)
}

// ============================================================================
// Similarity
// ============================================================================

/// Title similarity (0.0 to 1.0) after normalization and folding.
pub fn title_similarity(candidate_title: &str, query_title: &str) -> f64 {
    let a = fold_key(&normalize_title(candidate_title));
    let b = fold_key(query_title);
    if a == b {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Similarity between two artist names (0.0 to 1.0).
/// Uses Jaccard similarity on folded word tokens.
pub fn compute_artist_similarity(a: &str, b: &str) -> f64 {
    let a = fold_key(a);
    let b = fold_key(b);
    if a == b {
        return 1.0;
    }

    let tokens_a: FxHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: FxHashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

// ============================================================================
// Combined Scoring
// ============================================================================

/// Score one hit against the query. Higher is better.
pub fn candidate_score(
    candidate: &SearchCandidate,
    query_title: &str,
    query_artist: Option<&str>,
) -> i32 {
    let title_sim = title_similarity(&candidate.title, query_title);
    let mut score = if title_sim >= 1.0 {
        EXACT_TITLE_SCORE
    } else {
        (title_sim * TITLE_SIMILARITY_WEIGHT) as i32
    };

    if let Some(artist) = query_artist {
        let artist_sim = compute_artist_similarity(&candidate.artist, artist);
        score += if artist_sim >= 1.0 {
            EXACT_ARTIST_SCORE
        } else {
            (artist_sim * ARTIST_SIMILARITY_WEIGHT) as i32
        };
    }

    score
}

/// Pick the best lyrics-bearing hit. Ties keep the earlier hit.
pub fn select_candidate<'a>(
    candidates: &'a [SearchCandidate],
    query_title: &str,
    query_artist: Option<&str>,
) -> Option<&'a SearchCandidate> {
    let mut best: Option<(&SearchCandidate, i32)> = None;
    for candidate in candidates.iter().filter(|c| is_lyrics_candidate(c)) {
        let score = candidate_score(candidate, query_title, query_artist);
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, artist: &str) -> SearchCandidate {
        SearchCandidate {
            title: title.to_string(),
            artist: artist.to_string(),
            url: format!("https://example.test/{}", title.replace(' ', "-")),
            lyrics_complete: true,
        }
    }

    #[test]
    fn test_non_song_titles() {
        assert!(is_non_song_title("Album Tracklist"));
        assert!(is_non_song_title("Liner Notes"));
        assert!(is_non_song_title("Song (Instrumental)"));
        assert!(!is_non_song_title("Hello"));
    }

    #[test]
    fn test_exact_title_preferred_over_provider_order() {
        let hits = vec![hit("Hello World", "A"), hit("Hello", "A")];
        let best = select_candidate(&hits, "Hello", Some("A")).unwrap();
        assert_eq!(best.title, "Hello");
    }

    #[test]
    fn test_artist_breaks_title_tie() {
        let hits = vec![hit("Hello", "Someone Else"), hit("Hello", "A")];
        let best = select_candidate(&hits, "Hello", Some("A")).unwrap();
        assert_eq!(best.artist, "A");
    }

    #[test]
    fn test_ties_keep_provider_order() {
        let hits = vec![hit("Hello", "X"), hit("Hello", "Y")];
        let best = select_candidate(&hits, "Hello", None).unwrap();
        assert_eq!(best.artist, "X");
    }

    #[test]
    fn test_skips_non_lyrics_hits() {
        let mut incomplete = hit("Hello", "A");
        incomplete.lyrics_complete = false;
        let hits = vec![incomplete, hit("Hello Tracklist", "A")];
        assert!(select_candidate(&hits, "Hello", Some("A")).is_none());
        assert!(select_candidate(&[], "Hello", None).is_none());
    }

    #[test]
    fn test_candidate_title_is_normalized_before_compare() {
        assert_eq!(title_similarity("Hello (Live)", "Hello"), 1.0);
        assert_eq!(title_similarity("Héllo", "hello"), 1.0);
        assert!(title_similarity("Goodbye", "Hello") < 0.5);
    }

    #[test]
    fn test_compute_artist_similarity() {
        assert_eq!(compute_artist_similarity("The Band", "the band"), 1.0);
        assert_eq!(compute_artist_similarity("", "x"), 0.0);
        let partial = compute_artist_similarity("Big Band", "Big Orchestra");
        assert!(partial > 0.3 && partial < 0.4);
    }
}
