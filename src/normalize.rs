//! Name normalization for provider search queries.
//!
//! Turns raw chart titles and artist credit strings into the minimal strings
//! sent to the lyrics provider, plus an ASCII-folded key form used for cache
//! lookups and hit comparison.
//!
//! CRITICAL: cache keys are derived from these functions. Run tests after changes.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::NormalizedQuery;

// ============================================================================
// CONSTANTS & PATTERNS
// ============================================================================

/// Characters that open a descriptor suffix: "Song (Remastered 2011)", "Song - Live".
pub const TITLE_DESCRIPTOR_OPENERS: [char; 2] = ['(', '-'];

/// Artist credit separators, in priority order.
/// Only the first separator present in the string is applied.
pub const ARTIST_SEPARATORS: [&str; 4] = [",", "&", "feat.", "ft."];

/// Any run of whitespace, collapsed to a single space.
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII: NFKD, drop combining marks, transliterate.
/// e.g., "Beyoncé" → "beyonce", "Кино" → "kino"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").trim().to_string()
}

/// Comparison key: ASCII-folded, lowercased, whitespace-collapsed.
/// Never sent to the provider; used for cache keys and hit matching only.
pub fn fold_key(s: &str) -> String {
    collapse_whitespace(&fold_to_ascii(s))
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a raw track title into a search title.
///
/// Truncates at the earliest `(` or `-` and trims. If that leaves nothing
/// (e.g. "(Intro)"), the whole trimmed title is used instead.
pub fn normalize_title(title: &str) -> String {
    let cut = title.find(TITLE_DESCRIPTOR_OPENERS).unwrap_or(title.len());
    let prefix = title[..cut].trim();
    if prefix.is_empty() {
        title.trim().to_string()
    } else {
        prefix.to_string()
    }
}

/// Normalize an artist credit string to the primary credited artist.
///
/// "Artist A, Artist B" → "Artist A", "Artist A feat. Artist B" → "Artist A".
/// Separators are tried in `ARTIST_SEPARATORS` order and only the first one
/// found is applied, so "A feat. B, C" → "A feat. B".
pub fn normalize_artist(artists: &str) -> String {
    let primary = ARTIST_SEPARATORS
        .iter()
        .find_map(|sep| artists.split_once(sep).map(|(head, _)| head))
        .unwrap_or(artists);
    collapse_whitespace(primary)
}

/// Build the provider query for one row.
pub fn normalize_query(title: &str, artists: &str) -> NormalizedQuery {
    NormalizedQuery {
        search_title: normalize_title(title),
        search_artist: normalize_artist(artists),
    }
}

// ============================================================================
// TESTS
// ============================================================================
