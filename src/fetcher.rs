//! Per-track lyrics fetch: normalize, search, validate, clean.
//!
//! This is the boundary where provider failures stop. Whatever the provider
//! does (no match, empty text, network/auth/rate-limit/parse errors), the
//! caller only ever sees `FetchOutcome::Found` or `FetchOutcome::Missing`.

use log::{debug, info, warn};

use crate::cache::LyricsCache;
use crate::clean::clean_lyrics;
use crate::models::{FetchOutcome, NormalizedQuery};
use crate::normalize::normalize_query;
use crate::provider::LyricsProvider;

/// Where a fetch outcome came from, for run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Normalized title was empty; no lookup at all.
    SkippedEmptyTitle,
    Cache,
    Provider,
}

pub struct LyricsFetcher<P> {
    provider: P,
    cache: Option<LyricsCache>,
}

impl<P: LyricsProvider> LyricsFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: None,
        }
    }

    /// Serve repeated queries from `cache` and store found lyrics in it.
    pub fn with_cache(mut self, cache: LyricsCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch cleaned lyrics for a raw (title, artist credits) pair.
    pub fn fetch(&self, title: &str, artists: &str) -> FetchOutcome {
        self.fetch_with_source(title, artists).0
    }

    /// Like `fetch`, also reporting where the outcome came from.
    pub fn fetch_with_source(&self, title: &str, artists: &str) -> (FetchOutcome, FetchSource) {
        let query = normalize_query(title, artists);

        if query.search_title.is_empty() {
            debug!("Skipping row with empty title (artists: '{}')", artists);
            return (FetchOutcome::Missing, FetchSource::SkippedEmptyTitle);
        }

        if let Some(lyrics) = self.cached(&query) {
            debug!("Cache hit: '{}' by '{}'", query.search_title, query.search_artist);
            return (FetchOutcome::Found(lyrics), FetchSource::Cache);
        }

        let outcome = self.fetch_from_provider(&query);
        if let FetchOutcome::Found(lyrics) = &outcome {
            self.store(&query, lyrics);
        }
        (outcome, FetchSource::Provider)
    }

    fn fetch_from_provider(&self, query: &NormalizedQuery) -> FetchOutcome {
        info!("Fetching: '{}' by '{}'", query.search_title, query.search_artist);

        let found = match self.provider.search(&query.search_title, query.artist()) {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!("No match for '{}'", query.search_title);
                return FetchOutcome::Missing;
            }
            Err(e) => {
                debug!(
                    "Error fetching '{}' by '{}': {}",
                    query.search_title, query.search_artist, e
                );
                return FetchOutcome::Missing;
            }
        };

        if found.lyrics.is_empty() {
            debug!("Match '{}' has no lyrics text", found.title);
            return FetchOutcome::Missing;
        }

        let cleaned = clean_lyrics(&found.lyrics, &query.search_title);
        if cleaned.is_empty() {
            debug!("Lyrics for '{}' were empty after cleaning", found.title);
            FetchOutcome::Missing
        } else {
            FetchOutcome::Found(cleaned)
        }
    }

    fn cached(&self, query: &NormalizedQuery) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(query) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Lyrics cache read failed, fetching instead: {}", e);
                None
            }
        }
    }

    fn store(&self, query: &NormalizedQuery, lyrics: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(query, lyrics) {
                warn!("Lyrics cache write failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ProviderMatch;
    use crate::provider::ProviderError;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Stub provider: canned matches per (title, artist), counts calls.
    #[derive(Default)]
    pub(crate) struct StubProvider {
        pub matches: HashMap<(String, Option<String>), String>,
        pub calls: Cell<usize>,
        pub queries: RefCell<Vec<(String, Option<String>)>>,
    }

    impl StubProvider {
        pub(crate) fn with_match(mut self, title: &str, artist: Option<&str>, lyrics: &str) -> Self {
            self.matches.insert(
                (title.to_string(), artist.map(str::to_string)),
                lyrics.to_string(),
            );
            self
        }
    }

    impl LyricsProvider for StubProvider {
        fn search(
            &self,
            title: &str,
            artist: Option<&str>,
        ) -> Result<Option<ProviderMatch>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            let key = (title.to_string(), artist.map(str::to_string));
            self.queries.borrow_mut().push(key.clone());
            Ok(self.matches.get(&key).map(|lyrics| ProviderMatch {
                title: title.to_string(),
                artist: artist.unwrap_or_default().to_string(),
                lyrics: lyrics.clone(),
                url: String::new(),
            }))
        }
    }

    /// Stub provider that always fails with the configured error kind.
    struct FailingProvider {
        kind: usize,
        calls: Cell<usize>,
    }

    impl LyricsProvider for FailingProvider {
        fn search(
            &self,
            _title: &str,
            _artist: Option<&str>,
        ) -> Result<Option<ProviderMatch>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            Err(match self.kind {
                0 => ProviderError::Unauthorized(401),
                1 => ProviderError::RateLimited,
                2 => ProviderError::Status(500),
                3 => ProviderError::Timeout("read".to_string()),
                4 => ProviderError::Transport("connection reset".to_string()),
                _ => ProviderError::Malformed("not json".to_string()),
            })
        }
    }

    #[test]
    fn test_found_is_cleaned() {
        let provider = StubProvider::default().with_match(
            "Hello",
            Some("A"),
            "Hello Lyrics[Intro]La la la123Embed",
        );
        let fetcher = LyricsFetcher::new(provider);
        assert_eq!(
            fetcher.fetch("Hello (Live)", "A, B"),
            FetchOutcome::Found("La la la".to_string())
        );
        assert_eq!(
            fetcher.provider().queries.borrow()[0],
            ("Hello".to_string(), Some("A".to_string()))
        );
    }

    #[test]
    fn test_empty_title_issues_no_call() {
        let fetcher = LyricsFetcher::new(StubProvider::default());
        for title in ["", "   ", "\t\n"] {
            assert_eq!(fetcher.fetch(title, "C"), FetchOutcome::Missing);
        }
        assert_eq!(fetcher.provider().calls.get(), 0);
        assert_eq!(
            fetcher.fetch_with_source("", "C").1,
            FetchSource::SkippedEmptyTitle
        );
    }

    #[test]
    fn test_empty_artist_searches_without_artist() {
        let provider = StubProvider::default().with_match("Solo", None, "Solo Lyrics\nwords");
        let fetcher = LyricsFetcher::new(provider);
        assert_eq!(fetcher.fetch("Solo", ""), FetchOutcome::Found("words".to_string()));
    }

    #[test]
    fn test_no_match_is_missing() {
        let fetcher = LyricsFetcher::new(StubProvider::default());
        assert_eq!(fetcher.fetch("Unknown", "Nobody"), FetchOutcome::Missing);
        assert_eq!(fetcher.provider().calls.get(), 1);
    }

    #[test]
    fn test_empty_or_noise_only_lyrics_are_missing() {
        let provider = StubProvider::default()
            .with_match("Blank", Some("A"), "")
            .with_match("Noise", Some("A"), "Noise Lyrics[Instrumental]42Embed");
        let fetcher = LyricsFetcher::new(provider);
        assert_eq!(fetcher.fetch("Blank", "A"), FetchOutcome::Missing);
        assert_eq!(fetcher.fetch("Noise", "A"), FetchOutcome::Missing);
    }

    #[test]
    fn test_provider_errors_become_missing() {
        for kind in 0..6 {
            let fetcher = LyricsFetcher::new(FailingProvider {
                kind,
                calls: Cell::new(0),
            });
            assert_eq!(fetcher.fetch("Song", "Artist"), FetchOutcome::Missing);
            assert_eq!(fetcher.provider().calls.get(), 1);
        }
    }

    #[test]
    fn test_cache_hit_skips_provider() {
        let provider = StubProvider::default().with_match("Song", Some("Artist"), "Song Lyrics words");
        let fetcher = LyricsFetcher::new(provider).with_cache(LyricsCache::in_memory().unwrap());

        assert_eq!(
            fetcher.fetch_with_source("Song", "Artist"),
            (FetchOutcome::Found("words".to_string()), FetchSource::Provider)
        );
        assert_eq!(
            fetcher.fetch_with_source("Song - Remix", "Artist & Other"),
            (FetchOutcome::Found("words".to_string()), FetchSource::Cache)
        );
        assert_eq!(fetcher.provider().calls.get(), 1);
    }

    #[test]
    fn test_missing_is_not_cached() {
        let fetcher = LyricsFetcher::new(StubProvider::default())
            .with_cache(LyricsCache::in_memory().unwrap());
        assert_eq!(fetcher.fetch("Gone", "Nobody"), FetchOutcome::Missing);
        assert_eq!(fetcher.fetch("Gone", "Nobody"), FetchOutcome::Missing);
        assert_eq!(fetcher.provider().calls.get(), 2);
    }

    #[test]
    fn test_fetch_is_repeatable() {
        let provider = StubProvider::default().with_match("Hello", Some("A"), "Hello Lyrics[x]y");
        let fetcher = LyricsFetcher::new(provider);
        let first = fetcher.fetch("Hello", "A");
        assert_eq!(fetcher.fetch("Hello", "A"), first);
    }
}
