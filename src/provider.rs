//! Lyrics provider seam and the Genius binding.
//!
//! `LyricsProvider` is the capability the fetcher depends on: search by
//! (title, artist) and return a match carrying raw lyrics, or no match.
//! `GeniusProvider` implements it with the Genius search API (bearer token)
//! plus an HTML fetch of the chosen song page.

use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::debug;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{ProviderMatch, SearchCandidate};
use crate::scoring::select_candidate;

pub const GENIUS_API_BASE: &str = "https://api.genius.com";
pub const GENIUS_TOKEN_ENV: &str = "GENIUS_ACCESS_TOKEN";
const USER_AGENT: &str = concat!("lyrics-enrich/", env!("CARGO_PKG_VERSION"));
const SEARCH_PER_PAGE: &str = "10";
const LYRICS_CONTAINER_SELECTOR: &str = "div[data-lyrics-container='true']";

// ============================================================================
// Provider Seam
// ============================================================================

/// Everything that can go wrong talking to a provider.
/// Never escapes the fetcher: every variant becomes a per-row miss.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("provider rate limit hit (HTTP 429)")]
    RateLimited,

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ureq::Error> for ProviderError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => match code {
                401 | 403 => ProviderError::Unauthorized(code),
                429 => ProviderError::RateLimited,
                _ => ProviderError::Status(code),
            },
            ureq::Error::Transport(transport) => transport_error(transport.to_string()),
        }
    }
}

/// ureq reports connect/read timeouts only through the transport message.
fn transport_error(message: String) -> ProviderError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") || lowered.contains("timeout") {
        ProviderError::Timeout(message)
    } else {
        ProviderError::Transport(message)
    }
}

/// Search capability over a lyrics provider.
pub trait LyricsProvider {
    /// Search for one song. `Ok(None)` means the provider had no match.
    fn search(&self, title: &str, artist: Option<&str>)
        -> Result<Option<ProviderMatch>, ProviderError>;
}

impl<P: LyricsProvider + ?Sized> LyricsProvider for &P {
    fn search(
        &self,
        title: &str,
        artist: Option<&str>,
    ) -> Result<Option<ProviderMatch>, ProviderError> {
        (**self).search(title, artist)
    }
}

// ============================================================================
// Genius API Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeniusSearchResponse {
    response: GeniusSearchPayload,
}

#[derive(Debug, Deserialize)]
struct GeniusSearchPayload {
    #[serde(default)]
    hits: Vec<GeniusHit>,
}

#[derive(Debug, Deserialize)]
struct GeniusHit {
    #[serde(default, rename = "type")]
    hit_type: String,
    result: GeniusSongResult,
}

#[derive(Debug, Deserialize)]
struct GeniusSongResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    lyrics_state: Option<String>,
    #[serde(default)]
    primary_artist: Option<GeniusArtist>,
}

#[derive(Debug, Deserialize)]
struct GeniusArtist {
    #[serde(default)]
    name: String,
}

/// Song hits from a raw search response body, in provider order.
fn parse_search_candidates(body: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
    let payload: GeniusSearchResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("invalid search JSON: {e}")))?;

    Ok(payload
        .response
        .hits
        .into_iter()
        .filter(|hit| hit.hit_type.eq_ignore_ascii_case("song"))
        .map(|hit| SearchCandidate {
            title: hit.result.title,
            artist: hit.result.primary_artist.map(|a| a.name).unwrap_or_default(),
            url: hit.result.url,
            // Older payloads omit lyrics_state; treat absent as complete
            lyrics_complete: hit
                .result
                .lyrics_state
                .map_or(true, |state| state.eq_ignore_ascii_case("complete")),
        })
        .collect())
}

/// Extract lyric text from a song page: every lyrics container, `<br>` as newline.
///
/// The text keeps the page's banner and section markers; the cleaner removes them.
pub fn extract_page_lyrics(html: &str) -> Result<String, ProviderError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(LYRICS_CONTAINER_SELECTOR)
        .map_err(|e| ProviderError::Malformed(format!("invalid selector: {e:?}")))?;

    let mut lyrics = String::new();
    let mut containers = 0;
    for container in document.select(&selector) {
        containers += 1;
        for node in container.descendants() {
            match node.value() {
                Node::Text(text) => lyrics.push_str(text),
                Node::Element(element) if element.name() == "br" => lyrics.push('\n'),
                _ => {}
            }
        }
        lyrics.push('\n');
    }

    if containers == 0 {
        return Err(ProviderError::Malformed(
            "page has no lyrics container".to_string(),
        ));
    }
    Ok(lyrics.trim_end().to_string())
}

// ============================================================================
// Genius Client
// ============================================================================

/// Genius binding: search API for candidates, song page for lyrics text.
pub struct GeniusProvider {
    agent: ureq::Agent,
    token: String,
    api_base: String,
}

impl GeniusProvider {
    /// Build a client for `token`. An empty token is a configuration error.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("{} is empty", GENIUS_TOKEN_ENV);
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        Ok(Self {
            agent,
            token,
            api_base: GENIUS_API_BASE.to_string(),
        })
    }

    /// Build a client from `GENIUS_ACCESS_TOKEN`.
    /// Missing credentials fail here, before any row is processed.
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let token = std::env::var(GENIUS_TOKEN_ENV).with_context(|| {
            format!(
                "{} not found. Set it as an environment variable.",
                GENIUS_TOKEN_ENV
            )
        })?;
        Self::new(token, timeout)
    }

    fn read_body(response: ureq::Response) -> Result<String, ProviderError> {
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    ProviderError::Timeout(format!("reading response: {e}"))
                } else {
                    ProviderError::Transport(format!("reading response: {e}"))
                }
            })?;
        Ok(body)
    }

    fn search_candidates(&self, phrase: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        let response = self
            .agent
            .get(&format!("{}/search", self.api_base))
            .query("q", phrase)
            .query("per_page", SEARCH_PER_PAGE)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .call()?;
        parse_search_candidates(&Self::read_body(response)?)
    }

    fn fetch_page(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "text/html")
            .call()?;
        Self::read_body(response)
    }
}

impl LyricsProvider for GeniusProvider {
    fn search(
        &self,
        title: &str,
        artist: Option<&str>,
    ) -> Result<Option<ProviderMatch>, ProviderError> {
        let phrase = match artist {
            Some(artist) => format!("{} {}", title, artist),
            None => title.to_string(),
        };

        let candidates = self.search_candidates(phrase.trim())?;
        let Some(best) = select_candidate(&candidates, title, artist) else {
            debug!("No song hit among {} results for '{}'", candidates.len(), phrase);
            return Ok(None);
        };

        debug!("Selected '{}' by '{}' ({})", best.title, best.artist, best.url);
        let html = self.fetch_page(&best.url)?;
        let lyrics = extract_page_lyrics(&html)?;

        Ok(Some(ProviderMatch {
            title: best.title.clone(),
            artist: best.artist.clone(),
            lyrics,
            url: best.url.clone(),
        }))
    }
}
