//! Removal of provider noise from fetched lyric text.
//!
//! Lyrics pages carry a "<Title> Lyrics" banner before the body, a trailing
//! "<digits>Embed" widget token, and bracketed section markers such as
//! "[Chorus]". Banner removal runs before marker removal: a banner can itself
//! contain a bracketed token, and stripping markers first would hide it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing embed widget token, at the very end of the text or before one final newline.
pub static EMBED_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d*Embed\n?\z").unwrap());

/// Section markers: "[Verse 1]", "[Chorus: Artist]". Non-greedy, single line.
pub static SECTION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());

/// Banner text a provider puts before the lyric body.
pub fn banner_for(track_title: &str) -> String {
    format!("{} Lyrics", track_title)
}

/// Clean raw provider lyrics for `track_title` (the normalized search title).
pub fn clean_lyrics(raw_text: &str, track_title: &str) -> String {
    if raw_text.is_empty() {
        return String::new();
    }

    let banner = banner_for(track_title);
    let body = match raw_text.split_once(banner.as_str()) {
        Some((_, rest)) => rest,
        None => raw_text,
    };

    let body = EMBED_SUFFIX.replace(body, "");
    let body = SECTION_MARKER.replace_all(&body, "");

    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_banner_marker_and_embed() {
        assert_eq!(
            clean_lyrics("Song Title Lyrics[Verse]Some words123Embed", "Song Title"),
            "Some words"
        );
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_lyrics("", "Anything"), "");
    }

    #[test]
    fn test_banner_only_first_occurrence_removed() {
        let raw = "12 ContributorsEcho Lyrics\nEcho Lyrics are sung twice\nend";
        assert_eq!(clean_lyrics(raw, "Echo"), "Echo Lyrics are sung twice\nend");
    }

    #[test]
    fn test_no_banner_keeps_text() {
        assert_eq!(clean_lyrics("Just words\n", "Other"), "Just words");
    }

    #[test]
    fn test_embed_only_at_end() {
        assert_eq!(clean_lyrics("Embed this line\nend", "x"), "Embed this line\nend");
        assert_eq!(clean_lyrics("words\nEmbed", "x"), "words");
        assert_eq!(clean_lyrics("words 5Embed", "x"), "words");
        assert_eq!(clean_lyrics("words123Embed\n", "x"), "words");
        assert_eq!(clean_lyrics("words123Embed\n\n", "x"), "words123Embed");
    }

    #[test]
    fn test_section_markers_removed_everywhere() {
        let raw = "[Intro]\nla la\n[Chorus: Someone]\nhey\n[Outro]";
        assert_eq!(clean_lyrics(raw, "x"), "la la\n\nhey");
    }

    #[test]
    fn test_banner_removed_before_markers() {
        // Banner contains a bracket token; it must still be recognized
        let raw = "Song [Live] Lyrics[Verse]words";
        assert_eq!(clean_lyrics(raw, "Song [Live]"), "words");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = "Hello Lyrics[Intro]La la la123Embed";
        let once = clean_lyrics(raw, "Hello");
        assert_eq!(once, "La la la");
        assert_eq!(clean_lyrics(raw, "Hello"), once);
        assert_eq!(clean_lyrics(&once, "Hello"), once);
    }
}
