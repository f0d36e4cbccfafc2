//! Subtitle attachment helpers
//!
//! Players accept WebVTT directly. SubRip files are fetched by the host,
//! converted here and attached as an in-memory track.
//!
//! # Example
//!
//! ```rust
//! use vidlay_core::subtitles::{srt_to_vtt, SubtitleSource};
//!
//! assert_eq!(SubtitleSource::classify("/subs/en.SRT?v=2"), SubtitleSource::Srt);
//!
//! let vtt = srt_to_vtt("1\r\n00:00:01,500 --> 00:00:04,000\r\nHello!\r\n");
//! assert!(vtt.starts_with("WEBVTT\n\n"));
//! assert!(vtt.contains("00:00:01.500 --> 00:00:04.000"));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker attribute naming a caption file on a `<video>` element
pub const SUBTITLES_ATTR: &str = "data-subtitles-src";
/// MIME type of converted tracks
pub const VTT_MIME: &str = "text/vtt";

/// How a caption URL is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSource {
    /// Attach the URL as-is
    Vtt,
    /// Fetch, convert, attach as an object URL
    Srt,
    Unsupported,
}

impl SubtitleSource {
    /// Classify by path extension; query string and case are ignored
    pub fn classify(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();

        let source = if path.ends_with(".vtt") {
            SubtitleSource::Vtt
        } else if path.ends_with(".srt") {
            SubtitleSource::Srt
        } else {
            SubtitleSource::Unsupported
        };

        debug!(url, ?source, "Classified subtitle source");
        source
    }
}

/// Attributes of an attached caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackAttributes {
    pub kind: &'static str,
    pub label: &'static str,
    pub srclang: &'static str,
}

impl TrackAttributes {
    pub const ENGLISH: TrackAttributes = TrackAttributes {
        kind: "subtitles",
        label: "English",
        srclang: "en",
    };
}

impl Default for TrackAttributes {
    fn default() -> Self {
        Self::ENGLISH
    }
}

/// Convert SRT to WebVTT
pub fn srt_to_vtt(srt: &str) -> String {
    let mut vtt = String::with_capacity(srt.len() + 8);
    vtt.push_str("WEBVTT\n\n");

    for line in srt.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.contains("-->") {
            vtt.push_str(&rewrite_timestamps(line));
        } else {
            vtt.push_str(line);
        }
        vtt.push('\n');
    }

    // split('\n') leaves one trailing newline too many
    vtt.pop();
    vtt
}

/// Rewrite every `H:MM:SS,mmm` to `H:MM:SS.mmm`, leaving other commas alone
fn rewrite_timestamps(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());

    for (i, c) in line.char_indices() {
        let is_decimal_comma = c == ','
            && i >= 2
            && bytes[i - 1].is_ascii_digit()
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
            && line[..i]
                .rsplit(|ch: char| !ch.is_ascii_digit() && ch != ':')
                .next()
                .is_some_and(|ts| ts.matches(':').count() == 2);
        out.push(if is_decimal_comma { '.' } else { c });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SubtitleSource::classify("/a/en.vtt"), SubtitleSource::Vtt);
        assert_eq!(SubtitleSource::classify("/a/en.VTT?token=x.srt"), SubtitleSource::Vtt);
        assert_eq!(SubtitleSource::classify("https://cdn/x.srt?v=1"), SubtitleSource::Srt);
        assert_eq!(SubtitleSource::classify("/a/en.txt"), SubtitleSource::Unsupported);
        assert_eq!(SubtitleSource::classify(""), SubtitleSource::Unsupported);
    }

    #[test]
    fn test_srt_to_vtt() {
        let srt = "1\r\n00:00:00,000 --> 00:00:04,250\r\nHello, world!\r\n\r\n2\r\n00:00:04,250 --> 00:00:08,000\r\nBye";
        let vtt = srt_to_vtt(srt);

        assert_eq!(
            vtt,
            "WEBVTT\n\n1\n00:00:00.000 --> 00:00:04.250\nHello, world!\n\n2\n00:00:04.250 --> 00:00:08.000\nBye"
        );
        assert!(!vtt.contains('\r'));
    }

    #[test]
    fn test_cue_text_commas_survive() {
        let vtt = srt_to_vtt("1\n00:00:01,000 --> 00:00:02,000\n1,000 reasons");
        assert!(vtt.ends_with("\n1,000 reasons"));
    }

    #[test]
    fn test_track_attributes() {
        let attrs = TrackAttributes::default();
        assert_eq!(attrs.kind, "subtitles");
        assert_eq!(attrs.label, "English");
        assert_eq!(attrs.srclang, "en");
    }
}
