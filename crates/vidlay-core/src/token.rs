//! Inline video token parsing
//!
//! Rich-text content may embed players with a bracketed tag:
//!
//! ```text
//! [[video src="/media/clip.mp4" poster="/media/clip.jpg" autoplay="true" sound="false"]]
//! ```
//!
//! Attributes may appear in any order and unknown ones are ignored. `src`
//! is required; a tag without it (or one that does not parse at all) stays
//! in the text untouched.
//!
//! # Example
//!
//! ```rust
//! use vidlay_core::token::{split_tokens, Segment};
//!
//! let segments = split_tokens(r#"Intro [[video src="a.mp4"]] outro"#);
//! assert_eq!(segments.len(), 3);
//! assert!(matches!(&segments[1], Segment::Token(t) if t.src == "a.mp4"));
//! ```

use crate::config::TokenOverride;
use nom::{
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    multi::separated_list1,
    sequence::{delimited, separated_pair},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker attribute on placeholder elements
pub const PLACEHOLDER_ATTR: &str = "data-video-token";
/// Set on a placeholder once it has been consumed
pub const STATE_ATTR: &str = "data-video-token-state";
pub const STATE_MOUNTED: &str = "mounted";

pub const SRC_ATTR: &str = "data-video-src";
pub const POSTER_ATTR: &str = "data-video-poster";
pub const AUTOPLAY_ATTR: &str = "data-video-autoplay";
pub const SOUND_ATTR: &str = "data-video-sound";

const TOKEN_OPEN: &str = "[[";

/// One parsed inline video token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub src: String,
    /// Explicit poster; `None` means one is generated from the first frame
    pub poster: Option<String>,
    pub autoplay: Option<bool>,
    pub sound: Option<bool>,
}

impl Token {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            poster: None,
            autoplay: None,
            sound: None,
        }
    }

    /// Parse a single token at the start of `input`, returning it and the bytes consumed
    pub fn parse_prefix(input: &str) -> Option<(Token, usize)> {
        let (rest, pairs) = video_tag(input).ok()?;
        let token = Self::from_pairs(&pairs)?;
        Some((token, input.len() - rest.len()))
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Option<Token> {
        let lookup = |key: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.to_string())
        };
        Self::from_lookup(lookup)
    }

    /// Rebuild a token from placeholder data attributes
    pub fn from_attributes(get: impl Fn(&str) -> Option<String>) -> Option<Token> {
        Self::from_lookup(|key| match key {
            "src" => get(SRC_ATTR),
            "poster" => get(POSTER_ATTR),
            "autoplay" => get(AUTOPLAY_ATTR),
            "sound" => get(SOUND_ATTR),
            _ => None,
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Token> {
        let src = lookup("src").filter(|s| !s.trim().is_empty())?;
        let poster = lookup("poster").filter(|p| !p.trim().is_empty());

        Some(Token {
            src,
            poster,
            autoplay: lookup("autoplay").and_then(|v| parse_flag("autoplay", &v)),
            sound: lookup("sound").and_then(|v| parse_flag("sound", &v)),
        })
    }

    /// Data attributes written onto the placeholder element
    pub fn to_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![(PLACEHOLDER_ATTR, String::new()), (SRC_ATTR, self.src.clone())];
        if let Some(poster) = &self.poster {
            attrs.push((POSTER_ATTR, poster.clone()));
        }
        if let Some(autoplay) = self.autoplay {
            attrs.push((AUTOPLAY_ATTR, autoplay.to_string()));
        }
        if let Some(sound) = self.sound {
            attrs.push((SOUND_ATTR, sound.to_string()));
        }
        attrs
    }

    /// Configuration overrides carried by this token
    pub fn overrides(&self) -> TokenOverride {
        TokenOverride {
            autoplay: self.autoplay,
            sound: self.sound,
        }
    }

    /// `sound="false"`: the player must never make noise
    pub fn sound_suppressed(&self) -> bool {
        self.sound == Some(false)
    }

    pub fn autoplays(&self) -> bool {
        self.autoplay == Some(true)
    }
}

/// A run of content split around tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Token(Token),
}

/// Split `input` into text runs and tokens, in order
pub fn split_tokens(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut search = 0;

    while let Some(offset) = input[search..].find(TOKEN_OPEN) {
        let start = search + offset;
        match Token::parse_prefix(&input[start..]) {
            Some((token, consumed)) => {
                if start > cursor {
                    segments.push(Segment::Text(&input[cursor..start]));
                }
                segments.push(Segment::Token(token));
                cursor = start + consumed;
                search = cursor;
            }
            None => search = start + 1,
        }
    }

    if cursor < input.len() {
        segments.push(Segment::Text(&input[cursor..]));
    }
    segments
}

/// All tokens in `input`
pub fn find_tokens(input: &str) -> Vec<Token> {
    split_tokens(input)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Token(token) => Some(token),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Quick check before splitting a text run
pub fn contains_token(input: &str) -> bool {
    input.contains(TOKEN_OPEN) && split_tokens(input).iter().any(|s| matches!(s, Segment::Token(_)))
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => {
            debug!(key, value = other, "Ignoring non-boolean token attribute");
            None
        }
    }
}

fn attr_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse(input)
}

fn attr_value(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"')).parse(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(attr_name, char('='), attr_value).parse(input)
}

fn video_tag(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    delimited(
        (tag(TOKEN_OPEN), multispace0, tag_no_case("video"), multispace1),
        separated_list1(multispace1, attribute),
        (multispace0, tag("]]")),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_token() {
        let input =
            r#"[[video src="/v/a.mp4" poster="/v/a.jpg" autoplay="true" sound="false"]] tail"#;
        let (token, consumed) = Token::parse_prefix(input).unwrap();

        assert_eq!(token.src, "/v/a.mp4");
        assert_eq!(token.poster.as_deref(), Some("/v/a.jpg"));
        assert_eq!(token.autoplay, Some(true));
        assert_eq!(token.sound, Some(false));
        assert!(token.sound_suppressed());
        assert_eq!(&input[consumed..], " tail");
    }

    #[test]
    fn test_attribute_order_and_unknown_keys() {
        let tokens = find_tokens(r#"[[video  sound="TRUE" data-x="1" src="b.mp4" ]]"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].src, "b.mp4");
        assert_eq!(tokens[0].sound, Some(true));
        assert_eq!(tokens[0].poster, None);
    }

    #[test]
    fn test_empty_poster_means_generate() {
        let tokens = find_tokens(r#"[[video src="c.mp4" poster=""]]"#);
        assert_eq!(tokens[0].poster, None);
    }

    #[test]
    fn test_malformed_tags_are_left_alone() {
        for input in [
            r#"[[video]]"#,
            r#"[[video poster="p.jpg"]]"#,
            r#"[[video src=""]]"#,
            r#"[[video src="a.mp4""#,
            r#"[[video src='a.mp4']]"#,
            r#"[[audio src="a.mp3"]]"#,
            r#"[video src="a.mp4"]"#,
        ] {
            assert_eq!(split_tokens(input), vec![Segment::Text(input)], "{input}");
            assert!(!contains_token(input));
        }
    }

    #[test]
    fn test_split_preserves_surrounding_text() {
        let input = r#"Voilà [[video src="1.mp4"]] und [[video src="2.mp4" autoplay="false"]]!"#;
        let segments = split_tokens(input);

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0], Segment::Text("Voilà "));
        assert_eq!(segments[2], Segment::Text(" und "));
        assert_eq!(segments[4], Segment::Text("!"));
        match &segments[3] {
            Segment::Token(t) => assert_eq!(t.autoplay, Some(false)),
            other => panic!("expected token, got {other:?}"),
        }
    }

    #[test]
    fn test_broken_tag_before_valid_one() {
        let input = r#"[[video oops [[video src="ok.mp4"]]"#;
        let tokens = find_tokens(input);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].src, "ok.mp4");
    }

    #[test]
    fn test_non_boolean_flags_are_absent() {
        let tokens = find_tokens(r#"[[video src="a.mp4" autoplay="yes" sound="1"]]"#);
        assert_eq!(tokens[0].autoplay, None);
        assert_eq!(tokens[0].sound, None);
    }

    #[test]
    fn test_placeholder_attributes() {
        let mut token = Token::new("a.mp4");
        token.sound = Some(false);

        let attrs = token.to_attributes();
        assert!(attrs.contains(&(PLACEHOLDER_ATTR, String::new())));
        assert!(attrs.contains(&(SOUND_ATTR, "false".to_string())));
        assert!(!attrs.iter().any(|(k, _)| *k == POSTER_ATTR));

        let restored = Token::from_attributes(|key| {
            attrs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();
        assert_eq!(restored, token);
    }
}
