//! Vidlay Core - embeddable video widget logic
//!
//! This crate holds everything about the widget that does not depend on a
//! browser:
//! - Configuration resolution (global, caller and token layers)
//! - The per-instance playback controller and its activation gate
//! - Pointer-driven scrubbing with played/buffered progress
//! - Pause-when-hidden autoresume
//! - Inline `[[video ...]]` token expansion for rich-text content
//! - Subtitle conversion and lightbox state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Vidlay Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    Token     │  │   Config     │  │    Poster    │           │
//! │  │   Pipeline   │─▶│   Resolver   │  │   Resolver   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┘           │
//! │         │                 │                                     │
//! │         └────────┬────────┘                                     │
//! │                  │                                              │
//! │           ┌──────┴──────┐                                       │
//! │           │  Playback   │                                       │
//! │           │ Controller  │                                       │
//! │           └──────┬──────┘                                       │
//! │                  │                                              │
//! │  ┌──────────────┐│┌──────────────┐  ┌──────────────┐            │
//! │  │    Scrub     │││  Visibility  │  │    Icons     │            │
//! │  │  Controller  │││   Monitor    │  │              │            │
//! │  └──────────────┘│└──────────────┘  └──────────────┘            │
//! │                  ▼                                              │
//! │   PlayerSurface / MediaElement / PipelineHost (host traits)     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod icons;
#[cfg(feature = "lightbox")]
pub mod lightbox;
pub mod pipeline;
pub mod poster;
pub mod scrub;
#[cfg(feature = "subtitles")]
pub mod subtitles;
pub mod surface;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod token;
pub mod types;
pub mod visibility;

pub use config::{resolve, ClickToPlay, ConfigOverride, PlayerConfig, TokenOverride};
pub use controller::{Activation, PlayerController, FEEDBACK_HOLD};
pub use error::{Error, Result};
pub use icons::IconState;
#[cfg(feature = "lightbox")]
pub use lightbox::{Lightbox, LightboxSurface};
pub use pipeline::{
    Expansion, ExpansionReport, InitTiming, MountedClone, PipelineHost, PreparedMount,
    TokenPipeline,
};
pub use poster::{resolve_poster, PosterGenerator, PosterOutcome, PosterPlan};
pub use scrub::ScrubController;
#[cfg(feature = "subtitles")]
pub use subtitles::{srt_to_vtt, SubtitleSource, TrackAttributes};
pub use surface::{MediaElement, PlayerSurface};
pub use token::{find_tokens, split_tokens, Segment, Token};
pub use types::*;
pub use visibility::{VisibilityMonitor, VISIBILITY_THRESHOLD};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Vidlay Core initialized");
}
