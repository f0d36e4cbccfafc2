//! Core types for Vidlay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Viewport width (CSS pixels) at or below which the mobile layout applies
pub const MOBILE_MAX_WIDTH: f64 = 767.0;

/// Unique identifier for a mounted player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aspect ratio written as `W:H` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
}

impl AspectRatio {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::InvalidAspect(format!("{}:{}", width, height)));
        }
        Ok(Self { width, height })
    }

    /// Width divided by height
    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Value for the CSS `aspect-ratio` property, e.g. `16 / 9`
    pub fn css_value(&self) -> String {
        format!("{} / {}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(':')
            .or_else(|| s.split_once('/'))
            .ok_or_else(|| Error::InvalidAspect(s.to_string()))?;

        let width: f64 = w
            .trim()
            .parse()
            .map_err(|_| Error::InvalidAspect(s.to_string()))?;
        let height: f64 = h
            .trim()
            .parse()
            .map_err(|_| Error::InvalidAspect(s.to_string()))?;

        Self::new(width, height).map_err(|_| Error::InvalidAspect(s.to_string()))
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Layout breakpoint the wrapper is currently rendered at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Desktop,
    Mobile,
}

impl Viewport {
    /// Classify a viewport width in CSS pixels
    pub fn from_width(width: f64) -> Self {
        if width <= MOBILE_MAX_WIDTH {
            Viewport::Mobile
        } else {
            Viewport::Desktop
        }
    }
}

/// Optional control elements a surface may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSlot {
    Play,
    Mute,
    Restart,
    Fullscreen,
    Captions,
    Progress,
}

impl ControlSlot {
    /// DOM marker attribute for this slot
    pub fn marker(&self) -> &'static str {
        match self {
            ControlSlot::Play => "data-video-play",
            ControlSlot::Mute => "data-video-mute",
            ControlSlot::Restart => "data-video-restart",
            ControlSlot::Fullscreen => "data-video-fullscreen",
            ControlSlot::Captions => "data-video-cc",
            ControlSlot::Progress => "data-video-progress",
        }
    }
}

/// Icons whose visibility is derived from media state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Play,
    Pause,
    Mute,
    Unmute,
    EnterFullscreen,
    ExitFullscreen,
}

impl Icon {
    pub const ALL: [Icon; 6] = [
        Icon::Play,
        Icon::Pause,
        Icon::Mute,
        Icon::Unmute,
        Icon::EnterFullscreen,
        Icon::ExitFullscreen,
    ];

    /// Value of the `data-video-icon` attribute
    pub fn name(&self) -> &'static str {
        match self {
            Icon::Play => "play",
            Icon::Pause => "pause",
            Icon::Mute => "mute",
            Icon::Unmute => "unmute",
            Icon::EnterFullscreen => "enter-fullscreen",
            Icon::ExitFullscreen => "exit-fullscreen",
        }
    }

    /// Control that hosts this icon
    pub fn slot(&self) -> ControlSlot {
        match self {
            Icon::Play | Icon::Pause => ControlSlot::Play,
            Icon::Mute | Icon::Unmute => ControlSlot::Mute,
            Icon::EnterFullscreen | Icon::ExitFullscreen => ControlSlot::Fullscreen,
        }
    }
}

/// Action shown by the click-to-play feedback pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Play,
    Pause,
}

impl FeedbackAction {
    pub fn name(&self) -> &'static str {
        match self {
            FeedbackAction::Play => "play",
            FeedbackAction::Pause => "pause",
        }
    }
}

/// Progress bar layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressBar {
    Played,
    Buffered,
}

/// Text labels next to the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeLabel {
    Current,
    Duration,
}

/// HTMLMediaElement ready state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }

    /// Duration and dimensions are known
    pub fn has_metadata(&self) -> bool {
        *self >= ReadyState::HaveMetadata
    }
}

/// Display mode of a text track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextTrackMode {
    Disabled,
    Hidden,
    Showing,
}

/// Fullscreen capability of the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FullscreenSupport {
    /// Element fullscreen API is available
    Element,
    /// Only the video element itself can go fullscreen (iPhone)
    NativeVideoOnly,
    Unsupported,
}

/// Which element currently owns the document's fullscreen slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FullscreenTarget {
    None,
    ThisWrapper,
    Other,
}

/// Horizontal geometry of the progress track in client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Fraction of the track under `client_x`, clamped to [0, 1]
    ///
    /// `None` for a collapsed or unmeasurable track.
    pub fn fraction_at(&self, client_x: f64) -> Option<f64> {
        if !(self.width.is_finite() && self.width > 0.0) || !client_x.is_finite() {
            return None;
        }
        Some(((client_x - self.left) / self.width).clamp(0.0, 1.0))
    }
}

/// Media element events the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    LoadedMetadata,
    DurationChange,
    Play,
    Playing,
    Pause,
    VolumeChange,
    TimeUpdate,
    Progress,
    Ended,
}

impl MediaEvent {
    pub const ALL: [MediaEvent; 9] = [
        MediaEvent::LoadedMetadata,
        MediaEvent::DurationChange,
        MediaEvent::Play,
        MediaEvent::Playing,
        MediaEvent::Pause,
        MediaEvent::VolumeChange,
        MediaEvent::TimeUpdate,
        MediaEvent::Progress,
        MediaEvent::Ended,
    ];

    /// DOM event type
    pub fn event_type(&self) -> &'static str {
        match self {
            MediaEvent::LoadedMetadata => "loadedmetadata",
            MediaEvent::DurationChange => "durationchange",
            MediaEvent::Play => "play",
            MediaEvent::Playing => "playing",
            MediaEvent::Pause => "pause",
            MediaEvent::VolumeChange => "volumechange",
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::Progress => "progress",
            MediaEvent::Ended => "ended",
        }
    }
}

/// Where a click on the wrapper landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// Inside the controls region; never toggles playback
    Controls,
    /// Anywhere else in the wrapper, including the activation overlay
    Body,
}

/// Fraction of `position` within `duration`, or `None` while the duration is not finite
pub fn progress_fraction(position: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
        return None;
    }
    Some((position / duration).clamp(0.0, 1.0))
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_parsing() {
        let aspect: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(aspect.width, 16.0);
        assert_eq!(aspect.height, 9.0);
        assert_eq!(aspect.css_value(), "16 / 9");
        assert_eq!(aspect.to_string(), "16:9");

        let slashed: AspectRatio = "9/10".parse().unwrap();
        assert!((slashed.ratio() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_aspect_rejects_garbage() {
        assert!("16x9".parse::<AspectRatio>().is_err());
        assert!("0:9".parse::<AspectRatio>().is_err());
        assert!("a:b".parse::<AspectRatio>().is_err());
        assert!("".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_viewport_breakpoint() {
        assert_eq!(Viewport::from_width(767.0), Viewport::Mobile);
        assert_eq!(Viewport::from_width(320.0), Viewport::Mobile);
        assert_eq!(Viewport::from_width(768.0), Viewport::Desktop);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn test_progress_fraction_requires_finite_duration() {
        assert_eq!(progress_fraction(5.0, 10.0), Some(0.5));
        assert_eq!(progress_fraction(12.0, 10.0), Some(1.0));
        assert_eq!(progress_fraction(5.0, f64::NAN), None);
        assert_eq!(progress_fraction(5.0, f64::INFINITY), None);
        assert_eq!(progress_fraction(5.0, 0.0), None);
    }

    #[test]
    fn test_track_fraction_clamps() {
        let track = TrackBounds::new(100.0, 200.0);
        assert_eq!(track.fraction_at(100.0), Some(0.0));
        assert_eq!(track.fraction_at(200.0), Some(0.5));
        assert_eq!(track.fraction_at(50.0), Some(0.0));
        assert_eq!(track.fraction_at(900.0), Some(1.0));
        assert_eq!(track.fraction_at(f64::NAN), None);
    }

    #[test]
    fn test_collapsed_track_has_no_fraction() {
        assert_eq!(TrackBounds::new(0.0, 0.0).fraction_at(10.0), None);
        assert_eq!(TrackBounds::new(0.0, -20.0).fraction_at(10.0), None);
        assert_eq!(TrackBounds::new(0.0, f64::NAN).fraction_at(10.0), None);
    }

    #[test]
    fn test_ready_state_ordering() {
        assert!(ReadyState::from_raw(1).has_metadata());
        assert!(ReadyState::from_raw(4).has_metadata());
        assert!(!ReadyState::from_raw(0).has_metadata());
    }
}
