//! Host capabilities the controller is built against
//!
//! A browser binding implements these over DOM handles; tests implement
//! them in memory (see [`crate::testing`]). The controller never queries a
//! document on its own: everything it touches is reached through a surface
//! handed to it at mount time.

use crate::types::{
    AspectRatio, ControlSlot, FeedbackAction, FullscreenSupport, FullscreenTarget, Icon,
    ProgressBar, ReadyState, TextTrackMode, TimeLabel, TrackBounds, Viewport,
};
use std::time::Duration;

/// A playable media element
pub trait MediaElement {
    fn is_paused(&self) -> bool;

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn set_looping(&mut self, looping: bool);

    fn set_plays_inline(&mut self, inline: bool);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    fn seek(&mut self, seconds: f64);

    /// Duration in seconds; NaN before metadata, infinite for live streams
    fn duration(&self) -> f64;

    /// End of the last buffered range, if anything is buffered
    fn buffered_end(&self) -> Option<f64>;

    fn ready_state(&self) -> ReadyState;

    /// Request playback.
    ///
    /// Platforms may reject the request (autoplay policy, network error).
    /// Implementations swallow the rejection: callers observe the outcome
    /// through [`MediaElement::is_paused`].
    fn play(&mut self);

    fn pause(&mut self);

    /// Mode of the first text track; `None` while no track is attached
    fn text_track_mode(&self) -> Option<TextTrackMode>;

    /// Set the mode of the first text track, if one exists
    fn set_text_track_mode(&mut self, mode: TextTrackMode);

    /// Point the element at a new source and reload
    fn set_source(&mut self, src: &str);

    /// Drop the current source
    fn clear_source(&mut self);

    /// Video-only native fullscreen (iOS Safari on iPhone)
    fn enter_native_fullscreen(&mut self);
}

/// A mounted player: wrapper element, its video and optional controls
pub trait PlayerSurface {
    type Media: MediaElement;

    fn media(&self) -> &Self::Media;

    fn media_mut(&mut self) -> &mut Self::Media;

    /// False once the wrapper has been removed from the document
    fn is_attached(&self) -> bool;

    fn has_control(&self, slot: ControlSlot) -> bool;

    fn has_activation_overlay(&self) -> bool;

    fn remove_activation_overlay(&mut self);

    /// Toggle the wrapper's `is-active` marker
    fn set_active_marker(&mut self, active: bool);

    fn set_aspect_ratio(&mut self, aspect: AspectRatio);

    /// Drop any aspect ratio set earlier
    fn clear_aspect_ratio(&mut self);

    fn set_icon_visible(&mut self, icon: Icon, visible: bool);

    /// Show the click feedback pulse for `action` and hide it after `hold`.
    ///
    /// Calling again before the pulse is hidden restarts it; only the
    /// latest hide is honored.
    fn pulse_feedback(&mut self, action: FeedbackAction, hold: Duration);

    /// Render a progress layer at `fraction` (0..=1) of the track width
    fn set_progress(&mut self, bar: ProgressBar, fraction: f64);

    fn set_time_text(&mut self, label: TimeLabel, text: &str);

    /// Bounds of the progress track, if the surface has one
    fn track_bounds(&self) -> Option<TrackBounds>;

    fn capture_pointer(&mut self, pointer_id: i32);

    fn release_pointer(&mut self, pointer_id: i32);

    fn viewport(&self) -> Viewport;

    fn fullscreen_support(&self) -> FullscreenSupport;

    /// Current owner of the document fullscreen slot, read fresh on every call
    fn fullscreen_target(&self) -> FullscreenTarget;

    fn request_fullscreen(&mut self);

    fn exit_fullscreen(&mut self);
}
