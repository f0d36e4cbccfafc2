//! Playback Controller - per-instance state machine around one video element
//!
//! ```text
//!   Dormant ──activate()──▶ Activated        (at most once)
//!      │                        │
//!      └── Playing / Paused ────┘            (read from the media element)
//!
//!   Fullscreen: owned by the document, re-read on every change notification
//! ```
//!
//! The controller never caches media state. Icons are re-derived from the
//! element after every operation and event, so a rejected `play()` leaves
//! the play icon showing instead of an optimistic pause icon.

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::icons::IconState;
use crate::scrub::ScrubController;
use crate::surface::{MediaElement, PlayerSurface};
use crate::types::{
    format_time, ClickTarget, ControlSlot, FeedbackAction, FullscreenSupport, FullscreenTarget,
    InstanceId, MediaEvent, TextTrackMode, TimeLabel,
};
use crate::visibility::VisibilityMonitor;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How long the click-to-play pulse stays visible
pub const FEEDBACK_HOLD: Duration = Duration::from_millis(500);

/// Activation gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    /// Gate visible, sound locked, video may be autoplaying muted
    Dormant,
    /// Gate removed, sound permitted
    Activated,
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activation::Dormant => write!(f, "dormant"),
            Activation::Activated => write!(f, "activated"),
        }
    }
}

/// Controller for a single mounted player
pub struct PlayerController<S: PlayerSurface> {
    id: InstanceId,
    config: PlayerConfig,
    surface: S,
    activation: Activation,
    scrub: ScrubController,
    visibility: VisibilityMonitor,
    disposed: bool,
}

impl<S: PlayerSurface> PlayerController<S> {
    /// Bind a controller to a surface and apply the initial settings
    #[instrument(skip_all)]
    pub fn mount(surface: S, config: PlayerConfig) -> Result<Self> {
        if !surface.is_attached() {
            warn!("Refusing to mount on a detached surface");
            return Err(Error::Detached);
        }

        let mut controller = Self {
            id: InstanceId::new(),
            visibility: VisibilityMonitor::new(config.autoresume),
            config,
            surface,
            activation: Activation::Dormant,
            scrub: ScrubController::new(),
            disposed: false,
        };

        controller.apply_initial_settings();
        controller.render_duration();
        ScrubController::render_played(&mut controller.surface);
        controller.render_icons();

        info!(
            instance = %controller.id,
            autoplay = controller.config.autoplay,
            muted = controller.config.muted,
            activation = %controller.activation,
            "Player mounted"
        );

        Ok(controller)
    }

    /// Mount a player whose gate was already removed by the content pipeline
    ///
    /// The instance starts `Activated` without touching the muted state, so an
    /// autoplaying clip stays silent until the mute control is used.
    pub fn mount_activated(surface: S, config: PlayerConfig) -> Result<Self> {
        let mut controller = Self::mount(surface, config)?;
        if controller.surface.has_activation_overlay() {
            controller.surface.remove_activation_overlay();
        }
        controller.activation = Activation::Activated;
        controller.surface.set_active_marker(true);
        controller.apply_aspect();
        controller.render_icons();

        debug!(instance = %controller.id, "Mounted pre-activated");
        Ok(controller)
    }

    /// Instance identifier
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn is_activated(&self) -> bool {
        self.activation == Activation::Activated
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_scrubbing()
    }

    /// The last pause came from the visibility monitor
    pub fn autoresume_armed(&self) -> bool {
        self.visibility.is_armed()
    }

    /// Whether the host should observe viewport intersection at all
    pub fn wants_visibility(&self) -> bool {
        self.visibility.is_enabled()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Icon state derived from the element right now
    pub fn icon_state(&self) -> IconState {
        IconState::observe(&self.surface)
    }

    /// Still receiving events: not disposed and wrapper still in the document
    fn is_live(&self) -> bool {
        !self.disposed && self.surface.is_attached()
    }

    fn apply_initial_settings(&mut self) {
        let muted = self.config.muted || !self.config.sound_enabled;
        let media = self.surface.media_mut();
        media.set_muted(muted);
        media.set_looping(self.config.looping);
        media.set_plays_inline(true);

        if self.config.autoplay {
            self.surface.media_mut().play();

            // Ungated autoplay looks active but stays dormant until a gesture unlocks sound
            if !self.surface.has_activation_overlay() {
                self.surface.set_active_marker(true);
            }
        }

        self.apply_aspect();
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Remove the activation gate and permit sound. Returns false if nothing changed.
    #[instrument(skip(self), fields(instance = %self.id))]
    pub fn activate(&mut self) -> bool {
        if !self.is_live() || self.activation == Activation::Activated {
            return false;
        }

        self.activation = Activation::Activated;

        if self.surface.has_activation_overlay() {
            self.surface.remove_activation_overlay();
        }

        let sound_enabled = self.config.sound_enabled;
        let media = self.surface.media_mut();
        if sound_enabled {
            media.set_muted(false);
        }
        if media.is_paused() {
            media.play();
        }

        self.surface.set_active_marker(true);
        self.apply_aspect();
        self.render_icons();

        info!(sound_enabled, "Player activated");
        true
    }

    /// Click-to-play toggle with a feedback pulse
    pub fn toggle(&mut self) -> Option<FeedbackAction> {
        if !self.is_live()
            || !self.config.click_to_play.is_enabled()
            || self.surface.has_activation_overlay()
        {
            return None;
        }

        let action = self.flip_playback();
        self.surface.pulse_feedback(action, FEEDBACK_HOLD);
        self.render_icons();

        debug!(instance = %self.id, action = action.name(), "Click-to-play");
        Some(action)
    }

    pub fn toggle_mute(&mut self) {
        if !self.is_live() {
            return;
        }
        if !self.config.sound_enabled {
            debug!(instance = %self.id, "Sound is disabled for this player");
            return;
        }

        let media = self.surface.media_mut();
        let muted = media.is_muted();
        media.set_muted(!muted);
        self.render_icons();
    }

    /// Seek to the start and play
    pub fn restart(&mut self) {
        if !self.is_live() {
            return;
        }

        let media = self.surface.media_mut();
        media.seek(0.0);
        media.play();
        self.render_icons();
    }

    /// Flip the first text track between showing and hidden
    pub fn toggle_captions(&mut self) -> Option<TextTrackMode> {
        if !self.is_live() {
            return None;
        }

        let media = self.surface.media_mut();
        let next = match media.text_track_mode()? {
            TextTrackMode::Showing => TextTrackMode::Hidden,
            TextTrackMode::Hidden | TextTrackMode::Disabled => TextTrackMode::Showing,
        };
        media.set_text_track_mode(next);

        debug!(instance = %self.id, mode = ?next, "Captions toggled");
        Some(next)
    }

    /// Request or exit fullscreen; the outcome arrives via [`Self::on_fullscreen_change`]
    pub fn toggle_fullscreen(&mut self) {
        if !self.is_live() {
            return;
        }

        match self.surface.fullscreen_support() {
            FullscreenSupport::NativeVideoOnly => {
                self.surface.media_mut().enter_native_fullscreen();
            }
            FullscreenSupport::Element => match self.surface.fullscreen_target() {
                FullscreenTarget::None => self.surface.request_fullscreen(),
                FullscreenTarget::ThisWrapper | FullscreenTarget::Other => {
                    self.surface.exit_fullscreen()
                }
            },
            FullscreenSupport::Unsupported => {
                debug!(instance = %self.id, "Fullscreen not supported");
            }
        }
    }

    /// Stop reacting to events. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.scrub.reset();
        info!(instance = %self.id, "Player disposed");
    }

    // =========================================================================
    // Event handlers
    // =========================================================================

    /// Click anywhere in the wrapper
    pub fn on_wrapper_click(&mut self, target: ClickTarget) {
        if !self.is_live() || target == ClickTarget::Controls {
            return;
        }

        if self.surface.has_activation_overlay() {
            self.activate();
        } else {
            self.toggle();
        }
    }

    /// Dedicated play control: unlocks a dormant player, otherwise toggles playback
    pub fn on_play_control(&mut self) {
        if !self.is_live() {
            return;
        }

        if !self.activate() {
            self.flip_playback();
            self.render_icons();
        }
    }

    pub fn on_media_event(&mut self, event: MediaEvent) {
        if !self.is_live() {
            return;
        }

        match event {
            MediaEvent::LoadedMetadata => {
                self.render_duration();
                ScrubController::render_played(&mut self.surface);
            }
            MediaEvent::DurationChange | MediaEvent::Play | MediaEvent::Playing => {
                self.render_duration();
            }
            MediaEvent::TimeUpdate => {
                let current = self.surface.media().current_time();
                self.surface
                    .set_time_text(TimeLabel::Current, &format_time(current));
                ScrubController::render_played(&mut self.surface);
            }
            MediaEvent::Progress => ScrubController::render_buffered(&mut self.surface),
            MediaEvent::Pause | MediaEvent::VolumeChange | MediaEvent::Ended => {}
        }

        self.render_icons();
    }

    pub fn on_fullscreen_change(&mut self) {
        if self.is_live() {
            self.render_icons();
        }
    }

    /// The viewport crossed the mobile breakpoint
    pub fn on_viewport_change(&mut self) {
        if self.is_live() {
            self.apply_aspect();
        }
    }

    /// Wrapper visibility crossed the threshold
    pub fn on_visibility_change(&mut self, visible: bool) {
        if !self.is_live() {
            return;
        }
        self.visibility.on_change(self.surface.media_mut(), visible);
        self.render_icons();
    }

    /// Pointer pressed on the progress track; true if a drag started
    pub fn on_pointer_down(&mut self, pointer_id: i32, client_x: f64) -> bool {
        if !self.is_live() || !self.surface.has_control(ControlSlot::Progress) {
            return false;
        }
        let started = self.scrub.begin(&mut self.surface, pointer_id, client_x);
        if started {
            self.render_icons();
        }
        started
    }

    pub fn on_pointer_move(&mut self, client_x: f64) {
        if self.is_live() {
            self.scrub.drag(&mut self.surface, client_x);
        }
    }

    /// Pointer released or cancelled anywhere in the window
    pub fn on_pointer_up(&mut self, pointer_id: i32) {
        if !self.is_live() || !self.scrub.is_scrubbing() {
            return;
        }
        self.scrub.end(&mut self.surface, pointer_id);
        self.render_icons();
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn flip_playback(&mut self) -> FeedbackAction {
        let media = self.surface.media_mut();
        if media.is_paused() {
            media.play();
            FeedbackAction::Play
        } else {
            media.pause();
            FeedbackAction::Pause
        }
    }

    fn apply_aspect(&mut self) {
        let viewport = self.surface.viewport();
        match self.config.aspect_for(viewport, self.is_activated()) {
            Some(aspect) => self.surface.set_aspect_ratio(aspect),
            None => self.surface.clear_aspect_ratio(),
        }
    }

    fn render_icons(&mut self) {
        IconState::observe(&self.surface).render(&mut self.surface);
    }

    fn render_duration(&mut self) {
        let duration = self.surface.media().duration();
        if duration.is_finite() {
            self.surface
                .set_time_text(TimeLabel::Duration, &format_time(duration));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;
    use crate::types::Icon;

    fn mount(surface: FakeSurface) -> PlayerController<FakeSurface> {
        PlayerController::mount(surface, PlayerConfig::default()).unwrap()
    }

    #[test]
    fn test_mount_applies_initial_settings() {
        let controller = mount(FakeSurface::with_overlay());
        let media = &controller.surface().media;
        assert!(media.muted);
        assert!(media.plays_inline);
        assert!(!media.looping);
        assert_eq!(controller.activation(), Activation::Dormant);
        assert!(!controller.surface().active_marker);
        assert_eq!(controller.surface().icon(Icon::Play), Some(true));
    }

    #[test]
    fn test_detached_mount_fails() {
        let mut surface = FakeSurface::new();
        surface.attached = false;
        let result = PlayerController::mount(surface, PlayerConfig::default());
        assert!(matches!(result, Err(Error::Detached)));
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut controller = mount(FakeSurface::with_overlay());
        assert!(controller.activate());
        let after_once = controller.surface().clone();

        assert!(!controller.activate());
        assert!(!controller.activate());
        assert_eq!(controller.surface(), &after_once);
        assert_eq!(controller.surface().media.play_requests, 1);
    }

    #[test]
    fn test_toggle_requires_gate_removed() {
        let mut controller = mount(FakeSurface::with_overlay());
        assert_eq!(controller.toggle(), None);

        controller.activate();
        assert_eq!(controller.toggle(), Some(FeedbackAction::Pause));
        assert_eq!(
            controller.surface().feedback.last(),
            Some(&(FeedbackAction::Pause, FEEDBACK_HOLD))
        );
        assert_eq!(controller.toggle(), Some(FeedbackAction::Play));
    }

    #[test]
    fn test_rejected_play_keeps_play_icon() {
        let mut surface = FakeSurface::new();
        surface.media.reject_play = true;
        let mut controller = mount(surface);

        controller.on_wrapper_click(ClickTarget::Body);
        assert!(controller.surface().media.paused);
        assert_eq!(controller.surface().icon(Icon::Play), Some(true));
        assert_eq!(controller.surface().icon(Icon::Pause), Some(false));
    }
}
