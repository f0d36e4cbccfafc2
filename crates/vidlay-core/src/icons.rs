//! Icon visibility as a pure function of media state

use crate::surface::{MediaElement, PlayerSurface};
use crate::types::{FullscreenTarget, Icon};

/// Which control icons are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconState {
    pub paused: bool,
    pub muted: bool,
    pub fullscreen: bool,
}

impl IconState {
    pub fn new(paused: bool, muted: bool, fullscreen: bool) -> Self {
        Self {
            paused,
            muted,
            fullscreen,
        }
    }

    /// Read the current state from a surface
    pub fn observe<S: PlayerSurface>(surface: &S) -> Self {
        let media = surface.media();
        Self::new(
            media.is_paused(),
            media.is_muted(),
            surface.fullscreen_target() == FullscreenTarget::ThisWrapper,
        )
    }

    pub fn is_visible(&self, icon: Icon) -> bool {
        match icon {
            Icon::Play => self.paused,
            Icon::Pause => !self.paused,
            Icon::Mute => self.muted,
            Icon::Unmute => !self.muted,
            Icon::EnterFullscreen => !self.fullscreen,
            Icon::ExitFullscreen => self.fullscreen,
        }
    }

    /// Write every icon's visibility, not just the ones that changed
    pub fn render<S: PlayerSurface>(&self, surface: &mut S) {
        for icon in Icon::ALL {
            surface.set_icon_visible(icon, self.is_visible(icon));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_icon_per_pair() {
        for bits in 0..8u8 {
            let state = IconState::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            assert_ne!(state.is_visible(Icon::Play), state.is_visible(Icon::Pause));
            assert_ne!(state.is_visible(Icon::Mute), state.is_visible(Icon::Unmute));
            assert_ne!(
                state.is_visible(Icon::EnterFullscreen),
                state.is_visible(Icon::ExitFullscreen)
            );
        }
    }

    #[test]
    fn test_paused_shows_play() {
        let state = IconState::new(true, false, false);
        assert!(state.is_visible(Icon::Play));
        assert!(state.is_visible(Icon::Unmute));
        assert!(state.is_visible(Icon::EnterFullscreen));
    }
}
