//! Visibility Monitor - pause when scrolled away, resume on return
//!
//! Only pauses the monitor itself caused are undone. An instance the user
//! paused before it left the viewport stays paused when it comes back.

use crate::surface::MediaElement;
use tracing::debug;

/// Fraction of the wrapper that must be on screen to count as visible
pub const VISIBILITY_THRESHOLD: f64 = 0.3;

/// Intersection ratios are reported with some float noise around the threshold
const RATIO_TOLERANCE: f64 = 0.01;

/// Whether an intersection ratio counts as visible
pub fn is_visible(intersection_ratio: f64) -> bool {
    intersection_ratio + RATIO_TOLERANCE >= VISIBILITY_THRESHOLD
}

/// Autoresume bookkeeping for one instance
#[derive(Debug, Clone, Default)]
pub struct VisibilityMonitor {
    enabled: bool,
    autoresume_armed: bool,
}

impl VisibilityMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            autoresume_armed: false,
        }
    }

    /// False when the configuration turned autoresume off; the host should not observe at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The last pause was made by this monitor
    pub fn is_armed(&self) -> bool {
        self.autoresume_armed
    }

    /// Apply a visibility transition to the media element
    pub fn on_change<M: MediaElement>(&mut self, media: &mut M, visible: bool) {
        if !self.enabled {
            return;
        }

        if visible {
            if self.autoresume_armed {
                debug!("Back in view, resuming");
                self.autoresume_armed = false;
                media.play();
            }
        } else if media.is_paused() {
            self.autoresume_armed = false;
        } else {
            debug!("Out of view, pausing");
            self.autoresume_armed = true;
            media.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMedia;

    #[test]
    fn test_threshold() {
        assert!(is_visible(1.0));
        assert!(is_visible(0.3));
        assert!(is_visible(0.295));
        assert!(!is_visible(0.1));
        assert!(!is_visible(0.0));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut media = FakeMedia::playing();
        let mut monitor = VisibilityMonitor::new(true);

        monitor.on_change(&mut media, false);
        assert!(media.paused);
        assert!(monitor.is_armed());

        monitor.on_change(&mut media, true);
        assert!(!media.paused);
        assert!(!monitor.is_armed());
    }

    #[test]
    fn test_user_pause_survives_scroll() {
        let mut media = FakeMedia::new();
        media.paused = true;
        let mut monitor = VisibilityMonitor::new(true);

        monitor.on_change(&mut media, false);
        assert!(!monitor.is_armed());

        monitor.on_change(&mut media, true);
        assert!(media.paused);
        assert_eq!(media.play_requests, 0);
    }

    #[test]
    fn test_disabled_monitor_is_inert() {
        let mut media = FakeMedia::playing();
        let mut monitor = VisibilityMonitor::new(false);

        monitor.on_change(&mut media, false);
        assert!(!media.paused);
        assert!(!monitor.is_armed());
    }
}
