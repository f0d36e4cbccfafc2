//! Scrub/Progress Controller
//!
//! Turns pointer drags on the progress track into seeks. Moves are tracked
//! window-wide while a pointer is captured so a fast drag past either end of
//! the track keeps seeking (clamped to the ends). Playback is paused for the
//! duration of the drag and resumed on release if it was running before.
//!
//! Every fraction computed here goes through a finiteness check on the
//! duration; with NaN or infinite durations nothing is seeked or rendered.

use crate::error::{Error, Result};
use crate::surface::{MediaElement, PlayerSurface};
use crate::types::{progress_fraction, ProgressBar, TrackBounds};
use tracing::debug;

/// Duration usable as a seek range; live and unloaded media have none
pub fn seekable_duration<M: MediaElement + ?Sized>(media: &M) -> Result<f64> {
    let duration = media.duration();
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(Error::IndeterminateDuration)
    }
}

/// Drag state for one progress track
#[derive(Debug, Default)]
pub struct ScrubController {
    /// Pointer currently captured by the track
    pointer: Option<i32>,
    /// Playback was running when the drag began
    resume_after: bool,
}

impl ScrubController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.pointer.is_some()
    }

    /// Pointer pressed on the track. Returns false when the press is ignored.
    pub fn begin<S: PlayerSurface>(&mut self, surface: &mut S, pointer_id: i32, client_x: f64) -> bool {
        if self.pointer.is_some() {
            return false;
        }

        let duration = match seekable_duration(surface.media()) {
            Ok(duration) => duration,
            Err(e) => {
                debug!(error = %e, "Scrub ignored");
                return false;
            }
        };

        let Some(bounds) = surface.track_bounds() else {
            return false;
        };
        let Some(fraction) = bounds.fraction_at(client_x) else {
            debug!(width = bounds.width, "Scrub ignored: track has no width");
            return false;
        };

        surface.capture_pointer(pointer_id);
        self.pointer = Some(pointer_id);
        self.resume_after = !surface.media().is_paused();
        surface.media_mut().pause();

        debug!(pointer_id, resume_after = self.resume_after, "Scrub started");

        Self::seek(surface, fraction, duration);
        true
    }

    /// Pointer moved anywhere in the window
    pub fn drag<S: PlayerSurface>(&mut self, surface: &mut S, client_x: f64) {
        if self.pointer.is_none() {
            return;
        }
        if let Some(bounds) = surface.track_bounds() {
            self.seek_to(surface, bounds, client_x);
        }
    }

    /// Pointer released or cancelled
    pub fn end<S: PlayerSurface>(&mut self, surface: &mut S, pointer_id: i32) {
        if self.pointer != Some(pointer_id) {
            return;
        }

        self.pointer = None;
        surface.release_pointer(pointer_id);

        if std::mem::take(&mut self.resume_after) {
            surface.media_mut().play();
        }

        debug!(pointer_id, "Scrub finished");
    }

    /// Abandon a drag without resuming playback
    pub fn reset(&mut self) {
        self.pointer = None;
        self.resume_after = false;
    }

    /// Render the played layer from the media position
    pub fn render_played<S: PlayerSurface>(surface: &mut S) {
        let media = surface.media();
        if let Some(fraction) = progress_fraction(media.current_time(), media.duration()) {
            surface.set_progress(ProgressBar::Played, fraction);
        }
    }

    /// Render the buffered layer from the end of the last buffered range
    pub fn render_buffered<S: PlayerSurface>(surface: &mut S) {
        let media = surface.media();
        let Some(end) = media.buffered_end() else {
            return;
        };
        if let Some(fraction) = progress_fraction(end, media.duration()) {
            surface.set_progress(ProgressBar::Buffered, fraction);
        }
    }

    fn seek_to<S: PlayerSurface>(&self, surface: &mut S, bounds: TrackBounds, client_x: f64) {
        let Some(fraction) = bounds.fraction_at(client_x) else {
            return;
        };
        match seekable_duration(surface.media()) {
            Ok(duration) => Self::seek(surface, fraction, duration),
            Err(e) => debug!(error = %e, "Seek skipped"),
        }
    }

    fn seek<S: PlayerSurface>(surface: &mut S, fraction: f64, duration: f64) {
        surface.media_mut().seek(fraction * duration);
        // Optimistic: don't wait for the timeupdate echo
        surface.set_progress(ProgressBar::Played, fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;

    fn surface(duration: f64) -> FakeSurface {
        let mut surface = FakeSurface::new();
        surface.media.duration = duration;
        surface.track = Some(TrackBounds::new(0.0, 400.0));
        surface
    }

    #[test]
    fn test_press_seeks_to_fraction() {
        let mut s = surface(120.0);
        let mut scrub = ScrubController::new();

        assert!(scrub.begin(&mut s, 1, 100.0));
        assert!(scrub.is_scrubbing());
        assert!((s.media.current_time - 30.0).abs() < 1e-9);
        assert_eq!(s.progress(ProgressBar::Played), Some(0.25));
        assert_eq!(s.captured_pointer, Some(1));
    }

    #[test]
    fn test_drag_past_track_clamps() {
        let mut s = surface(60.0);
        let mut scrub = ScrubController::new();
        scrub.begin(&mut s, 7, 200.0);

        scrub.drag(&mut s, 10_000.0);
        assert!((s.media.current_time - 60.0).abs() < 1e-9);
        assert_eq!(s.progress(ProgressBar::Played), Some(1.0));

        scrub.drag(&mut s, -50.0);
        assert_eq!(s.media.current_time, 0.0);
        assert_eq!(s.progress(ProgressBar::Played), Some(0.0));
    }

    #[test]
    fn test_resume_only_if_playing_before() {
        let mut s = surface(60.0);
        s.media.paused = false;
        let mut scrub = ScrubController::new();

        scrub.begin(&mut s, 1, 10.0);
        assert!(s.media.paused);
        scrub.end(&mut s, 1);
        assert!(!s.media.paused);
        assert_eq!(s.captured_pointer, None);

        // Already paused: stays paused after the drag
        s.media.paused = true;
        scrub.begin(&mut s, 2, 10.0);
        scrub.end(&mut s, 2);
        assert!(s.media.paused);
    }

    #[test]
    fn test_other_pointer_release_is_ignored() {
        let mut s = surface(60.0);
        let mut scrub = ScrubController::new();
        scrub.begin(&mut s, 1, 10.0);
        scrub.end(&mut s, 2);
        assert!(scrub.is_scrubbing());
    }

    #[test]
    fn test_indeterminate_duration_rejects_press() {
        for duration in [f64::NAN, f64::INFINITY] {
            let mut s = surface(duration);
            let mut scrub = ScrubController::new();
            assert!(!scrub.begin(&mut s, 1, 200.0));
            assert!(!scrub.is_scrubbing());
            assert_eq!(s.media.current_time, 0.0);
            assert_eq!(s.progress(ProgressBar::Played), None);
            assert_eq!(s.media.play_requests, 0);
        }
    }

    #[test]
    fn test_seekable_duration() {
        let mut s = surface(90.0);
        assert_eq!(seekable_duration(&s.media).unwrap(), 90.0);

        for duration in [f64::NAN, f64::INFINITY, 0.0] {
            s.media.duration = duration;
            let err = seekable_duration(&s.media).unwrap_err();
            assert!(matches!(err, Error::IndeterminateDuration));
            assert_eq!(err.error_code(), "INDETERMINATE_DURATION");
        }
    }

    #[test]
    fn test_collapsed_track_rejects_press() {
        let mut s = surface(60.0);
        s.media.paused = false;
        s.track = Some(TrackBounds::new(0.0, 0.0));
        let mut scrub = ScrubController::new();

        assert!(!scrub.begin(&mut s, 1, 200.0));
        assert!(!scrub.is_scrubbing());
        assert!(!s.media.paused);
        assert_eq!(s.captured_pointer, None);
        assert_eq!(s.media.current_time, 0.0);
        assert_eq!(s.progress(ProgressBar::Played), None);
    }

    #[test]
    fn test_drag_over_collapsed_track_keeps_position() {
        let mut s = surface(60.0);
        let mut scrub = ScrubController::new();
        scrub.begin(&mut s, 1, 100.0);
        assert!((s.media.current_time - 15.0).abs() < 1e-9);

        // Track collapsed mid-drag (e.g. layout change)
        s.track = Some(TrackBounds::new(0.0, 0.0));
        scrub.drag(&mut s, 300.0);
        assert!((s.media.current_time - 15.0).abs() < 1e-9);
        assert_eq!(s.progress(ProgressBar::Played), Some(0.25));
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut s = surface(60.0);
        let mut scrub = ScrubController::new();
        scrub.drag(&mut s, 200.0);
        assert_eq!(s.media.current_time, 0.0);
    }

    #[test]
    fn test_buffered_layer() {
        let mut s = surface(100.0);
        s.media.buffered_end = Some(40.0);
        ScrubController::render_buffered(&mut s);
        assert_eq!(s.progress(ProgressBar::Buffered), Some(0.4));

        let mut live = surface(f64::INFINITY);
        live.media.buffered_end = Some(40.0);
        ScrubController::render_buffered(&mut live);
        assert_eq!(live.progress(ProgressBar::Buffered), None);
    }
}
