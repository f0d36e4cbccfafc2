//! Lightbox - a modal that plays one source at a time

use crate::surface::MediaElement;
use tracing::debug;

/// Key that closes an open lightbox
pub const CLOSE_KEY: &str = "Escape";

/// The modal element and the video inside it
pub trait LightboxSurface {
    type Media: MediaElement;

    fn media_mut(&mut self) -> &mut Self::Media;

    /// Toggle the modal's `is-active` marker
    fn set_open_marker(&mut self, open: bool);
}

/// Open/closed state of one lightbox modal
#[derive(Debug)]
pub struct Lightbox<S> {
    surface: S,
    current: Option<String>,
}

impl<S: LightboxSurface> Lightbox<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            current: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Source playing in the modal, if open
    pub fn current_source(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Show the modal playing `src`. Empty sources are ignored.
    pub fn open(&mut self, src: &str) -> bool {
        let src = src.trim();
        if src.is_empty() {
            return false;
        }

        let media = self.surface.media_mut();
        media.set_source(src);
        self.surface.set_open_marker(true);
        self.surface.media_mut().play();

        debug!(src, "Lightbox opened");
        self.current = Some(src.to_string());
        true
    }

    pub fn close(&mut self) {
        if self.current.take().is_none() {
            return;
        }

        let media = self.surface.media_mut();
        media.pause();
        media.clear_source();
        self.surface.set_open_marker(false);
        debug!("Lightbox closed");
    }

    /// Keyboard event anywhere in the document
    pub fn on_key(&mut self, key: &str) {
        if key == CLOSE_KEY {
            self.close();
        }
    }

    /// Click on the modal; only clicks outside the content region close it
    pub fn on_backdrop_click(&mut self, inside_content: bool) {
        if !inside_content {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMedia;

    #[derive(Default)]
    struct Modal {
        media: FakeMedia,
        open: bool,
    }

    impl LightboxSurface for Modal {
        type Media = FakeMedia;

        fn media_mut(&mut self) -> &mut FakeMedia {
            &mut self.media
        }

        fn set_open_marker(&mut self, open: bool) {
            self.open = open;
        }
    }

    #[test]
    fn test_open_and_close() {
        let mut lightbox = Lightbox::new(Modal::default());
        assert!(lightbox.open("/v/a.mp4"));
        assert!(lightbox.surface().open);
        assert!(!lightbox.surface().media.paused);
        assert_eq!(lightbox.surface().media.source.as_deref(), Some("/v/a.mp4"));

        lightbox.on_key("Escape");
        assert!(!lightbox.is_open());
        assert!(!lightbox.surface().open);
        assert!(lightbox.surface().media.paused);
        assert_eq!(lightbox.surface().media.source, None);
    }

    #[test]
    fn test_empty_source_is_ignored() {
        let mut lightbox = Lightbox::new(Modal::default());
        assert!(!lightbox.open("  "));
        assert!(!lightbox.is_open());
        assert_eq!(lightbox.surface().media.play_requests, 0);
    }

    #[test]
    fn test_content_clicks_keep_it_open() {
        let mut lightbox = Lightbox::new(Modal::default());
        lightbox.open("a.mp4");
        lightbox.on_backdrop_click(true);
        lightbox.on_key("Enter");
        assert!(lightbox.is_open());

        lightbox.on_backdrop_click(false);
        assert!(!lightbox.is_open());
    }

    #[test]
    fn test_reopen_switches_source() {
        let mut lightbox = Lightbox::new(Modal::default());
        lightbox.open("a.mp4");
        lightbox.open("b.mp4");
        assert_eq!(lightbox.current_source(), Some("b.mp4"));
        assert_eq!(lightbox.surface().media.source.as_deref(), Some("b.mp4"));

        lightbox.close();
        lightbox.close();
        assert_eq!(lightbox.surface().media.play_requests, 2);
    }
}
