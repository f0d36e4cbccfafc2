//! Lightbox modal binding

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};
use vidlay_core::{Error, Lightbox, LightboxSurface, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlVideoElement, KeyboardEvent};

use crate::dom::{js_error, query, DomMedia, ACTIVE_CLASS, VIDEO_SELECTOR};
use crate::listeners::ListenerSet;

pub const POPUP_SELECTOR: &str = "[data-video-popup]";
pub const CLOSE_SELECTOR: &str = "[data-popup-close]";
pub const CONTENT_SELECTOR: &str = "[data-video-lightbox]";
pub const TRIGGER_SELECTOR: &str = ".video_lightbox-wr";

/// The modal element and its video
pub struct DomLightbox {
    modal: Element,
    media: DomMedia,
}

impl LightboxSurface for DomLightbox {
    type Media = DomMedia;

    fn media_mut(&mut self) -> &mut DomMedia {
        &mut self.media
    }

    fn set_open_marker(&mut self, open: bool) {
        let _ = self.modal.class_list().toggle_with_force(ACTIVE_CLASS, open);
    }
}

/// The page's lightbox with its triggers wired
#[wasm_bindgen]
pub struct LightboxHandle {
    lightbox: Rc<RefCell<Lightbox<DomLightbox>>>,
    listeners: ListenerSet,
}

impl LightboxHandle {
    pub fn bind(document: &Document) -> Result<Self> {
        let modal = document
            .query_selector(POPUP_SELECTOR)
            .ok()
            .flatten()
            .ok_or(Error::missing("lightbox"))?;
        let video: HtmlVideoElement =
            query(&modal, VIDEO_SELECTOR).ok_or(Error::missing("lightbox video"))?;

        let lightbox = Rc::new(RefCell::new(Lightbox::new(DomLightbox {
            modal: modal.clone(),
            media: DomMedia::new(video),
        })));
        let mut handle = Self {
            lightbox,
            listeners: ListenerSet::new(),
        };

        if let Err(e) = handle.wire(document, &modal) {
            warn!(error = %js_error(&e), "Lightbox wiring incomplete");
        }
        info!(listeners = handle.listeners.len(), "Lightbox bound");
        Ok(handle)
    }

    fn wire(&mut self, document: &Document, modal: &Element) -> std::result::Result<(), JsValue> {
        let triggers = document.query_selector_all(TRIGGER_SELECTOR)?;
        for i in 0..triggers.length() {
            let Some(trigger) = triggers.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let lightbox = self.lightbox.clone();
            let source = trigger.clone();
            self.listeners.listen(&trigger, "click", move |_| {
                let src = source.get_attribute("data-video-src").unwrap_or_default();
                if let Ok(mut lightbox) = lightbox.try_borrow_mut() {
                    lightbox.open(&src);
                }
            })?;
        }

        if let Some(close) = query::<Element>(modal, CLOSE_SELECTOR) {
            let lightbox = self.lightbox.clone();
            self.listeners.listen(&close, "click", move |_| {
                if let Ok(mut lightbox) = lightbox.try_borrow_mut() {
                    lightbox.close();
                }
            })?;
        }

        let lightbox = self.lightbox.clone();
        self.listeners.listen(modal, "click", move |event: Event| {
            let inside = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(CONTENT_SELECTOR).ok().flatten())
                .is_some();
            if let Ok(mut lightbox) = lightbox.try_borrow_mut() {
                lightbox.on_backdrop_click(inside);
            }
        })?;

        let lightbox = self.lightbox.clone();
        self.listeners.listen(document, "keydown", move |event: Event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
                if let Ok(mut lightbox) = lightbox.try_borrow_mut() {
                    lightbox.on_key(&key);
                }
            }
        })?;

        debug!(triggers = triggers.length(), "Lightbox triggers wired");
        Ok(())
    }
}

#[wasm_bindgen]
impl LightboxHandle {
    pub fn open(&self, src: &str) -> bool {
        self.lightbox.borrow_mut().open(src)
    }

    pub fn close(&self) {
        self.lightbox.borrow_mut().close();
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.lightbox.borrow().is_open()
    }

    /// Close the modal and remove every listener
    pub fn dispose(&mut self) {
        self.lightbox.borrow_mut().close();
        self.listeners.clear();
    }
}
