//! DOM implementations of the core host traits

use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use vidlay_core::surface::{MediaElement, PlayerSurface};
use vidlay_core::types::{
    AspectRatio, ControlSlot, FeedbackAction, FullscreenSupport, FullscreenTarget, Icon,
    ProgressBar, ReadyState, TextTrackMode, TimeLabel, TrackBounds, Viewport, MOBILE_MAX_WIDTH,
};
use vidlay_core::{Error, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlElement, HtmlVideoElement, MediaQueryList, Window};

pub const VIDEO_SELECTOR: &str = "[data-video-el]";
pub const CONTROLS_SELECTOR: &str = "[data-video-controls]";
pub const OVERLAY_SELECTOR: &str = "[data-video-activate]";
pub const TRACK_SELECTOR: &str = "[data-video-progress-track]";
pub const PLAYED_SELECTOR: &str = "[data-video-progress-played]";
pub const BUFFER_SELECTOR: &str = "[data-video-progress-buffer]";
pub const CURRENT_SELECTOR: &str = "[data-video-current]";
pub const DURATION_SELECTOR: &str = "[data-video-duration]";
pub const FEEDBACK_SELECTOR: &str = ".video_click-feedback";
pub const ACTIVE_CLASS: &str = "is-active";
pub const VISIBLE_CLASS: &str = "is-visible";

const MOBILE_QUERY: &str = "(max-width: 767px)";

pub fn window() -> Result<Window> {
    web_sys::window().ok_or(Error::missing("window"))
}

pub fn document() -> Result<Document> {
    window()?.document().ok_or(Error::missing("document"))
}

/// Readable form of a thrown JavaScript value
pub fn js_error(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

pub fn query<T: JsCast>(root: &Element, selector: &str) -> Option<T> {
    root.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<T>().ok())
}

pub fn slot_selector(slot: ControlSlot) -> String {
    format!("[{}]", slot.marker())
}

fn set_display(element: &HtmlElement, visible: bool) {
    let _ = element
        .style()
        .set_property("display", if visible { "block" } else { "none" });
}

/// Call a vendor-prefixed method on `target`, if present
fn call_method(target: &JsValue, name: &str) -> bool {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .map(|f| f.call0(target).is_ok())
        .unwrap_or(false)
}

fn has_method(target: &JsValue, name: &str) -> bool {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .map(|f| f.is_function())
        .unwrap_or(false)
}

/// Fire-and-forget `play()`; rejections are logged at debug level
pub fn play_swallowed(video: &HtmlVideoElement) {
    match video.play() {
        Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                let err = Error::PlaybackRejected(js_error(&e));
                debug!(error = %err, code = err.error_code(), "Autoplay blocked");
            }
        }),
        Err(e) => {
            let err = Error::PlaybackRejected(js_error(&e));
            debug!(error = %err, code = err.error_code(), "Playback request failed");
        }
    }
}

/// An `HtmlVideoElement` as a [`MediaElement`]
#[derive(Debug, Clone)]
pub struct DomMedia {
    video: HtmlVideoElement,
}

impl DomMedia {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.video
    }

    fn first_track(&self) -> Option<web_sys::TextTrack> {
        let tracks = self.video.text_tracks()?;
        if tracks.length() == 0 {
            return None;
        }
        tracks.get(0)
    }
}

impl MediaElement for DomMedia {
    fn is_paused(&self) -> bool {
        self.video.paused()
    }

    fn is_muted(&self) -> bool {
        self.video.muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.video.set_muted(muted);
    }

    fn set_looping(&mut self, looping: bool) {
        self.video.set_loop(looping);
    }

    fn set_plays_inline(&mut self, inline: bool) {
        let result = if inline {
            self.video.set_attribute("playsinline", "")
        } else {
            self.video.remove_attribute("playsinline")
        };
        if let Err(e) = result {
            debug!(error = %js_error(&e), "Could not set playsinline");
        }
    }

    fn current_time(&self) -> f64 {
        self.video.current_time()
    }

    fn seek(&mut self, seconds: f64) {
        self.video.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.video.duration()
    }

    fn buffered_end(&self) -> Option<f64> {
        let ranges = self.video.buffered();
        let count = ranges.length();
        if count == 0 {
            return None;
        }
        ranges.end(count - 1).ok()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_raw(self.video.ready_state())
    }

    fn play(&mut self) {
        play_swallowed(&self.video);
    }

    fn pause(&mut self) {
        if let Err(e) = self.video.pause() {
            debug!(error = %js_error(&e), "pause() failed");
        }
    }

    fn text_track_mode(&self) -> Option<TextTrackMode> {
        let mode = match self.first_track()?.mode() {
            web_sys::TextTrackMode::Showing => TextTrackMode::Showing,
            web_sys::TextTrackMode::Hidden => TextTrackMode::Hidden,
            _ => TextTrackMode::Disabled,
        };
        Some(mode)
    }

    fn set_text_track_mode(&mut self, mode: TextTrackMode) {
        if let Some(track) = self.first_track() {
            track.set_mode(match mode {
                TextTrackMode::Showing => web_sys::TextTrackMode::Showing,
                TextTrackMode::Hidden => web_sys::TextTrackMode::Hidden,
                TextTrackMode::Disabled => web_sys::TextTrackMode::Disabled,
            });
        }
    }

    fn set_source(&mut self, src: &str) {
        self.video.set_src(src);
        self.video.load();
    }

    fn clear_source(&mut self) {
        let _ = self.video.remove_attribute("src");
        self.video.load();
    }

    fn enter_native_fullscreen(&mut self) {
        if !call_method(self.video.as_ref(), "webkitEnterFullscreen") {
            debug!("Native video fullscreen unavailable");
        }
    }
}

/// Click feedback element with its hide timer
struct FeedbackPulse {
    element: HtmlElement,
    icons: Vec<HtmlElement>,
    timer: Cell<Option<i32>>,
    hide: Closure<dyn FnMut()>,
}

impl FeedbackPulse {
    fn find(wrapper: &HtmlElement) -> Option<Self> {
        let element: HtmlElement = query(wrapper, FEEDBACK_SELECTOR)?;

        let mut icons = Vec::new();
        if let Ok(list) = element.query_selector_all("[data-icon]") {
            for i in 0..list.length() {
                if let Some(icon) = list.get(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                    icons.push(icon);
                }
            }
        }

        let target = element.clone();
        let hide = Closure::wrap(Box::new(move || {
            let _ = target.class_list().remove_1(VISIBLE_CLASS);
        }) as Box<dyn FnMut()>);

        Some(Self {
            element,
            icons,
            timer: Cell::new(None),
            hide,
        })
    }

    fn show(&self, window: &Window, action: FeedbackAction, hold: Duration) {
        let _ = self.element.set_attribute("data-state", action.name());
        for icon in &self.icons {
            let matches = icon.get_attribute("data-icon").as_deref() == Some(action.name());
            set_display(icon, matches);
        }
        let _ = self.element.class_list().add_1(VISIBLE_CLASS);

        if let Some(previous) = self.timer.take() {
            window.clear_timeout_with_handle(previous);
        }
        let millis = i32::try_from(hold.as_millis()).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.hide.as_ref().unchecked_ref(),
            millis,
        ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(e) => debug!(error = %js_error(&e), "Could not schedule feedback hide"),
        }
    }

    fn cancel(&self, window: &Window) {
        if let Some(handle) = self.timer.take() {
            window.clear_timeout_with_handle(handle);
        }
    }
}

/// A player wrapper found in the document
pub struct DomSurface {
    window: Window,
    document: Document,
    wrapper: HtmlElement,
    media: DomMedia,
    controls: HashMap<ControlSlot, HtmlElement>,
    icons: HashMap<Icon, HtmlElement>,
    track: Option<HtmlElement>,
    played: Option<HtmlElement>,
    buffered: Option<HtmlElement>,
    current_label: Option<Element>,
    duration_label: Option<Element>,
    feedback: Option<FeedbackPulse>,
    mobile_query: Option<MediaQueryList>,
}

impl DomSurface {
    /// Collect the player's elements. Fails if the wrapper has no video.
    pub fn new(wrapper: HtmlElement) -> Result<Self> {
        let window = window()?;
        let document = window.document().ok_or(Error::missing("document"))?;

        let video: HtmlVideoElement =
            query(&wrapper, VIDEO_SELECTOR).ok_or(Error::missing("video"))?;

        let mut controls = HashMap::new();
        for slot in [
            ControlSlot::Play,
            ControlSlot::Mute,
            ControlSlot::Restart,
            ControlSlot::Fullscreen,
            ControlSlot::Captions,
            ControlSlot::Progress,
        ] {
            if let Some(el) = query::<HtmlElement>(&wrapper, &slot_selector(slot)) {
                controls.insert(slot, el);
            }
        }

        let mut icons = HashMap::new();
        for icon in Icon::ALL {
            let selector = format!("[data-video-icon=\"{}\"]", icon.name());
            if let Some(el) = controls
                .get(&icon.slot())
                .and_then(|button| query::<HtmlElement>(button, &selector))
            {
                icons.insert(icon, el);
            }
        }

        let progress = controls.get(&ControlSlot::Progress);
        let track = progress.and_then(|p| query(p, TRACK_SELECTOR));
        let played = progress.and_then(|p| query(p, PLAYED_SELECTOR));
        let buffered = progress.and_then(|p| query(p, BUFFER_SELECTOR));

        let mobile_query = window.match_media(MOBILE_QUERY).ok().flatten();

        Ok(Self {
            current_label: query(&wrapper, CURRENT_SELECTOR),
            duration_label: query(&wrapper, DURATION_SELECTOR),
            feedback: FeedbackPulse::find(&wrapper),
            media: DomMedia::new(video),
            window,
            document,
            wrapper,
            controls,
            icons,
            track,
            played,
            buffered,
            mobile_query,
        })
    }

    pub fn wrapper(&self) -> &HtmlElement {
        &self.wrapper
    }

    pub fn video(&self) -> &HtmlVideoElement {
        self.media.element()
    }

    pub fn control(&self, slot: ControlSlot) -> Option<&HtmlElement> {
        self.controls.get(&slot)
    }

    /// Breakpoint query, for change notifications
    pub fn mobile_query(&self) -> Option<&MediaQueryList> {
        self.mobile_query.as_ref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Stop any pending feedback timer
    pub fn cancel_timers(&self) {
        if let Some(feedback) = &self.feedback {
            feedback.cancel(&self.window);
        }
    }

    fn progress_element(&self) -> Option<&HtmlElement> {
        self.controls.get(&ControlSlot::Progress)
    }

    fn fullscreen_element(&self) -> Option<Element> {
        self.document.fullscreen_element().or_else(|| {
            js_sys::Reflect::get(&self.document, &JsValue::from_str("webkitFullscreenElement"))
                .ok()
                .and_then(|v| v.dyn_into::<Element>().ok())
        })
    }

    fn is_iphone(&self) -> bool {
        self.window
            .navigator()
            .user_agent()
            .map(|ua| ua.contains("iPhone") || ua.contains("iPod"))
            .unwrap_or(false)
    }
}

impl PlayerSurface for DomSurface {
    type Media = DomMedia;

    fn media(&self) -> &DomMedia {
        &self.media
    }

    fn media_mut(&mut self) -> &mut DomMedia {
        &mut self.media
    }

    fn is_attached(&self) -> bool {
        self.wrapper.is_connected()
    }

    fn has_control(&self, slot: ControlSlot) -> bool {
        self.controls.get(&slot).is_some_and(|el| el.is_connected())
    }

    fn has_activation_overlay(&self) -> bool {
        query::<Element>(&self.wrapper, OVERLAY_SELECTOR).is_some()
    }

    fn remove_activation_overlay(&mut self) {
        if let Some(overlay) = query::<Element>(&self.wrapper, OVERLAY_SELECTOR) {
            overlay.remove();
        }
    }

    fn set_active_marker(&mut self, active: bool) {
        let _ = self
            .wrapper
            .class_list()
            .toggle_with_force(ACTIVE_CLASS, active);
    }

    fn set_aspect_ratio(&mut self, aspect: AspectRatio) {
        let _ = self
            .wrapper
            .style()
            .set_property("aspect-ratio", &aspect.css_value());
    }

    fn clear_aspect_ratio(&mut self) {
        let _ = self.wrapper.style().remove_property("aspect-ratio");
    }

    fn set_icon_visible(&mut self, icon: Icon, visible: bool) {
        if let Some(el) = self.icons.get(&icon) {
            set_display(el, visible);
        }
    }

    fn pulse_feedback(&mut self, action: FeedbackAction, hold: Duration) {
        if let Some(feedback) = &self.feedback {
            feedback.show(&self.window, action, hold);
        }
    }

    fn set_progress(&mut self, bar: ProgressBar, fraction: f64) {
        let percent = format!("{}%", fraction * 100.0);
        let (property, layer) = match bar {
            ProgressBar::Played => ("--progress", &self.played),
            ProgressBar::Buffered => ("--buffer", &self.buffered),
        };

        if let Some(progress) = self.progress_element() {
            let _ = progress.style().set_property(property, &percent);
        }
        if let Some(layer) = layer {
            let _ = layer.style().set_property("width", &percent);
        }
    }

    fn set_time_text(&mut self, label: TimeLabel, text: &str) {
        let el = match label {
            TimeLabel::Current => &self.current_label,
            TimeLabel::Duration => &self.duration_label,
        };
        if let Some(el) = el {
            el.set_text_content(Some(text));
        }
    }

    fn track_bounds(&self) -> Option<TrackBounds> {
        let track = self.track.as_ref().or(self.progress_element())?;
        let rect = track.get_bounding_client_rect();
        Some(TrackBounds::new(rect.left(), rect.width()))
    }

    fn capture_pointer(&mut self, pointer_id: i32) {
        if let Some(progress) = self.progress_element() {
            if let Err(e) = progress.set_pointer_capture(pointer_id) {
                debug!(pointer_id, error = %js_error(&e), "Pointer capture failed");
            }
        }
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        if let Some(progress) = self.progress_element() {
            if progress.has_pointer_capture(pointer_id) {
                let _ = progress.release_pointer_capture(pointer_id);
            }
        }
    }

    fn viewport(&self) -> Viewport {
        if let Some(query) = &self.mobile_query {
            return if query.matches() {
                Viewport::Mobile
            } else {
                Viewport::Desktop
            };
        }
        let width = self
            .window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(MOBILE_MAX_WIDTH + 1.0);
        Viewport::from_width(width)
    }

    fn fullscreen_support(&self) -> FullscreenSupport {
        if self.is_iphone() && has_method(self.media.element().as_ref(), "webkitEnterFullscreen") {
            FullscreenSupport::NativeVideoOnly
        } else if self.document.fullscreen_enabled()
            || has_method(self.wrapper.as_ref(), "webkitRequestFullscreen")
        {
            FullscreenSupport::Element
        } else {
            FullscreenSupport::Unsupported
        }
    }

    fn fullscreen_target(&self) -> FullscreenTarget {
        match self.fullscreen_element() {
            None => FullscreenTarget::None,
            Some(el) if el.is_same_node(Some(self.wrapper.as_ref())) => {
                FullscreenTarget::ThisWrapper
            }
            Some(_) => FullscreenTarget::Other,
        }
    }

    fn request_fullscreen(&mut self) {
        if self.wrapper.request_fullscreen().is_err()
            && !call_method(self.wrapper.as_ref(), "webkitRequestFullscreen")
        {
            debug!("Fullscreen request failed");
        }
    }

    fn exit_fullscreen(&mut self) {
        if self.document.fullscreen_element().is_some() {
            self.document.exit_fullscreen();
        } else {
            call_method(self.document.as_ref(), "webkitExitFullscreen");
        }
    }
}
