//! Player handle - one mounted controller and its event wiring

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};
use vidlay_core::types::{ClickTarget, ControlSlot, MediaEvent};
use vidlay_core::visibility::{is_visible, VISIBILITY_THRESHOLD};
use vidlay_core::{PlayerConfig, PlayerController, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, PointerEvent,
};

use crate::dom::{js_error, DomSurface, CONTROLS_SELECTOR};
use crate::listeners::ListenerSet;

type Shared = Rc<RefCell<PlayerController<DomSurface>>>;

/// Run `f` against the controller unless it is already borrowed
fn with_controller(controller: &Shared, f: impl FnOnce(&mut PlayerController<DomSurface>)) {
    match controller.try_borrow_mut() {
        Ok(mut controller) => f(&mut controller),
        Err(_) => debug!("Controller busy, event dropped"),
    }
}

struct VisibilityObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

/// A mounted player. Call `dispose()` to detach every listener.
#[wasm_bindgen]
pub struct PlayerHandle {
    controller: Shared,
    listeners: ListenerSet,
    visibility: Option<VisibilityObserver>,
}

impl PlayerHandle {
    /// Mount a controller on `wrapper` and wire its events
    pub fn bind(wrapper: HtmlElement, config: PlayerConfig) -> Result<Self> {
        let surface = DomSurface::new(wrapper)?;
        Self::wire_controller(PlayerController::mount(surface, config)?)
    }

    /// Mount a controller whose activation gate was already removed
    pub fn bind_activated(wrapper: HtmlElement, config: PlayerConfig) -> Result<Self> {
        let surface = DomSurface::new(wrapper)?;
        Self::wire_controller(PlayerController::mount_activated(surface, config)?)
    }

    fn wire_controller(controller: PlayerController<DomSurface>) -> Result<Self> {
        let controller = Rc::new(RefCell::new(controller));

        let mut handle = Self {
            controller,
            listeners: ListenerSet::new(),
            visibility: None,
        };

        if let Err(e) = handle.wire() {
            warn!(error = %js_error(&e), "Player event wiring incomplete");
        }
        handle.visibility = handle.observe_visibility();

        let controller = handle.controller.borrow();
        info!(
            instance = %controller.id(),
            listeners = handle.listeners.len(),
            observing = handle.visibility.is_some(),
            "Player bound"
        );
        drop(controller);

        Ok(handle)
    }

    fn wire(&mut self) -> std::result::Result<(), JsValue> {
        let controller = self.controller.borrow();
        let surface = controller.surface();
        let wrapper = surface.wrapper().clone();
        let video = surface.video().clone();
        let document = surface.document().clone();
        let window = surface.window().clone();
        let mobile_query = surface.mobile_query().cloned();
        let buttons: Vec<(ControlSlot, HtmlElement)> = [
            ControlSlot::Play,
            ControlSlot::Mute,
            ControlSlot::Restart,
            ControlSlot::Fullscreen,
            ControlSlot::Captions,
            ControlSlot::Progress,
        ]
        .into_iter()
        .filter_map(|slot| surface.control(slot).map(|el| (slot, el.clone())))
        .collect();
        drop(controller);

        // Wrapper clicks: activation gate or click-to-play
        let c = self.controller.clone();
        self.listeners.listen(&wrapper, "click", move |event: Event| {
            let target = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(CONTROLS_SELECTOR).ok().flatten())
                .map_or(ClickTarget::Body, |_| ClickTarget::Controls);
            with_controller(&c, |controller| controller.on_wrapper_click(target));
        })?;

        for (slot, button) in &buttons {
            let c = self.controller.clone();
            match slot {
                ControlSlot::Play => self.listeners.listen(button, "click", move |_| {
                    with_controller(&c, |controller| controller.on_play_control());
                })?,
                ControlSlot::Mute => self.listeners.listen(button, "click", move |_| {
                    with_controller(&c, |controller| controller.toggle_mute());
                })?,
                ControlSlot::Restart => self.listeners.listen(button, "click", move |_| {
                    with_controller(&c, |controller| controller.restart());
                })?,
                ControlSlot::Fullscreen => self.listeners.listen(button, "click", move |_| {
                    with_controller(&c, |controller| controller.toggle_fullscreen());
                })?,
                ControlSlot::Captions => self.listeners.listen(button, "click", move |_| {
                    with_controller(&c, |controller| {
                        controller.toggle_captions();
                    });
                })?,
                ControlSlot::Progress => {
                    self.listeners.listen(button, "pointerdown", move |event: Event| {
                        let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
                            return;
                        };
                        let (id, x) = (pointer.pointer_id(), f64::from(pointer.client_x()));
                        with_controller(&c, |controller| {
                            if controller.on_pointer_down(id, x) {
                                event.prevent_default();
                            }
                        });
                    })?;
                }
            }
        }

        if buttons.iter().any(|(slot, _)| *slot == ControlSlot::Progress) {
            let c = self.controller.clone();
            self.listeners.listen(&window, "pointermove", move |event: Event| {
                if let Some(pointer) = event.dyn_ref::<PointerEvent>() {
                    let x = f64::from(pointer.client_x());
                    with_controller(&c, |controller| {
                        if controller.is_scrubbing() {
                            controller.on_pointer_move(x);
                        }
                    });
                }
            })?;
            for name in ["pointerup", "pointercancel"] {
                let c = self.controller.clone();
                self.listeners.listen(&window, name, move |event: Event| {
                    if let Some(pointer) = event.dyn_ref::<PointerEvent>() {
                        let id = pointer.pointer_id();
                        with_controller(&c, |controller| controller.on_pointer_up(id));
                    }
                })?;
            }
        }

        for media_event in MediaEvent::ALL {
            let c = self.controller.clone();
            self.listeners
                .listen(&video, media_event.event_type(), move |_| {
                    with_controller(&c, |controller| controller.on_media_event(media_event));
                })?;
        }

        for name in ["fullscreenchange", "webkitfullscreenchange"] {
            let c = self.controller.clone();
            self.listeners.listen(&document, name, move |_| {
                with_controller(&c, |controller| controller.on_fullscreen_change());
            })?;
        }

        if let Some(query) = mobile_query {
            let c = self.controller.clone();
            self.listeners.listen(&query, "change", move |_| {
                with_controller(&c, |controller| controller.on_viewport_change());
            })?;
        }

        Ok(())
    }

    fn observe_visibility(&self) -> Option<VisibilityObserver> {
        let controller = self.controller.borrow();
        if !controller.wants_visibility() {
            return None;
        }
        let wrapper = controller.surface().wrapper().clone();
        drop(controller);

        let c = self.controller.clone();
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let visible = is_visible(entry.intersection_ratio());
                with_controller(&c, |controller| controller.on_visibility_change(visible));
            }
        }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(VISIBILITY_THRESHOLD));

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
            Ok(observer) => {
                observer.observe(&wrapper);
                Some(VisibilityObserver {
                    observer,
                    _callback: callback,
                })
            }
            Err(e) => {
                warn!(error = %js_error(&e), "IntersectionObserver unavailable, autoresume off");
                None
            }
        }
    }
}

#[wasm_bindgen]
impl PlayerHandle {
    /// Instance identifier used in log output
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.controller.borrow().id().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn activated(&self) -> bool {
        self.controller.borrow().is_activated()
    }

    #[wasm_bindgen(getter)]
    pub fn disposed(&self) -> bool {
        self.controller.borrow().is_disposed()
    }

    /// Remove the activation gate programmatically
    pub fn activate(&self) -> bool {
        self.controller.borrow_mut().activate()
    }

    /// Toggle playback as a click-to-play click would
    pub fn toggle(&self) {
        self.controller.borrow_mut().toggle();
    }

    /// Deregister every listener and observer. Idempotent.
    pub fn dispose(&mut self) {
        self.listeners.clear();
        if let Some(visibility) = self.visibility.take() {
            visibility.observer.disconnect();
        }

        let mut controller = self.controller.borrow_mut();
        controller.surface().cancel_timers();
        controller.dispose();
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        if let Some(visibility) = self.visibility.take() {
            visibility.observer.disconnect();
        }
    }
}
