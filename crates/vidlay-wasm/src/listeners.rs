//! Owned event listener registrations
//!
//! Closures handed to `addEventListener` live here instead of being leaked
//! with `forget()`. Clearing the set (or dropping it) removes every listener
//! before its closure is freed.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Event, EventTarget};

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

#[derive(Default)]
pub struct ListenerSet {
    entries: Vec<Listener>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `handler` for `event` on `target`
    pub fn listen<F>(&mut self, target: &EventTarget, event: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.entries.push(Listener {
            target: target.clone(),
            event,
            callback,
        });
        Ok(())
    }

    /// Register a handler the browser drops after its first call
    pub fn listen_once<F>(&mut self, target: &EventTarget, event: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        self.entries.push(Listener {
            target: target.clone(),
            event,
            callback,
        });
        Ok(())
    }

    /// Remove every listener
    pub fn clear(&mut self) {
        for listener in self.entries.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.clear();
    }
}
