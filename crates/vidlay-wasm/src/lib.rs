//! Vidlay WASM - browser binding for the embeddable video widget
//!
//! Wires the DOM into `vidlay-core`:
//! - Player wrappers (`[data-video-wrapper]`) get a playback controller
//! - Rich-text containers (`[data-richtext]`) have their `[[video ...]]` tokens expanded
//! - Caption files and the lightbox modal are attached on request
//!
//! ```javascript
//! import init, { mountPlayer, expandRichText } from '@vidlay/wasm';
//!
//! await init();
//! const player = mountPlayer(document.querySelector('[data-video-wrapper]'), { muted: true });
//! const session = expandRichText(null, { aspectInitial: '16:7', clickToPlay: { aspectActive: '16:9' } });
//! ```

use tracing::{info, warn};
use vidlay_core::{resolve, ConfigOverride, Error, TokenPipeline};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlVideoElement};

mod dom;
mod lightbox;
mod listeners;
mod logging;
mod player;
mod poster;
mod rich_text;
mod subtitles;

pub use lightbox::LightboxHandle;
pub use player::PlayerHandle;
pub use poster::CanvasPosterGenerator;
pub use rich_text::RichTextSession;

/// Page-wide defaults read when no global layer is passed
const GLOBAL_CONFIG_KEY: &str = "RichTextVideoConfig";

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::install(tracing::Level::INFO);
    vidlay_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    vidlay_core::VERSION.to_string()
}

/// Change console verbosity ("error", "warn", "info", "debug", "trace")
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(name: &str) -> bool {
    match logging::parse_level(name) {
        Some(level) => logging::set_level(level),
        None => {
            warn!(name, "Unknown log level");
            false
        }
    }
}

/// Read a configuration layer from a JS object; `undefined` and `null` are empty
fn config_layer(value: JsValue) -> Option<ConfigOverride> {
    if value.is_undefined() || value.is_null() {
        return Some(ConfigOverride::default());
    }
    match serde_wasm_bindgen::from_value(value) {
        Ok(layer) => Some(layer),
        Err(e) => {
            let err = Error::InvalidConfig(e.to_string());
            warn!(error = %err, code = err.error_code(), "Configuration layer ignored");
            None
        }
    }
}

fn page_defaults() -> ConfigOverride {
    let Ok(window) = dom::window() else {
        return ConfigOverride::default();
    };
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(GLOBAL_CONFIG_KEY))
        .unwrap_or(JsValue::UNDEFINED);
    config_layer(value).unwrap_or_default()
}

/// Mount a player on an existing wrapper
///
/// `options` is a caller layer merged over the page defaults.
#[wasm_bindgen(js_name = mountPlayer)]
pub fn mount_player(wrapper: HtmlElement, options: JsValue) -> Option<PlayerHandle> {
    let caller = config_layer(options)?;
    let config = resolve(&page_defaults(), &caller, None);

    match PlayerHandle::bind(wrapper, config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, code = e.error_code(), "Player not mounted");
            None
        }
    }
}

/// Expand video tokens inside `container`, or the page's `[data-richtext]` block
///
/// Running it again over the same content only picks up new tokens.
#[wasm_bindgen(js_name = expandRichText)]
pub fn expand_rich_text(container: Option<HtmlElement>, options: JsValue) -> Option<RichTextSession> {
    let document = dom::document().ok()?;
    let container: Element = match container {
        Some(el) => el.unchecked_into(),
        None => match document.query_selector(rich_text::CONTENT_SELECTOR).ok().flatten() {
            Some(el) => el,
            None => {
                info!("No rich-text container on the page");
                return None;
            }
        },
    };

    let caller = config_layer(options)?;
    let pipeline = TokenPipeline::new(page_defaults()).with_caller(caller);
    Some(RichTextSession::run(&pipeline, document, container))
}

/// Attach a caption file to one video
#[wasm_bindgen(js_name = attachSubtitles)]
pub fn attach_subtitles(video: HtmlVideoElement, src: &str) {
    subtitles::attach(video, src);
}

/// Attach captions to every video carrying `data-subtitles-src`
#[wasm_bindgen(js_name = attachAllSubtitles)]
pub fn attach_all_subtitles() -> u32 {
    dom::document().map_or(0, |document| subtitles::attach_all(&document))
}

/// Bind the page's lightbox modal, if it has one
#[wasm_bindgen(js_name = initLightbox)]
pub fn init_lightbox() -> Option<LightboxHandle> {
    let document = dom::document().ok()?;
    match LightboxHandle::bind(&document) {
        Ok(handle) => Some(handle),
        Err(e) => {
            info!(error = %e, "Lightbox not bound");
            None
        }
    }
}
