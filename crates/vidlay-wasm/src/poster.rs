//! First-frame posters drawn through an off-screen canvas

use async_trait::async_trait;
use tracing::debug;
use vidlay_core::poster::{PosterGenerator, POSTER_MIME, POSTER_QUALITY};
use vidlay_core::{Error, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use crate::dom::{document, js_error};

/// Loads the source into a detached, muted video and encodes its first frame
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasPosterGenerator;

impl CanvasPosterGenerator {
    /// Resolve once the probe video has decoded a frame
    fn first_frame(video: &HtmlVideoElement) -> js_sys::Promise {
        let video = video.clone();
        js_sys::Promise::new(&mut move |resolve, reject| {
            let on_data = Closure::once_into_js(move || {
                let _ = resolve.call0(&JsValue::NULL);
            });
            let on_error = Closure::once_into_js(move || {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("media error"));
            });

            let options = web_sys::AddEventListenerOptions::new();
            options.set_once(true);
            let _ = video.add_event_listener_with_callback_and_add_event_listener_options(
                "loadeddata",
                on_data.unchecked_ref(),
                &options,
            );
            let _ = video.add_event_listener_with_callback_and_add_event_listener_options(
                "error",
                on_error.unchecked_ref(),
                &options,
            );
        })
    }

    fn encode(video: &HtmlVideoElement) -> Result<String> {
        let (width, height) = (video.video_width(), video.video_height());
        if width == 0 || height == 0 {
            return Err(Error::PosterGeneration("video has no dimensions".into()));
        }

        let canvas: HtmlCanvasElement = document()?
            .create_element("canvas")
            .map_err(|e| Error::PosterGeneration(js_error(&e)))?
            .dyn_into()
            .map_err(|_| Error::PosterGeneration("not a canvas".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| Error::PosterGeneration(js_error(&e)))?
            .ok_or_else(|| Error::PosterGeneration("no 2d context".into()))?
            .dyn_into()
            .map_err(|_| Error::PosterGeneration("unexpected context type".into()))?;

        context
            .draw_image_with_html_video_element_and_dw_and_dh(
                video,
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            )
            .map_err(|e| Error::PosterGeneration(js_error(&e)))?;

        // Cross-origin sources without CORS taint the canvas and throw here
        canvas
            .to_data_url_with_type_and_encoder_options(POSTER_MIME, &JsValue::from_f64(POSTER_QUALITY))
            .map_err(|e| Error::PosterGeneration(js_error(&e)))
    }
}

#[async_trait(?Send)]
impl PosterGenerator for CanvasPosterGenerator {
    async fn generate(&self, src: &str) -> Result<String> {
        let video: HtmlVideoElement = document()?
            .create_element("video")
            .map_err(|e| Error::PosterGeneration(js_error(&e)))?
            .dyn_into()
            .map_err(|_| Error::PosterGeneration("not a video".into()))?;

        video.set_muted(true);
        video.set_preload("auto");
        let _ = video.set_attribute("playsinline", "");
        video.set_src(src);
        video.set_current_time(0.0);

        JsFuture::from(Self::first_frame(&video))
            .await
            .map_err(|e| Error::PosterGeneration(js_error(&e)))?;

        let poster = Self::encode(&video);
        let _ = video.remove_attribute("src");
        video.load();

        debug!(src, ok = poster.is_ok(), "Poster frame captured");
        poster
    }
}
