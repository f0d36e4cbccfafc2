//! Caption track attachment

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};
use vidlay_core::subtitles::{srt_to_vtt, SubtitleSource, TrackAttributes, SUBTITLES_ATTR, VTT_MIME};
use vidlay_core::{Error, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, Document, Event, HtmlTrackElement, HtmlVideoElement, Response, Url,
};

use crate::dom::{document, js_error, window};

/// Attach the caption file at `src` to `video`
pub fn attach(video: HtmlVideoElement, src: &str) {
    match SubtitleSource::classify(src) {
        SubtitleSource::Vtt => {
            if let Err(e) = append_track(&video, src) {
                warn!(src, error = %e, "Subtitles not attached");
            }
        }
        SubtitleSource::Srt => {
            let src = src.to_string();
            wasm_bindgen_futures::spawn_local(async move {
                let attached = fetch_converted(&src).await.and_then(|url| {
                    let url = ObjectUrl::new(url);
                    match append_track(&video, url.as_str()) {
                        Ok(track) => revoke_when_settled(&track, url),
                        Err(e) => {
                            url.revoke();
                            Err(e)
                        }
                    }
                });
                if let Err(e) = attached {
                    warn!(src = %src, error = %e, "Subtitles failed to load");
                }
            });
        }
        SubtitleSource::Unsupported => debug!(src, "Unsupported subtitle format"),
    }
}

/// Attach captions to every `video[data-subtitles-src]` under `document`
pub fn attach_all(document: &Document) -> u32 {
    let selector = format!("video[{SUBTITLES_ATTR}]");
    let Ok(list) = document.query_selector_all(&selector) else {
        return 0;
    };

    let mut attached = 0;
    for i in 0..list.length() {
        let Some(video) = list.get(i).and_then(|n| n.dyn_into::<HtmlVideoElement>().ok()) else {
            continue;
        };
        if let Some(src) = video.get_attribute(SUBTITLES_ATTR).filter(|s| !s.is_empty()) {
            attach(video, &src);
            attached += 1;
        }
    }
    attached
}

/// A blob URL owned by one caption track, released exactly once
#[derive(Debug)]
struct ObjectUrl(Option<String>);

impl ObjectUrl {
    fn new(url: String) -> Self {
        Self(Some(url))
    }

    fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or_default()
    }

    /// The URL on first call; `None` once released
    fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    fn revoke(mut self) {
        if let Some(url) = self.take() {
            if let Err(e) = Url::revoke_object_url(&url) {
                debug!(error = %js_error(&e), "Object URL not revoked");
            }
        }
    }
}

/// Release the converted file once the track has loaded or failed
fn revoke_when_settled(track: &HtmlTrackElement, url: ObjectUrl) -> Result<()> {
    let url = Rc::new(RefCell::new(Some(url)));
    let release = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(url) = url.borrow_mut().take() {
            debug!(event = %event.type_(), "Caption track settled");
            url.revoke();
        }
    });

    // Handed to the JS garbage collector; lives as long as the track references it
    let release = release.into_js_value();
    for event in ["load", "error"] {
        track
            .add_event_listener_with_callback(event, release.unchecked_ref())
            .map_err(|e| Error::Subtitles(js_error(&e)))?;
    }
    Ok(())
}

fn append_track(video: &HtmlVideoElement, url: &str) -> Result<HtmlTrackElement> {
    let attrs = TrackAttributes::ENGLISH;
    let track: HtmlTrackElement = document()?
        .create_element("track")
        .map_err(|e| Error::Subtitles(js_error(&e)))?
        .dyn_into()
        .map_err(|_| Error::Subtitles("not a track element".into()))?;

    track.set_kind(attrs.kind);
    track.set_label(attrs.label);
    track.set_srclang(attrs.srclang);
    track.set_src(url);

    video
        .append_child(&track)
        .map_err(|e| Error::Subtitles(js_error(&e)))?;

    if let Some(text_track) = track.track() {
        text_track.set_mode(web_sys::TextTrackMode::Hidden);
    }
    Ok(track)
}

/// Fetch an SRT file and return an object URL of its WebVTT conversion
async fn fetch_converted(src: &str) -> Result<String> {
    let to_err = |e: JsValue| Error::Subtitles(js_error(&e));

    let response: Response = JsFuture::from(window()?.fetch_with_str(src))
        .await
        .map_err(to_err)?
        .dyn_into()
        .map_err(to_err)?;
    if !response.ok() {
        return Err(Error::Subtitles(format!("HTTP {}", response.status())));
    }

    let srt = JsFuture::from(response.text().map_err(to_err)?)
        .await
        .map_err(to_err)?
        .as_string()
        .ok_or_else(|| Error::Subtitles("response is not text".into()))?;

    let vtt = srt_to_vtt(&srt);
    let options = BlobPropertyBag::new();
    options.set_type(VTT_MIME);
    let parts = js_sys::Array::of1(&JsValue::from_str(&vtt));
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(to_err)?;

    Url::create_object_url_with_blob(&blob).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_released_once() {
        let mut url = ObjectUrl::new("blob:https://site.test/1f0c".into());
        assert_eq!(url.as_str(), "blob:https://site.test/1f0c");

        assert_eq!(url.take().as_deref(), Some("blob:https://site.test/1f0c"));
        assert_eq!(url.take(), None);
        assert_eq!(url.as_str(), "");
    }
}
