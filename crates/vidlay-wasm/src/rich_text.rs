//! Rich-text token expansion in the document

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};
use vidlay_core::pipeline::{InitTiming, MountedClone, PipelineHost, PreparedMount};
use vidlay_core::poster::{resolve_poster, PosterPlan};
use vidlay_core::token::{Segment, Token, PLACEHOLDER_ATTR, STATE_ATTR, STATE_MOUNTED};
use vidlay_core::types::{ControlSlot, ReadyState};
use vidlay_core::{Error, ExpansionReport, Result, TokenPipeline};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlVideoElement, Node, Text};

use crate::dom::{js_error, play_swallowed, query, slot_selector, OVERLAY_SELECTOR, VIDEO_SELECTOR};
use crate::listeners::ListenerSet;
use crate::player::PlayerHandle;
use crate::poster::CanvasPosterGenerator;

pub const CONTENT_SELECTOR: &str = "[data-richtext]";
pub const TEMPLATE_SELECTOR: &str = "[data-video-wrapper]";

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;
/// Elements whose text is never scanned
const SKIPPED_PARENTS: [&str; 4] = ["SCRIPT", "STYLE", "TEXTAREA", "NOSCRIPT"];

/// A cloned player template
#[derive(Debug, Clone)]
pub struct DomMount {
    wrapper: HtmlElement,
    video: Option<HtmlVideoElement>,
}

impl DomMount {
    fn new(wrapper: HtmlElement) -> Self {
        let video = query(&wrapper, VIDEO_SELECTOR);
        Self { wrapper, video }
    }

    pub fn wrapper(&self) -> &HtmlElement {
        &self.wrapper
    }
}

impl MountedClone for DomMount {
    fn set_source(&mut self, src: &str) {
        match query::<Element>(&self.wrapper, "source") {
            Some(source) => {
                let _ = source.set_attribute("src", src);
            }
            None => {
                if let Some(video) = &self.video {
                    video.set_src(src);
                }
            }
        }
    }

    fn set_poster(&mut self, poster: &str) {
        if let Some(video) = &self.video {
            video.set_poster(poster);
        }
    }

    fn remove_control(&mut self, slot: ControlSlot) {
        if let Some(control) = query::<Element>(&self.wrapper, &slot_selector(slot)) {
            control.remove();
        }
    }

    fn remove_activation_overlay(&mut self) {
        if let Some(overlay) = query::<Element>(&self.wrapper, OVERLAY_SELECTOR) {
            overlay.remove();
        }
    }

    fn start_muted_playback(&mut self) {
        if let Some(video) = &self.video {
            video.set_muted(true);
            play_swallowed(video);
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.video
            .as_ref()
            .map_or(ReadyState::HaveNothing, |v| ReadyState::from_raw(v.ready_state()))
    }

    fn is_attached(&self) -> bool {
        self.wrapper.is_connected()
    }
}

/// A content container and the page's player template
pub struct DomContentHost {
    document: Document,
    container: Element,
    template: Option<Element>,
}

impl DomContentHost {
    pub fn new(document: Document, container: Element) -> Self {
        let template = document.query_selector(TEMPLATE_SELECTOR).ok().flatten();
        Self {
            document,
            container,
            template,
        }
    }

    fn placeholder_element(&self, token: &Token) -> Result<Element> {
        let el = self
            .document
            .create_element("div")
            .map_err(|e| Error::Template(js_error(&e)))?;
        for (name, value) in token.to_attributes() {
            el.set_attribute(name, &value)
                .map_err(|e| Error::Template(js_error(&e)))?;
        }
        Ok(el)
    }
}

impl PipelineHost for DomContentHost {
    type TextRun = Text;
    type Placeholder = Element;
    type Mount = DomMount;

    fn text_runs(&self) -> Vec<Text> {
        let Ok(walker) = self
            .document
            .create_tree_walker_with_what_to_show(&self.container, SHOW_TEXT)
        else {
            return Vec::new();
        };

        let mut runs = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            let skipped = node
                .parent_element()
                .is_some_and(|p| SKIPPED_PARENTS.contains(&p.tag_name().as_str()));
            if skipped {
                continue;
            }
            if let Ok(text) = node.dyn_into::<Text>() {
                runs.push(text);
            }
        }
        runs
    }

    fn run_text(&self, run: &Text) -> String {
        run.data()
    }

    fn replace_run(&mut self, run: &Text, segments: &[Segment<'_>]) -> Result<()> {
        let parent = run
            .parent_node()
            .ok_or_else(|| Error::Template("text run has no parent".into()))?;
        let fragment = self.document.create_document_fragment();

        for segment in segments {
            let node: Node = match segment {
                Segment::Text(text) => self.document.create_text_node(text).into(),
                Segment::Token(token) => self.placeholder_element(token)?.into(),
            };
            fragment
                .append_child(&node)
                .map_err(|e| Error::Template(js_error(&e)))?;
        }

        parent
            .replace_child(&fragment, run)
            .map_err(|e| Error::Template(js_error(&e)))?;
        Ok(())
    }

    fn placeholders(&self) -> Vec<Element> {
        let selector = format!("[{PLACEHOLDER_ATTR}]");
        let Ok(list) = self.container.query_selector_all(&selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect()
    }

    fn placeholder_token(&self, placeholder: &Element) -> Option<Token> {
        Token::from_attributes(|name| placeholder.get_attribute(name))
    }

    fn is_consumed(&self, placeholder: &Element) -> bool {
        placeholder.get_attribute(STATE_ATTR).as_deref() == Some(STATE_MOUNTED)
    }

    fn mark_consumed(&mut self, placeholder: &Element) {
        let _ = placeholder.set_attribute(STATE_ATTR, STATE_MOUNTED);
    }

    fn clone_template(&self) -> Option<DomMount> {
        let clone = self.template.as_ref()?.clone_node_with_deep(true).ok()?;
        clone.dyn_into::<HtmlElement>().ok().map(DomMount::new)
    }

    fn splice(&mut self, placeholder: &Element, mount: &DomMount) -> Result<()> {
        let parent = placeholder
            .parent_node()
            .ok_or_else(|| Error::Template("placeholder has no parent".into()))?;
        parent
            .replace_child(mount.wrapper(), placeholder)
            .map_err(|e| Error::Template(js_error(&e)))?;
        Ok(())
    }
}

/// Players created by one expansion run
#[wasm_bindgen]
pub struct RichTextSession {
    report: ExpansionReport,
    players: Rc<RefCell<Vec<PlayerHandle>>>,
    pending: ListenerSet,
}

impl RichTextSession {
    /// Expand tokens inside `container` and schedule every player's controller
    pub fn run(pipeline: &TokenPipeline, document: Document, container: Element) -> Self {
        let mut host = DomContentHost::new(document, container);
        let expansion = pipeline.expand(&mut host);

        let mut session = Self {
            report: expansion.report,
            players: Rc::new(RefCell::new(Vec::new())),
            pending: ListenerSet::new(),
        };
        for prepared in expansion.mounts {
            session.schedule(prepared);
        }
        session
    }

    fn schedule(&mut self, prepared: PreparedMount<DomMount>) {
        let PreparedMount {
            token,
            mount,
            config,
            poster,
            init,
            activated,
        } = prepared;

        if poster == PosterPlan::Generate {
            let mount = mount.clone();
            wasm_bindgen_futures::spawn_local(async move {
                resolve_poster(&CanvasPosterGenerator, mount, &token.src).await;
            });
        }

        let wrapper = mount.wrapper().clone();
        match init {
            InitTiming::Immediate => bind_into(&self.players, wrapper, config, activated),
            InitTiming::OnLoadedMetadata => {
                let Some(video) = mount.video.clone() else {
                    warn!("Player clone without a video element");
                    return;
                };
                let players = self.players.clone();
                let mut pending = Some((wrapper, config));
                let result = self.pending.listen_once(&video, "loadedmetadata", move |_| {
                    if let Some((wrapper, config)) = pending.take() {
                        bind_into(&players, wrapper, config, activated);
                    }
                });
                if let Err(e) = result {
                    warn!(error = %js_error(&e), "Could not defer player initialization");
                }
            }
        }
    }
}

fn bind_into(
    players: &Rc<RefCell<Vec<PlayerHandle>>>,
    wrapper: HtmlElement,
    config: vidlay_core::PlayerConfig,
    activated: bool,
) {
    let bound = if activated {
        PlayerHandle::bind_activated(wrapper, config)
    } else {
        PlayerHandle::bind(wrapper, config)
    };
    match bound {
        Ok(handle) => players.borrow_mut().push(handle),
        Err(e) => warn!(error = %e, code = e.error_code(), "Rich-text player not mounted"),
    }
}

#[wasm_bindgen]
impl RichTextSession {
    /// Expansion counters as a plain object
    #[wasm_bindgen(getter)]
    pub fn report(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.report).unwrap_or(JsValue::NULL)
    }

    /// Controllers mounted so far; deferred ones join after their metadata loads
    #[wasm_bindgen(getter)]
    pub fn player_count(&self) -> usize {
        self.players.borrow().len()
    }

    /// Dispose every player and drop pending initializations
    pub fn dispose(&mut self) {
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "Dropping deferred player initializations");
        }
        self.pending.clear();
        for player in self.players.borrow_mut().iter_mut() {
            player.dispose();
        }
        debug!(players = self.players.borrow().len(), "Rich-text session disposed");
    }
}
