//! In-memory hosts
//!
//! Fakes for every host trait in this crate. They record what the core asked
//! for instead of touching a document, which makes them usable from unit
//! tests, integration tests, benchmarks and the CLI alike.

use crate::error::{Error, Result};
use crate::pipeline::{MountedClone, PipelineHost};
use crate::surface::{MediaElement, PlayerSurface};
use crate::token::{Segment, Token, STATE_ATTR, STATE_MOUNTED};
use crate::types::{
    AspectRatio, ControlSlot, FeedbackAction, FullscreenSupport, FullscreenTarget, Icon,
    ProgressBar, ReadyState, TextTrackMode, TimeLabel, TrackBounds, Viewport,
};
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// Media element with directly settable state
#[derive(Debug, Clone, PartialEq)]
pub struct FakeMedia {
    pub paused: bool,
    pub muted: bool,
    pub looping: bool,
    pub plays_inline: bool,
    pub current_time: f64,
    pub duration: f64,
    pub buffered_end: Option<f64>,
    pub ready_state: ReadyState,
    /// Every `play()` is rejected by the platform
    pub reject_play: bool,
    pub play_requests: u32,
    pub text_track: Option<TextTrackMode>,
    pub source: Option<String>,
    pub native_fullscreen_requests: u32,
}

impl FakeMedia {
    /// Paused, unmuted, 60 seconds long, metadata loaded
    pub fn new() -> Self {
        Self {
            paused: true,
            muted: false,
            looping: false,
            plays_inline: false,
            current_time: 0.0,
            duration: 60.0,
            buffered_end: None,
            ready_state: ReadyState::HaveMetadata,
            reject_play: false,
            play_requests: 0,
            text_track: None,
            source: None,
            native_fullscreen_requests: 0,
        }
    }

    pub fn playing() -> Self {
        Self {
            paused: false,
            ..Self::new()
        }
    }
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for FakeMedia {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_plays_inline(&mut self, inline: bool) {
        self.plays_inline = inline;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn seek(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn buffered_end(&self) -> Option<f64> {
        self.buffered_end
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn play(&mut self) {
        self.play_requests += 1;
        if !self.reject_play {
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn text_track_mode(&self) -> Option<TextTrackMode> {
        self.text_track
    }

    fn set_text_track_mode(&mut self, mode: TextTrackMode) {
        if self.text_track.is_some() {
            self.text_track = Some(mode);
        }
    }

    fn set_source(&mut self, src: &str) {
        self.source = Some(src.to_string());
    }

    fn clear_source(&mut self) {
        self.source = None;
    }

    fn enter_native_fullscreen(&mut self) {
        self.native_fullscreen_requests += 1;
    }
}

/// Player wrapper recording everything rendered into it
#[derive(Debug, Clone, PartialEq)]
pub struct FakeSurface {
    pub media: FakeMedia,
    pub attached: bool,
    pub controls: HashSet<ControlSlot>,
    pub overlay: bool,
    pub active_marker: bool,
    pub aspect: Option<AspectRatio>,
    pub icons: HashMap<Icon, bool>,
    pub feedback: Vec<(FeedbackAction, Duration)>,
    pub progress: HashMap<ProgressBar, f64>,
    pub time_text: HashMap<TimeLabel, String>,
    pub track: Option<TrackBounds>,
    pub captured_pointer: Option<i32>,
    pub viewport: Viewport,
    pub fullscreen_support: FullscreenSupport,
    pub fullscreen: FullscreenTarget,
    pub fullscreen_requests: u32,
    pub fullscreen_exits: u32,
}

impl FakeSurface {
    /// Attached desktop wrapper with every control and no activation overlay
    pub fn new() -> Self {
        Self {
            media: FakeMedia::new(),
            attached: true,
            controls: [
                ControlSlot::Play,
                ControlSlot::Mute,
                ControlSlot::Restart,
                ControlSlot::Fullscreen,
                ControlSlot::Captions,
                ControlSlot::Progress,
            ]
            .into_iter()
            .collect(),
            overlay: false,
            active_marker: false,
            aspect: None,
            icons: HashMap::new(),
            feedback: Vec::new(),
            progress: HashMap::new(),
            time_text: HashMap::new(),
            track: Some(TrackBounds::new(0.0, 400.0)),
            captured_pointer: None,
            viewport: Viewport::Desktop,
            fullscreen_support: FullscreenSupport::Element,
            fullscreen: FullscreenTarget::None,
            fullscreen_requests: 0,
            fullscreen_exits: 0,
        }
    }

    pub fn with_overlay() -> Self {
        Self {
            overlay: true,
            ..Self::new()
        }
    }

    pub fn progress(&self, bar: ProgressBar) -> Option<f64> {
        self.progress.get(&bar).copied()
    }

    /// Last visibility written for `icon`
    pub fn icon(&self, icon: Icon) -> Option<bool> {
        self.icons.get(&icon).copied()
    }

    pub fn time_text(&self, label: TimeLabel) -> Option<&str> {
        self.time_text.get(&label).map(String::as_str)
    }
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerSurface for FakeSurface {
    type Media = FakeMedia;

    fn media(&self) -> &FakeMedia {
        &self.media
    }

    fn media_mut(&mut self) -> &mut FakeMedia {
        &mut self.media
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn has_control(&self, slot: ControlSlot) -> bool {
        self.controls.contains(&slot)
    }

    fn has_activation_overlay(&self) -> bool {
        self.overlay
    }

    fn remove_activation_overlay(&mut self) {
        self.overlay = false;
    }

    fn set_active_marker(&mut self, active: bool) {
        self.active_marker = active;
    }

    fn set_aspect_ratio(&mut self, aspect: AspectRatio) {
        self.aspect = Some(aspect);
    }

    fn clear_aspect_ratio(&mut self) {
        self.aspect = None;
    }

    fn set_icon_visible(&mut self, icon: Icon, visible: bool) {
        if self.controls.contains(&icon.slot()) {
            self.icons.insert(icon, visible);
        }
    }

    fn pulse_feedback(&mut self, action: FeedbackAction, hold: Duration) {
        self.feedback.push((action, hold));
    }

    fn set_progress(&mut self, bar: ProgressBar, fraction: f64) {
        if self.controls.contains(&ControlSlot::Progress) {
            self.progress.insert(bar, fraction);
        }
    }

    fn set_time_text(&mut self, label: TimeLabel, text: &str) {
        self.time_text.insert(label, text.to_string());
    }

    fn track_bounds(&self) -> Option<TrackBounds> {
        self.track
    }

    fn capture_pointer(&mut self, pointer_id: i32) {
        self.captured_pointer = Some(pointer_id);
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        if self.captured_pointer == Some(pointer_id) {
            self.captured_pointer = None;
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn fullscreen_support(&self) -> FullscreenSupport {
        self.fullscreen_support
    }

    fn fullscreen_target(&self) -> FullscreenTarget {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) {
        self.fullscreen_requests += 1;
        self.fullscreen = FullscreenTarget::ThisWrapper;
    }

    fn exit_fullscreen(&mut self) {
        self.fullscreen_exits += 1;
        self.fullscreen = FullscreenTarget::None;
    }
}

/// Observable state of a cloned player template
#[derive(Debug, Clone, PartialEq)]
pub struct MountState {
    pub source: Option<String>,
    pub poster: Option<String>,
    pub removed_controls: Vec<ControlSlot>,
    pub overlay: bool,
    pub muted: bool,
    pub playing: bool,
    pub ready_state: ReadyState,
    pub attached: bool,
}

/// Shared handle to a cloned template; clones see the same state
#[derive(Debug, Clone)]
pub struct FakeMount(Rc<RefCell<MountState>>);

impl FakeMount {
    /// Attached clone with an activation overlay and metadata loaded
    pub fn new() -> Self {
        Self::with_ready_state(ReadyState::HaveMetadata)
    }

    pub fn with_ready_state(ready_state: ReadyState) -> Self {
        Self(Rc::new(RefCell::new(MountState {
            source: None,
            poster: None,
            removed_controls: Vec::new(),
            overlay: true,
            muted: false,
            playing: false,
            ready_state,
            attached: true,
        })))
    }

    pub fn state(&self) -> Ref<'_, MountState> {
        self.0.borrow()
    }

    pub fn detach(&self) {
        self.0.borrow_mut().attached = false;
    }

    fn attach(&self) {
        self.0.borrow_mut().attached = true;
    }

    /// Surface for a controller mounted on this clone
    pub fn to_surface(&self) -> FakeSurface {
        let state = self.state();
        let mut surface = FakeSurface::new();
        surface.attached = state.attached;
        surface.overlay = state.overlay;
        for slot in &state.removed_controls {
            surface.controls.remove(slot);
        }
        surface.media.source = state.source.clone();
        surface.media.muted = state.muted;
        surface.media.paused = !state.playing;
        surface.media.ready_state = state.ready_state;
        surface
    }
}

impl Default for FakeMount {
    fn default() -> Self {
        Self::new()
    }
}

impl MountedClone for FakeMount {
    fn set_source(&mut self, src: &str) {
        self.0.borrow_mut().source = Some(src.to_string());
    }

    fn set_poster(&mut self, poster: &str) {
        self.0.borrow_mut().poster = Some(poster.to_string());
    }

    fn remove_control(&mut self, slot: ControlSlot) {
        let mut state = self.0.borrow_mut();
        if !state.removed_controls.contains(&slot) {
            state.removed_controls.push(slot);
        }
    }

    fn remove_activation_overlay(&mut self) {
        self.0.borrow_mut().overlay = false;
    }

    fn start_muted_playback(&mut self) {
        let mut state = self.0.borrow_mut();
        state.muted = true;
        state.playing = true;
    }

    fn ready_state(&self) -> ReadyState {
        self.0.borrow().ready_state
    }

    fn is_attached(&self) -> bool {
        self.0.borrow().attached
    }
}

/// One node of a [`FakeContent`] container
#[derive(Debug, Clone)]
pub enum FakeNode {
    Text(String),
    Placeholder(BTreeMap<String, String>),
    Player(FakeMount),
}

/// Content container made of flat text runs, placeholders and players
#[derive(Debug, Clone)]
pub struct FakeContent {
    nodes: Vec<(u32, FakeNode)>,
    next_id: u32,
    pub has_template: bool,
    /// Ready state reported by fresh template clones
    pub template_ready_state: ReadyState,
}

impl FakeContent {
    pub fn new(runs: &[&str]) -> Self {
        let mut content = Self {
            nodes: Vec::new(),
            next_id: 0,
            has_template: true,
            template_ready_state: ReadyState::HaveNothing,
        };
        for run in runs {
            let id = content.alloc();
            content.nodes.push((id, FakeNode::Text(run.to_string())));
        }
        content
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.nodes.iter().position(|(node_id, _)| *node_id == id)
    }

    fn node(&self, id: u32) -> Option<&FakeNode> {
        self.nodes.iter().find(|(node_id, _)| *node_id == id).map(|(_, n)| n)
    }

    /// Insert a placeholder node directly, as a server-rendered page would
    pub fn push_placeholder(&mut self, token: &Token) -> u32 {
        let id = self.alloc();
        let attrs = token
            .to_attributes()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.nodes.push((id, FakeNode::Placeholder(attrs)));
        id
    }

    /// Text runs joined with `|`
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|(_, node)| match node {
                FakeNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn placeholder_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n, FakeNode::Placeholder(_)))
            .count()
    }

    pub fn players(&self) -> Vec<FakeMount> {
        self.nodes
            .iter()
            .filter_map(|(_, node)| match node {
                FakeNode::Player(mount) => Some(mount.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drop every player from the container
    pub fn clear_players(&mut self) {
        self.nodes.retain(|(_, node)| match node {
            FakeNode::Player(mount) => {
                mount.detach();
                false
            }
            _ => true,
        });
    }
}

impl PipelineHost for FakeContent {
    type TextRun = u32;
    type Placeholder = u32;
    type Mount = FakeMount;

    fn text_runs(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n, FakeNode::Text(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn run_text(&self, run: &u32) -> String {
        match self.node(*run) {
            Some(FakeNode::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    fn replace_run(&mut self, run: &u32, segments: &[Segment<'_>]) -> Result<()> {
        let index = self
            .position(*run)
            .ok_or_else(|| Error::Template(format!("text run {run} is gone")))?;

        let mut replacement = Vec::with_capacity(segments.len());
        for segment in segments {
            let id = self.alloc();
            let node = match segment {
                Segment::Text(text) => FakeNode::Text(text.to_string()),
                Segment::Token(token) => FakeNode::Placeholder(
                    token
                        .to_attributes()
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                ),
            };
            replacement.push((id, node));
        }

        self.nodes.splice(index..=index, replacement);
        Ok(())
    }

    fn placeholders(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n, FakeNode::Placeholder(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn placeholder_token(&self, placeholder: &u32) -> Option<Token> {
        match self.node(*placeholder) {
            Some(FakeNode::Placeholder(attrs)) => Token::from_attributes(|k| attrs.get(k).cloned()),
            _ => None,
        }
    }

    fn is_consumed(&self, placeholder: &u32) -> bool {
        match self.node(*placeholder) {
            Some(FakeNode::Placeholder(attrs)) => {
                attrs.get(STATE_ATTR).map(String::as_str) == Some(STATE_MOUNTED)
            }
            _ => true,
        }
    }

    fn mark_consumed(&mut self, placeholder: &u32) {
        if let Some((_, FakeNode::Placeholder(attrs))) =
            self.nodes.iter_mut().find(|(id, _)| id == placeholder)
        {
            attrs.insert(STATE_ATTR.to_string(), STATE_MOUNTED.to_string());
        }
    }

    fn clone_template(&self) -> Option<FakeMount> {
        if !self.has_template {
            return None;
        }
        let mount = FakeMount::with_ready_state(self.template_ready_state);
        mount.detach();
        Some(mount)
    }

    fn splice(&mut self, placeholder: &u32, mount: &FakeMount) -> Result<()> {
        let index = self
            .position(*placeholder)
            .ok_or_else(|| Error::Template(format!("placeholder {placeholder} is gone")))?;
        mount.attach();
        self.nodes[index].1 = FakeNode::Player(mount.clone());
        Ok(())
    }
}
