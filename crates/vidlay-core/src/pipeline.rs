//! Rich-Text Token Pipeline
//!
//! Expands inline video tokens in a content container into live players:
//!
//! 1. Text runs containing tokens are split; each token becomes a
//!    placeholder element carrying the token's attributes as data.
//! 2. Each unconsumed placeholder is marked consumed, the player template
//!    is cloned, source and poster are wired, and the clone replaces the
//!    placeholder.
//! 3. `sound="false"` removes the mute control from the clone.
//! 4. `autoplay="true"` removes the activation overlay and starts muted
//!    playback right away.
//! 5. The host constructs the controller immediately when the clone already
//!    has metadata, otherwise on its first `loadedmetadata`.
//!
//! Poster generation and controller construction are left to the host
//! since both depend on its event loop; this module decides what to do.

use crate::config::{resolve, ConfigOverride, PlayerConfig};
use crate::error::Result;
use crate::poster::PosterPlan;
use crate::token::{contains_token, split_tokens, Segment, Token};
use crate::types::{ControlSlot, ReadyState};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A freshly cloned player template
pub trait MountedClone {
    fn set_source(&mut self, src: &str);

    fn set_poster(&mut self, poster: &str);

    fn remove_control(&mut self, slot: ControlSlot);

    fn remove_activation_overlay(&mut self);

    /// Mute and start playback directly on the clone's media element
    fn start_muted_playback(&mut self);

    fn ready_state(&self) -> ReadyState;

    fn is_attached(&self) -> bool;
}

/// The content container and template the pipeline works against
pub trait PipelineHost {
    /// Handle to one run of text inside the container
    type TextRun;
    /// Handle to one placeholder element
    type Placeholder;
    type Mount: MountedClone;

    fn text_runs(&self) -> Vec<Self::TextRun>;

    fn run_text(&self, run: &Self::TextRun) -> String;

    /// Replace a text run by the given text and placeholder segments
    fn replace_run(&mut self, run: &Self::TextRun, segments: &[Segment<'_>]) -> Result<()>;

    fn placeholders(&self) -> Vec<Self::Placeholder>;

    fn placeholder_token(&self, placeholder: &Self::Placeholder) -> Option<Token>;

    fn is_consumed(&self, placeholder: &Self::Placeholder) -> bool;

    fn mark_consumed(&mut self, placeholder: &Self::Placeholder);

    /// Deep clone of the player template, if the page has one
    fn clone_template(&self) -> Option<Self::Mount>;

    /// Put `mount` where `placeholder` is
    fn splice(&mut self, placeholder: &Self::Placeholder, mount: &Self::Mount) -> Result<()>;
}

/// When the host should construct the controller for a clone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitTiming {
    Immediate,
    OnLoadedMetadata,
}

impl InitTiming {
    pub fn for_ready_state(state: ReadyState) -> Self {
        if state.has_metadata() {
            InitTiming::Immediate
        } else {
            InitTiming::OnLoadedMetadata
        }
    }
}

/// A clone in the document, waiting for its controller
#[derive(Debug)]
pub struct PreparedMount<M> {
    pub token: Token,
    pub mount: M,
    pub config: PlayerConfig,
    pub poster: PosterPlan,
    pub init: InitTiming,
    /// The gate was removed here; mount with [`PlayerController::mount_activated`]
    ///
    /// [`PlayerController::mount_activated`]: crate::PlayerController::mount_activated
    pub activated: bool,
}

/// Counters for one pipeline run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    /// Tokens turned into placeholders
    pub tokens_found: usize,
    /// Placeholders replaced by player clones
    pub mounted: usize,
    /// Placeholders already consumed by an earlier run
    pub skipped: usize,
    pub failed: usize,
}

/// Result of a pipeline run
#[derive(Debug)]
pub struct Expansion<M> {
    pub report: ExpansionReport,
    pub mounts: Vec<PreparedMount<M>>,
}

/// Expands tokens using one set of configuration defaults
#[derive(Debug, Clone, Default)]
pub struct TokenPipeline {
    global: ConfigOverride,
    caller: ConfigOverride,
}

impl TokenPipeline {
    /// Pipeline with page-wide defaults
    pub fn new(global: ConfigOverride) -> Self {
        Self {
            global,
            caller: ConfigOverride::default(),
        }
    }

    /// Add a caller layer between the page defaults and token attributes
    pub fn with_caller(mut self, caller: ConfigOverride) -> Self {
        self.caller = caller;
        self
    }

    /// Resolved configuration for one token
    pub fn config_for(&self, token: &Token) -> PlayerConfig {
        resolve(&self.global, &self.caller, Some(&token.overrides()))
    }

    /// Run both stages over `host`
    pub fn expand<H: PipelineHost>(&self, host: &mut H) -> Expansion<H::Mount> {
        let tokens_found = self.insert_placeholders(host);
        let mut expansion = self.prepare_mounts(host);
        expansion.report.tokens_found = tokens_found;

        info!(
            tokens = expansion.report.tokens_found,
            mounted = expansion.report.mounted,
            skipped = expansion.report.skipped,
            failed = expansion.report.failed,
            "Rich-text expansion finished"
        );
        expansion
    }

    /// Stage one: replace tokens in text runs by placeholders
    pub fn insert_placeholders<H: PipelineHost>(&self, host: &mut H) -> usize {
        let mut found = 0;

        for run in host.text_runs() {
            let text = host.run_text(&run);
            if !contains_token(&text) {
                continue;
            }

            let segments = split_tokens(&text);
            let tokens = segments
                .iter()
                .filter(|s| matches!(s, Segment::Token(_)))
                .count();

            match host.replace_run(&run, &segments) {
                Ok(()) => found += tokens,
                Err(e) => warn!(error = %e, "Could not insert video placeholders"),
            }
        }

        debug!(found, "Placeholders inserted");
        found
    }

    /// Stage two: clone the template for every unconsumed placeholder
    pub fn prepare_mounts<H: PipelineHost>(&self, host: &mut H) -> Expansion<H::Mount> {
        let mut report = ExpansionReport::default();
        let mut mounts = Vec::new();

        for placeholder in host.placeholders() {
            if host.is_consumed(&placeholder) {
                report.skipped += 1;
                continue;
            }
            host.mark_consumed(&placeholder);

            let Some(token) = host.placeholder_token(&placeholder) else {
                warn!("Video placeholder without a source");
                report.failed += 1;
                continue;
            };

            let Some(mut mount) = host.clone_template() else {
                warn!(src = %token.src, "No player template on the page");
                report.failed += 1;
                continue;
            };

            let config = self.config_for(&token);
            let poster = PosterPlan::for_token(&token);

            mount.set_source(&token.src);
            if let PosterPlan::Explicit(url) = &poster {
                mount.set_poster(url);
            }
            if !config.sound_enabled {
                mount.remove_control(ControlSlot::Mute);
            }

            if let Err(e) = host.splice(&placeholder, &mount) {
                warn!(src = %token.src, error = %e, "Could not splice player");
                report.failed += 1;
                continue;
            }

            let activated = token.autoplays();
            if activated {
                mount.remove_activation_overlay();
                mount.start_muted_playback();
            }

            let init = InitTiming::for_ready_state(mount.ready_state());
            debug!(src = %token.src, ?init, ?poster, "Player clone spliced");

            report.mounted += 1;
            mounts.push(PreparedMount {
                token,
                mount,
                config,
                poster,
                init,
                activated,
            });
        }

        Expansion { report, mounts }
    }
}
