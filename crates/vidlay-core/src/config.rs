//! Configuration Resolver
//!
//! Layers built-in defaults, a page-wide default override, a caller override
//! and (for rich-text instances) token attributes into one [`PlayerConfig`].
//! Later layers win per key; a key missing from a layer falls through to the
//! layer below. Resolution never fails: unparseable aspect ratios are logged
//! and dropped.

use crate::types::{AspectRatio, Viewport};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Click-to-play behavior after resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickToPlay {
    Disabled,
    Simple,
    /// Enabled, and the wrapper switches aspect ratio once activated
    WithAspectOverride {
        aspect_active: Option<AspectRatio>,
        aspect_active_mobile: Option<AspectRatio>,
    },
}

impl ClickToPlay {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ClickToPlay::Disabled)
    }

    /// Post-activation aspect for the given breakpoint, if overridden
    pub fn active_aspect(&self, viewport: Viewport) -> Option<AspectRatio> {
        match self {
            ClickToPlay::WithAspectOverride {
                aspect_active,
                aspect_active_mobile,
            } => match viewport {
                Viewport::Desktop => *aspect_active,
                Viewport::Mobile => *aspect_active_mobile,
            },
            _ => None,
        }
    }
}

/// Raw `clickToPlay` value: a toggle or an object carrying aspect overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClickToPlaySetting {
    Toggle(bool),
    Aspects(ClickToPlayAspects),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickToPlayAspects {
    pub aspect_active: Option<String>,
    pub aspect_active_mobile: Option<String>,
}

/// One configuration layer as written by page authors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looping: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoresume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_to_play: Option<ClickToPlaySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_initial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_initial_mobile: Option<String>,
}

impl ConfigOverride {
    /// Parse a layer from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlay `other` on top of `self`, key by key
    pub fn merge(&mut self, other: &ConfigOverride) {
        self.autoplay = other.autoplay.or(self.autoplay);
        self.looping = other.looping.or(self.looping);
        self.muted = other.muted.or(self.muted);
        self.autoresume = other.autoresume.or(self.autoresume);
        if other.click_to_play.is_some() {
            self.click_to_play = other.click_to_play.clone();
        }
        if other.aspect_initial.is_some() {
            self.aspect_initial = other.aspect_initial.clone();
        }
        if other.aspect_initial_mobile.is_some() {
            self.aspect_initial_mobile = other.aspect_initial_mobile.clone();
        }
    }
}

/// Overrides carried by an inline video token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOverride {
    pub autoplay: Option<bool>,
    pub sound: Option<bool>,
}

/// Resolved, immutable player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub autoplay: bool,
    pub looping: bool,
    pub muted: bool,
    pub autoresume: bool,
    pub click_to_play: ClickToPlay,
    pub aspect_initial: Option<AspectRatio>,
    pub aspect_initial_mobile: Option<AspectRatio>,
    /// False when sound is permanently unavailable (`sound="false"` tokens)
    pub sound_enabled: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            looping: false,
            muted: true,
            autoresume: true,
            click_to_play: ClickToPlay::Simple,
            aspect_initial: None,
            aspect_initial_mobile: None,
            sound_enabled: true,
        }
    }
}

impl PlayerConfig {
    /// Apply one override layer on top of the built-in defaults
    pub fn from_override(layer: &ConfigOverride) -> Self {
        let defaults = Self::default();

        let click_to_play = match &layer.click_to_play {
            None => defaults.click_to_play,
            Some(ClickToPlaySetting::Toggle(true)) => ClickToPlay::Simple,
            Some(ClickToPlaySetting::Toggle(false)) => ClickToPlay::Disabled,
            Some(ClickToPlaySetting::Aspects(aspects)) => ClickToPlay::WithAspectOverride {
                aspect_active: parse_aspect("clickToPlay.aspectActive", &aspects.aspect_active),
                aspect_active_mobile: parse_aspect(
                    "clickToPlay.aspectActiveMobile",
                    &aspects.aspect_active_mobile,
                ),
            },
        };

        Self {
            autoplay: layer.autoplay.unwrap_or(defaults.autoplay),
            looping: layer.looping.unwrap_or(defaults.looping),
            muted: layer.muted.unwrap_or(defaults.muted),
            autoresume: layer.autoresume.unwrap_or(defaults.autoresume),
            click_to_play,
            aspect_initial: parse_aspect("aspectInitial", &layer.aspect_initial),
            aspect_initial_mobile: parse_aspect(
                "aspectInitialMobile",
                &layer.aspect_initial_mobile,
            ),
            sound_enabled: defaults.sound_enabled,
        }
    }

    /// Apply token attributes; these always win over every other layer
    pub fn apply_token(&mut self, token: &TokenOverride) {
        if let Some(autoplay) = token.autoplay {
            self.autoplay = autoplay;
            if autoplay {
                // Browsers only allow autoplay without sound
                self.muted = true;
                self.click_to_play = ClickToPlay::Disabled;
            }
        }

        if token.sound == Some(false) {
            self.muted = true;
            self.sound_enabled = false;
            self.click_to_play = ClickToPlay::Disabled;
        }
    }

    /// Aspect ratio for the breakpoint and activation state, if any applies
    pub fn aspect_for(&self, viewport: Viewport, activated: bool) -> Option<AspectRatio> {
        let initial = match viewport {
            Viewport::Desktop => self.aspect_initial,
            Viewport::Mobile => self.aspect_initial_mobile,
        };

        if activated {
            self.click_to_play.active_aspect(viewport).or(initial)
        } else {
            initial
        }
    }
}

/// Resolve `global < caller < token` into one configuration
pub fn resolve(
    global: &ConfigOverride,
    caller: &ConfigOverride,
    token: Option<&TokenOverride>,
) -> PlayerConfig {
    let mut layer = global.clone();
    layer.merge(caller);

    let mut config = PlayerConfig::from_override(&layer);
    if let Some(token) = token {
        config.apply_token(token);
    }
    config
}

fn parse_aspect(key: &str, value: &Option<String>) -> Option<AspectRatio> {
    let raw = value.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(aspect) => Some(aspect),
        Err(e) => {
            warn!(key, value = raw, error = %e, "Ignoring aspect ratio");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero_layer() -> ConfigOverride {
        ConfigOverride {
            autoplay: Some(true),
            muted: Some(true),
            looping: Some(true),
            aspect_initial: Some("16:7".into()),
            aspect_initial_mobile: Some("9:10".into()),
            click_to_play: Some(ClickToPlaySetting::Aspects(ClickToPlayAspects {
                aspect_active: Some("16:9".into()),
                aspect_active_mobile: None,
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&ConfigOverride::default(), &ConfigOverride::default(), None);
        assert_eq!(config, PlayerConfig::default());
        assert!(config.muted);
        assert!(config.autoresume);
        assert!(config.click_to_play.is_enabled());
        assert!(config.sound_enabled);
    }

    #[test]
    fn test_merge_order() {
        let global = ConfigOverride {
            autoplay: Some(true),
            looping: Some(true),
            muted: Some(false),
            ..Default::default()
        };
        let caller = ConfigOverride {
            autoplay: Some(false),
            ..Default::default()
        };

        let config = resolve(&global, &caller, None);
        assert!(!config.autoplay);
        assert!(config.looping);
        assert!(!config.muted);
    }

    #[test]
    fn test_click_to_play_variants() {
        let toggle = |v| ConfigOverride {
            click_to_play: Some(ClickToPlaySetting::Toggle(v)),
            ..Default::default()
        };
        assert_eq!(PlayerConfig::from_override(&toggle(true)).click_to_play, ClickToPlay::Simple);
        assert_eq!(PlayerConfig::from_override(&toggle(false)).click_to_play, ClickToPlay::Disabled);

        let config = PlayerConfig::from_override(&hero_layer());
        assert!(config.click_to_play.is_enabled());
        assert_eq!(
            config.click_to_play.active_aspect(Viewport::Desktop),
            Some(AspectRatio::new(16.0, 9.0).unwrap())
        );
        assert_eq!(config.click_to_play.active_aspect(Viewport::Mobile), None);
    }

    #[test]
    fn test_aspect_selection() {
        let config = PlayerConfig::from_override(&hero_layer());

        let desktop_before = config.aspect_for(Viewport::Desktop, false).unwrap();
        assert!((desktop_before.ratio() - 16.0 / 7.0).abs() < 1e-9);

        let desktop_after = config.aspect_for(Viewport::Desktop, true).unwrap();
        assert!((desktop_after.ratio() - 16.0 / 9.0).abs() < 1e-9);

        let mobile_before = config.aspect_for(Viewport::Mobile, false).unwrap();
        assert!((mobile_before.ratio() - 9.0 / 10.0).abs() < 1e-9);

        // No mobile override: falls back to the initial mobile aspect
        let mobile_after = config.aspect_for(Viewport::Mobile, true).unwrap();
        assert!((mobile_after.ratio() - 9.0 / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_aspect_leaves_layout_alone() {
        let config = PlayerConfig::default();
        assert_eq!(config.aspect_for(Viewport::Desktop, false), None);
        assert_eq!(config.aspect_for(Viewport::Mobile, true), None);
    }

    #[test]
    fn test_invalid_aspect_is_dropped() {
        let layer = ConfigOverride {
            aspect_initial: Some("wide".into()),
            ..Default::default()
        };
        assert_eq!(PlayerConfig::from_override(&layer).aspect_initial, None);
    }

    #[test]
    fn test_token_autoplay_wins() {
        let global = ConfigOverride {
            autoplay: Some(false),
            muted: Some(false),
            ..Default::default()
        };
        let token = TokenOverride {
            autoplay: Some(true),
            sound: None,
        };

        let config = resolve(&global, &ConfigOverride::default(), Some(&token));
        assert!(config.autoplay);
        assert!(config.muted);
        assert_eq!(config.click_to_play, ClickToPlay::Disabled);
    }

    #[test]
    fn test_token_sound_false_forces_mute() {
        let global = ConfigOverride {
            muted: Some(false),
            click_to_play: Some(ClickToPlaySetting::Toggle(true)),
            ..Default::default()
        };
        let token = TokenOverride {
            autoplay: None,
            sound: Some(false),
        };

        let config = resolve(&global, &ConfigOverride::default(), Some(&token));
        assert!(config.muted);
        assert!(!config.sound_enabled);
        assert!(!config.click_to_play.is_enabled());
    }

    #[test]
    fn test_token_sound_true_is_advisory() {
        let token = TokenOverride {
            autoplay: None,
            sound: Some(true),
        };
        let config = resolve(&ConfigOverride::default(), &ConfigOverride::default(), Some(&token));
        // Default muted=true is not overridden
        assert!(config.muted);
        assert!(config.sound_enabled);
    }

    #[test]
    fn test_json_layer() {
        let layer = ConfigOverride::from_json(
            r#"{
                "autoplay": true,
                "loop": true,
                "clickToPlay": { "aspectActive": "16:9", "aspectActiveMobile": "16:9" },
                "aspectInitial": "16:7",
                "aspectInitialMobile": null,
                "somethingElse": 3
            }"#,
        )
        .unwrap();

        assert_eq!(layer.autoplay, Some(true));
        assert_eq!(layer.looping, Some(true));
        assert_eq!(layer.aspect_initial_mobile, None);
        assert!(matches!(layer.click_to_play, Some(ClickToPlaySetting::Aspects(_))));

        let bare = ConfigOverride::from_json(r#"{ "clickToPlay": false }"#).unwrap();
        assert_eq!(bare.click_to_play, Some(ClickToPlaySetting::Toggle(false)));
    }
}
