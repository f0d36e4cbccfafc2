//! CLI command implementations

use anyhow::Context;
use console::style;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::Tabled;
use tracing::debug;
use vidlay_core::{
    find_tokens, resolve as resolve_config, srt_to_vtt, ClickToPlay, ConfigOverride, PlayerConfig,
    Token, Viewport,
};

use crate::output::{flag, to_json, to_table, OutputFormat};

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "#")]
    index: usize,
    src: String,
    poster: String,
    autoplay: String,
    sound: String,
}

impl TokenRow {
    fn new(index: usize, token: &Token) -> Self {
        Self {
            index,
            src: token.src.clone(),
            poster: token.poster.clone().unwrap_or_else(|| "(first frame)".into()),
            autoplay: flag(token.autoplay),
            sound: flag(token.sound),
        }
    }
}

/// List tokens found in a content file
pub fn tokens(path: &Path, format: &str) -> anyhow::Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let found = find_tokens(&content);
    debug!(path = %path.display(), tokens = found.len(), "Scanned content");

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&found)?),
        OutputFormat::Table => {
            let rows = found.iter().enumerate().map(|(i, t)| TokenRow::new(i + 1, t));
            println!("{}", to_table(rows));
        }
        OutputFormat::Text => {
            println!("{} {}", style("Tokens in").bold(), path.display());
            if found.is_empty() {
                println!("  (none)");
            }
            for (i, token) in found.iter().enumerate() {
                let row = TokenRow::new(i + 1, token);
                println!(
                    "  {}. {}  poster={} autoplay={} sound={}",
                    row.index, row.src, row.poster, row.autoplay, row.sound
                );
            }
        }
    }

    Ok(())
}

/// Inputs of the `resolve` command
pub struct ResolveRequest {
    pub global: Option<String>,
    pub caller: Option<String>,
    pub token: Option<String>,
    pub mobile: bool,
    pub activated: bool,
}

#[derive(Serialize)]
struct Resolved {
    config: PlayerConfig,
    viewport: &'static str,
    activated: bool,
    aspect: Option<String>,
}

#[derive(Tabled)]
struct SettingRow {
    setting: &'static str,
    value: String,
}

/// Read a configuration layer from a file path or inline JSON
fn load_layer(arg: Option<&str>) -> anyhow::Result<ConfigOverride> {
    let Some(arg) = arg else {
        return Ok(ConfigOverride::default());
    };

    let path = Path::new(arg);
    let json = if path.is_file() {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        arg.to_string()
    };
    ConfigOverride::from_json(&json).with_context(|| format!("parsing configuration {arg}"))
}

fn parse_token(raw: &str) -> anyhow::Result<Token> {
    find_tokens(raw)
        .into_iter()
        .next()
        .with_context(|| format!("no video token in {raw:?}"))
}

fn click_to_play_label(click: &ClickToPlay) -> String {
    match click {
        ClickToPlay::Disabled => "disabled".into(),
        ClickToPlay::Simple => "enabled".into(),
        ClickToPlay::WithAspectOverride {
            aspect_active,
            aspect_active_mobile,
        } => format!(
            "enabled (active {} / mobile {})",
            aspect_active.map_or_else(|| "-".into(), |a| a.to_string()),
            aspect_active_mobile.map_or_else(|| "-".into(), |a| a.to_string()),
        ),
    }
}

fn setting_rows(resolved: &Resolved) -> Vec<SettingRow> {
    let config = &resolved.config;
    let aspect = |a: Option<vidlay_core::AspectRatio>| a.map_or_else(|| "-".into(), |a| a.to_string());
    vec![
        SettingRow { setting: "autoplay", value: config.autoplay.to_string() },
        SettingRow { setting: "loop", value: config.looping.to_string() },
        SettingRow { setting: "muted", value: config.muted.to_string() },
        SettingRow { setting: "autoresume", value: config.autoresume.to_string() },
        SettingRow { setting: "clickToPlay", value: click_to_play_label(&config.click_to_play) },
        SettingRow { setting: "aspectInitial", value: aspect(config.aspect_initial) },
        SettingRow { setting: "aspectInitialMobile", value: aspect(config.aspect_initial_mobile) },
        SettingRow { setting: "soundEnabled", value: config.sound_enabled.to_string() },
        SettingRow {
            setting: "aspect",
            value: resolved.aspect.clone().unwrap_or_else(|| "-".into()),
        },
    ]
}

/// Resolve a configuration from its layers and print it
pub fn resolve(request: &ResolveRequest, format: &str) -> anyhow::Result<()> {
    let global = load_layer(request.global.as_deref())?;
    let caller = load_layer(request.caller.as_deref())?;
    let token = request.token.as_deref().map(parse_token).transpose()?;

    let config = resolve_config(&global, &caller, token.as_ref().map(|t| t.overrides()).as_ref());
    let viewport = if request.mobile { Viewport::Mobile } else { Viewport::Desktop };
    let resolved = Resolved {
        aspect: config
            .aspect_for(viewport, request.activated)
            .map(|a| a.css_value()),
        config,
        viewport: if request.mobile { "mobile" } else { "desktop" },
        activated: request.activated,
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&resolved)?),
        OutputFormat::Table => println!("{}", to_table(setting_rows(&resolved))),
        OutputFormat::Text => {
            println!(
                "{} ({}, {})",
                style("Resolved configuration").bold(),
                resolved.viewport,
                if resolved.activated { "activated" } else { "dormant" }
            );
            for row in setting_rows(&resolved) {
                println!("  {:<20} {}", row.setting, row.value);
            }
        }
    }

    Ok(())
}

/// Convert an SRT file to WebVTT
pub fn srt2vtt(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let srt = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let vtt = srt_to_vtt(&srt);

    match output {
        Some(path) => {
            fs::write(path, &vtt).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} {}", style("Wrote").green(), path.display());
        }
        None => print!("{vtt}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_layer_inline_json() {
        let layer = load_layer(Some(r#"{"muted": false, "loop": true}"#)).unwrap();
        assert_eq!(layer.muted, Some(false));
        assert_eq!(layer.looping, Some(true));
    }

    #[test]
    fn test_load_layer_missing_is_empty() {
        assert_eq!(load_layer(None).unwrap(), ConfigOverride::default());
    }

    #[test]
    fn test_load_layer_rejects_garbage() {
        assert!(load_layer(Some("{not json")).is_err());
    }

    #[test]
    fn test_parse_token() {
        let token = parse_token(r#"[[video src="a.mp4" sound="false"]]"#).unwrap();
        assert_eq!(token.src, "a.mp4");
        assert!(token.sound_suppressed());
        assert!(parse_token("plain text").is_err());
    }

    #[test]
    fn test_setting_rows_reflect_sound_suppression() {
        let token = parse_token(r#"[[video src="a.mp4" sound="false"]]"#).unwrap();
        let config = resolve_config(
            &ConfigOverride::default(),
            &ConfigOverride::default(),
            Some(&token.overrides()),
        );
        let resolved = Resolved {
            config,
            viewport: "desktop",
            activated: false,
            aspect: None,
        };
        let rows = setting_rows(&resolved);
        let value = |name: &str| rows.iter().find(|r| r.setting == name).map(|r| r.value.clone());
        assert_eq!(value("muted").as_deref(), Some("true"));
        assert_eq!(value("soundEnabled").as_deref(), Some("false"));
        assert_eq!(value("clickToPlay").as_deref(), Some("disabled"));
    }
}
