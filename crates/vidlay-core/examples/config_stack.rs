//! Configuration layering example
//!
//! Shows how page defaults, caller options and token attributes combine.
//!
//! Run with: cargo run -p vidlay-core --example config_stack

use vidlay_core::{find_tokens, resolve, ConfigOverride, Viewport};

fn main() {
    println!("Vidlay Core - Configuration Example");
    println!("===================================\n");

    let global = ConfigOverride::from_json(
        r#"{
            "loop": true,
            "aspectInitial": "16:7",
            "aspectInitialMobile": "9:10",
            "clickToPlay": { "aspectActive": "16:9" }
        }"#,
    )
    .expect("valid JSON");
    let caller = ConfigOverride::from_json(r#"{ "muted": false }"#).expect("valid JSON");

    let content = r#"
        <p>Hero: [[video src="/media/hero.mp4"]]</p>
        <p>Ambient: [[video src="/media/loop.mp4" autoplay="true"]]</p>
        <p>Silent: [[video src="/media/silent.mp4" sound="false"]]</p>
    "#;

    for token in find_tokens(content) {
        let config = resolve(&global, &caller, Some(&token.overrides()));

        println!("{}", token.src);
        println!("  autoplay:       {}", config.autoplay);
        println!("  muted:          {}", config.muted);
        println!("  sound enabled:  {}", config.sound_enabled);
        println!("  click-to-play:  {:?}", config.click_to_play);
        for viewport in [Viewport::Desktop, Viewport::Mobile] {
            let before = config.aspect_for(viewport, false);
            let after = config.aspect_for(viewport, true);
            println!(
                "  {:?} aspect:  {} -> {}",
                viewport,
                before.map(|a| a.to_string()).unwrap_or_else(|| "auto".into()),
                after.map(|a| a.to_string()).unwrap_or_else(|| "auto".into()),
            );
        }
        println!();
    }
}
