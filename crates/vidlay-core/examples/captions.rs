//! Subtitle conversion example
//!
//! Run with: cargo run -p vidlay-core --example captions

use vidlay_core::{srt_to_vtt, SubtitleSource, TrackAttributes};

fn main() {
    println!("Vidlay Core - Subtitle Example");
    println!("==============================\n");

    for url in ["/subs/intro.vtt", "/subs/intro.SRT?v=3", "/subs/intro.ass"] {
        println!("{url:<24} -> {:?}", SubtitleSource::classify(url));
    }
    println!();

    let srt = "1\r\n00:00:00,000 --> 00:00:03,000\r\nWelcome!\r\n\r\n2\r\n00:00:03,500 --> 00:00:07,000\r\nThis clip has captions.\r\n";
    let track = TrackAttributes::default();

    println!("Track: kind={} label={} srclang={}", track.kind, track.label, track.srclang);
    println!("-----");
    print!("{}", srt_to_vtt(srt));
}
