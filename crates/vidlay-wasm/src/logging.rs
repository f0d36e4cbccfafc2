//! Console sink for `tracing`
//!
//! Each formatted event is buffered and written to the browser console on
//! drop, at the console method matching the event level.

use std::cell::RefCell;
use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};
use wasm_bindgen::JsValue;

/// One formatted event on its way to the console
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buffer);
        let line = JsValue::from_str(text.trim_end());
        match self.level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

thread_local! {
    static LEVEL: RefCell<Option<reload::Handle<LevelFilter, Registry>>> = const { RefCell::new(None) };
}

/// Install the console subscriber. Later calls are ignored.
pub fn install(max_level: Level) {
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(max_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_ansi(false)
        .with_target(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        LEVEL.with(|slot| *slot.borrow_mut() = Some(handle));
    }
}

/// Change the maximum level of the installed subscriber
pub fn set_level(level: Level) -> bool {
    LEVEL.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|handle| handle.reload(LevelFilter::from_level(level)).is_ok())
    })
}

/// Parse a level name coming from JavaScript
pub fn parse_level(name: &str) -> Option<Level> {
    name.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_set_level_before_install() {
        assert!(!set_level(Level::DEBUG));
    }
}
