//! Terminal and JSON output for user-facing events.
//!
//! Every message goes through [`emit`] with a dotted event code, so the same
//! call prints colored text for people or one JSON object per line for
//! scripts.

use colored::*;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Error | Level::Warn | Level::Debug)
    }
}

#[derive(Debug, Clone, Copy)]
struct Renderer {
    format: OutputFormat,
    color: bool,
}

static RENDERER: LazyLock<RwLock<Renderer>> = LazyLock::new(|| {
    RwLock::new(Renderer {
        format: OutputFormat::Text,
        color: true,
    })
});

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

fn renderer() -> Renderer {
    // A poisoned lock still holds a usable copy.
    match RENDERER.read() {
        Ok(r) => *r,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

pub const SEPARATOR_LIGHT: &str = "─";
pub const SEPARATOR_HEAVY: &str = "━";

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

/// Removes CSI escape sequences (`ESC [ ... final`).
fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn format_event(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) -> String {
    let r = renderer();
    match r.format {
        OutputFormat::Text => colorize(level, message, r.color),
        OutputFormat::Json => {
            let clean = strip_ansi(message);
            let event = Event {
                level: level.as_str(),
                code,
                message: &clean,
                data,
            };
            serde_json::to_string(&event).unwrap_or_else(|_| clean.clone())
        }
    }
}

pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    let line = format_event(level, code, message, data);
    if level.to_stderr() {
        let _ = writeln!(io::stderr(), "{line}");
    } else {
        let _ = writeln!(io::stdout(), "{line}");
    }
}

pub fn get_output_format() -> OutputFormat {
    renderer().format
}

/// Prints a full-width rule. Skipped in JSON mode so output stays parseable.
pub fn separator(light: bool) {
    let r = renderer();
    if matches!(r.format, OutputFormat::Json) {
        return;
    }
    let glyph = if light {
        SEPARATOR_LIGHT
    } else {
        SEPARATOR_HEAVY
    };
    let line = glyph.repeat(80);
    let line = if r.color {
        line.dimmed().to_string()
    } else {
        line
    };
    let _ = writeln!(io::stdout(), "{line}");
}

pub mod prelude {
    pub use super::{Level, OutputFormat, emit, get_output_format, is_debug_enabled, separator};
}
