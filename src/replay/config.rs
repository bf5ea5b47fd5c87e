use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::ass::{AssHeader, CueLayout};
use super::error::ReplayError;
use super::snips::{Snip, SnipTable, TimeOffsetMapper};
use super::timecode::Timecode;
use super::wrap::{CONTINUATION_INDENT_WIDTH, WidthMode};

pub const CONFIG_FILE_NAME: &str = "chatsubs.toml";

/// An sRGB color as written in the config (`#RRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Inline primary-color override. ASS stores colors as BGR.
    pub fn ass_tag(&self) -> String {
        format!("{{\\c&H{:02X}{:02X}{:02X}&}}", self.b, self.g, self.r)
    }
}

impl FromStr for Rgb {
    type Err = ReplayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ReplayError::InvalidColor(value.to_string());
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Display-name remapping and per-author colors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorTable {
    names: HashMap<String, String>,
    colors: HashMap<String, Rgb>,
}

impl AuthorTable {
    pub fn display_name<'a>(&'a self, author: &'a str) -> &'a str {
        self.names.get(author).map(String::as_str).unwrap_or(author)
    }

    pub fn color_tag(&self, display_name: &str) -> Result<String, ReplayError> {
        self.colors
            .get(display_name)
            .map(Rgb::ass_tag)
            .ok_or_else(|| ReplayError::MissingColor(display_name.to_string()))
    }

    pub fn insert_name(&mut self, author: impl Into<String>, display_name: impl Into<String>) {
        self.names.insert(author.into(), display_name.into());
    }

    pub fn insert_color(&mut self, display_name: impl Into<String>, color: Rgb) {
        self.colors.insert(display_name.into(), color);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 170, y: 15 }
    }
}

/// Settings for the built-in ASS header, used when no header file is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub font_name: String,
    pub font_size: u32,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            play_res_x: 1920,
            play_res_y: 1080,
            font_name: "Arial".to_string(),
            font_size: 28,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Subtracted from every chat timestamp to land on video time
    pub chat_offset: Timecode,
    /// End time of the final window
    pub closing_time: Option<Timecode>,
    pub screen_height: usize,
    pub max_line_width: usize,
    pub position: Position,
    pub style: String,
    pub fade_in_ms: u32,
    pub width_mode: WidthMode,
    /// Removed segments, each in the timeline left by the previous cuts
    pub snips: Vec<[Timecode; 2]>,
    pub palette: BTreeMap<String, String>,
    pub names: BTreeMap<String, String>,
    /// Display name to `#RRGGBB` or a palette entry
    pub colors: BTreeMap<String, String>,
    pub header: HeaderConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            chat_offset: Timecode::ZERO,
            closing_time: None,
            screen_height: Self::DEFAULT_SCREEN_HEIGHT,
            max_line_width: Self::DEFAULT_MAX_LINE_WIDTH,
            position: Position::default(),
            style: Self::DEFAULT_STYLE.to_string(),
            fade_in_ms: Self::DEFAULT_FADE_IN_MS,
            width_mode: WidthMode::default(),
            snips: Vec::new(),
            palette: BTreeMap::new(),
            names: BTreeMap::new(),
            colors: BTreeMap::new(),
            header: HeaderConfig::default(),
        }
    }
}

impl ReplayConfig {
    pub const DEFAULT_SCREEN_HEIGHT: usize = 24;
    pub const DEFAULT_MAX_LINE_WIDTH: usize = 37;
    pub const DEFAULT_FADE_IN_MS: u32 = 1000;
    pub const DEFAULT_STYLE: &'static str = "Chat Replay";

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading replay config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing replay config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating replay config {}", path.display()))?;
        Ok(config)
    }

    /// Fails fast on anything that would otherwise surface halfway through a
    /// render.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.screen_height == 0 {
            return Err(ReplayError::ZeroScreenHeight);
        }
        if self.max_line_width <= CONTINUATION_INDENT_WIDTH {
            return Err(ReplayError::LineWidthTooSmall(self.max_line_width));
        }
        self.closing_time()?;
        self.mapper()?;
        self.authors()?;
        Ok(())
    }

    pub fn closing_time(&self) -> Result<Timecode, ReplayError> {
        self.closing_time.ok_or(ReplayError::MissingClosingTime)
    }

    pub fn mapper(&self) -> Result<TimeOffsetMapper, ReplayError> {
        let snips: Vec<Snip> = self
            .snips
            .iter()
            .map(|[start, end]| Snip::new(*start, *end))
            .collect();
        Ok(TimeOffsetMapper::new(self.chat_offset, SnipTable::new(&snips)?))
    }

    pub fn authors(&self) -> Result<AuthorTable, ReplayError> {
        let mut table = AuthorTable::default();
        for (author, display_name) in &self.names {
            table.insert_name(author, display_name);
        }
        for (author, value) in &self.colors {
            let color = if value.trim_start().starts_with('#') {
                value.parse::<Rgb>()?
            } else {
                let hex = self.palette.get(value.trim()).ok_or_else(|| {
                    ReplayError::UnknownPaletteColor {
                        author: author.clone(),
                        name: value.clone(),
                    }
                })?;
                hex.parse::<Rgb>()?
            };
            table.insert_color(author, color);
        }
        Ok(table)
    }

    pub fn layout(&self) -> CueLayout {
        CueLayout {
            style: self.style.clone(),
            position: self.position,
            fade_in_ms: self.fade_in_ms,
            screen_height: self.screen_height,
        }
    }

    pub fn ass_header(&self) -> AssHeader {
        AssHeader {
            style: self.style.clone(),
            play_res: (self.header.play_res_x, self.header.play_res_y),
            font_name: self.header.font_name.clone(),
            font_size: self.header.font_size,
        }
    }
}

/// Resolves the config to use: an explicit path, `./chatsubs.toml`, or the
/// user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    if let Some(user) = user_config_path()
        && user.exists()
    {
        return Ok(user);
    }

    bail!("No {CONFIG_FILE_NAME} found. Run `chatsubs init-config` to create one.")
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatsubs").join("config.toml"))
}

/// Commented starter config written by `init-config`.
pub const DEFAULT_CONFIG_DOCUMENT: &str = r##"# chatsubs configuration

# Subtracted from every chat timestamp to land on video time (HH:MM:SS[.ss])
chat_offset = "00:00:00"
# End time of the last window on screen
closing_time = "01:00:00.00"
# Number of chat lines visible at once
screen_height = 24
# Wrap width in display columns
max_line_width = 37
# ASS style name used by every cue
style = "Chat Replay"
# Fade-in duration of newly arrived lines (milliseconds)
fade_in_ms = 1000
# How glyph widths are counted: "cells" (emoji take two columns) or "graphemes"
width_mode = "cells"
# Segments cut from the video, each in the timeline left by the earlier cuts
snips = [
    # ["00:05:20.00", "00:05:54.00"],
]

# Top-left anchor of the chat column
[position]
x = 170
y = 15

# Built-in header, used when --header is not given
[header]
play_res_x = 1920
play_res_y = 1080
font_name = "Arial"
font_size = 28

# Named colors usable in [colors]
[palette]
# mods = "#205F70"

# Author name (without #discriminator) to display name
[names]
# "old name" = "new name"

# Display name to "#RRGGBB" or a palette name
[colors]
# "someone" = "mods"
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> ReplayConfig {
        toml::from_str(toml_text).expect("parse config")
    }

    #[test]
    fn default_document_is_valid() {
        let config = parse(DEFAULT_CONFIG_DOCUMENT);
        config.validate().expect("default document validates");
        assert_eq!(config.screen_height, ReplayConfig::DEFAULT_SCREEN_HEIGHT);
        assert_eq!(config.max_line_width, ReplayConfig::DEFAULT_MAX_LINE_WIDTH);
        assert_eq!(config.closing_time().unwrap(), Timecode::from_hms(1, 0, 0));
    }

    #[test]
    fn rgb_renders_as_bgr_tag() {
        let color: Rgb = "#1ABBF3".parse().unwrap();
        assert_eq!(color, Rgb::new(26, 187, 243));
        assert_eq!(color.ass_tag(), "{\\c&HF3BB1A&}");
        assert_eq!(Rgb::new(15, 0, 255).ass_tag(), "{\\c&HFF000F&}");
        assert!("1ABBF3".parse::<Rgb>().is_err());
        assert!("#1ABBF".parse::<Rgb>().is_err());
    }

    #[test]
    fn colors_resolve_through_palette_and_names() {
        let config = parse(
            r##"
            closing_time = "01:00:00"
            [palette]
            mods = "#205F70"
            [names]
            "Old Name" = "Lordy"
            [colors]
            Lordy = "mods"
            sling = "#F1C40F"
            "##,
        );
        let authors = config.authors().unwrap();
        assert_eq!(authors.display_name("Old Name"), "Lordy");
        assert_eq!(authors.display_name("sling"), "sling");
        assert_eq!(authors.color_tag("Lordy").unwrap(), "{\\c&H705F20&}");
        assert_eq!(authors.color_tag("sling").unwrap(), "{\\c&H0FC4F1&}");
        assert!(authors.color_tag("Old Name").is_err());
    }

    #[test]
    fn unknown_palette_entry_fails_validation() {
        let config = parse(
            r##"
            closing_time = "01:00:00"
            [colors]
            Lordy = "nope"
            "##,
        );
        assert!(matches!(
            config.validate(),
            Err(ReplayError::UnknownPaletteColor { .. })
        ));
    }

    #[test]
    fn snips_are_validated_at_load() {
        let config = parse(
            r#"
            closing_time = "01:00:00"
            snips = [["00:10:00", "00:11:00"], ["00:09:00", "00:09:30"]]
            "#,
        );
        assert!(matches!(
            config.validate(),
            Err(ReplayError::UnorderedSnip { index: 1, previous: 0 })
        ));
    }

    #[test]
    fn missing_closing_time_and_bad_sizes_fail_validation() {
        assert_eq!(
            parse("").validate(),
            Err(ReplayError::MissingClosingTime)
        );
        assert_eq!(
            parse("closing_time = \"01:00:00\"\nscreen_height = 0").validate(),
            Err(ReplayError::ZeroScreenHeight)
        );
        assert_eq!(
            parse("closing_time = \"01:00:00\"\nmax_line_width = 2").validate(),
            Err(ReplayError::LineWidthTooSmall(2))
        );
    }

    #[test]
    fn malformed_timecode_is_a_parse_error() {
        let result: Result<ReplayConfig, _> = toml::from_str("chat_offset = \"4h\"");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_path_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "screen_height = 0\nclosing_time = \"00:10:00\"").unwrap();
        let err = ReplayConfig::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("screen_height must be at least 1"));
    }
}
