use thiserror::Error;

use super::timecode::Timecode;

/// Fatal configuration and data errors. None of these are recoverable: a
/// dropped record would shift every cue after it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: &'static str },

    #[error("No color configured for author '{0}'")]
    MissingColor(String),

    #[error("Author '{author}' uses unknown palette color '{name}'")]
    UnknownPaletteColor { author: String, name: String },

    #[error("Invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error("Line {line}: author '{author}' has no '#' discriminator")]
    MissingDiscriminator { line: usize, author: String },

    #[error("Chat timestamp {timestamp} is before the video start (offset {offset})")]
    BeforeVideoStart { timestamp: Timecode, offset: Timecode },

    #[error("Snip {index} ({start} - {end}) does not end after it starts")]
    EmptySnip {
        index: usize,
        start: Timecode,
        end: Timecode,
    },

    #[error("Snip {index} starts at or before snip {previous} once earlier cuts are applied")]
    UnorderedSnip { index: usize, previous: usize },

    #[error("Message at {current} is earlier than the previous message at {previous}")]
    OutOfOrder { previous: Timecode, current: Timecode },

    #[error("Closing time {closing} is earlier than the last message at {last}")]
    ClosingTooEarly { closing: Timecode, last: Timecode },

    #[error("No closing_time configured")]
    MissingClosingTime,

    #[error("Transcript contains no displayable messages")]
    EmptyTranscript,

    #[error("screen_height must be at least 1")]
    ZeroScreenHeight,

    #[error("max_line_width {0} leaves no room after the continuation indent")]
    LineWidthTooSmall(usize),
}
