//! Word wrapping of chat messages into overlay lines.
//!
//! Widths are measured per grapheme cluster so that emoji sequences count as
//! the glyph they render as, never as their code point or byte length.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::ass::escape_ass_text;
use super::config::AuthorTable;
use super::error::ReplayError;
use super::timecode::Timecode;
use super::transcript::unquote;

/// Hard-space filler placed before continuation lines. Renderers keep it even
/// when they trim leading whitespace.
pub const CONTINUATION_INDENT: &str = "\\h\\h";
pub const CONTINUATION_INDENT_WIDTH: usize = 2;

/// Restores the style's white after the colored author label.
pub const WHITE_RESET: &str = "{\\c&HFFFFFF&}";

/// Text placed on screen before any message has arrived.
pub const BLANK_LINE: &str = " ";

pub trait WidthMeasure {
    fn width(&self, text: &str) -> usize;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthMode {
    /// Terminal-style cell width: wide glyphs and emoji take two columns.
    #[default]
    Cells,
    /// Every grapheme cluster takes one column.
    Graphemes,
}

impl WidthMeasure for WidthMode {
    fn width(&self, text: &str) -> usize {
        match self {
            WidthMode::Cells => text.graphemes(true).map(cell_width).sum(),
            WidthMode::Graphemes => text.graphemes(true).count(),
        }
    }
}

fn cell_width(grapheme: &str) -> usize {
    // ZWJ sequences and flags are one glyph no matter how many code points
    // the width tables add up.
    grapheme.width().min(2)
}

/// One line of the overlay, stamped with the video time it appears at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub time: Timecode,
    pub text: String,
}

impl DisplayLine {
    pub fn new(time: Timecode, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::new(Timecode::ZERO, BLANK_LINE)
    }
}

/// A wrapped segment before any markup is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    pub continuation: bool,
}

/// Greedy word wrap. Continuation lines lose `CONTINUATION_INDENT_WIDTH`
/// columns to the indent; words longer than a whole line are broken at
/// grapheme boundaries, filling the current line first.
pub fn wrap_text<M: WidthMeasure + ?Sized>(
    text: &str,
    max_width: usize,
    measure: &M,
) -> Vec<WrappedLine> {
    let normalized: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let mut builder = LineBuilder::new(max_width.max(CONTINUATION_INDENT_WIDTH + 1));
    let mut pending: VecDeque<String> = split_words(&normalized).into();

    while let Some(chunk) = pending.pop_front() {
        let limit = builder.limit();
        let chunk_width = measure.width(&chunk);

        if chunk.starts_with(' ') {
            if builder.is_empty() {
                continue;
            }
            if builder.width + chunk_width <= limit {
                builder.push(&chunk, chunk_width);
            } else {
                builder.finish_line();
            }
            continue;
        }

        if builder.width + chunk_width <= limit {
            builder.push(&chunk, chunk_width);
            continue;
        }

        if chunk_width > limit {
            let room = limit - builder.width;
            let (head, head_width, tail) =
                split_at_width(&chunk, room, builder.is_empty(), measure);
            if head.is_empty() {
                builder.finish_line();
                pending.push_front(chunk);
                continue;
            }
            builder.push(&head, head_width);
            builder.finish_line();
            if !tail.is_empty() {
                pending.push_front(tail);
            }
            continue;
        }

        builder.finish_line();
        pending.push_front(chunk);
    }

    builder.finish()
}

struct LineBuilder {
    max_width: usize,
    lines: Vec<WrappedLine>,
    current: String,
    width: usize,
}

impl LineBuilder {
    fn new(max_width: usize) -> Self {
        Self {
            max_width,
            lines: Vec::new(),
            current: String::new(),
            width: 0,
        }
    }

    fn limit(&self) -> usize {
        if self.lines.is_empty() {
            self.max_width
        } else {
            self.max_width - CONTINUATION_INDENT_WIDTH
        }
    }

    fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn push(&mut self, fragment: &str, width: usize) {
        self.current.push_str(fragment);
        self.width += width;
    }

    fn finish_line(&mut self) {
        let text = self.current.trim_end().to_string();
        self.current.clear();
        self.width = 0;
        if text.is_empty() {
            return;
        }
        let continuation = !self.lines.is_empty();
        self.lines.push(WrappedLine { text, continuation });
    }

    fn finish(mut self) -> Vec<WrappedLine> {
        self.finish_line();
        self.lines
    }
}

/// Splits text into alternating whitespace and non-whitespace runs. A word
/// is also split after a hyphen joining two letters (`well-` `known`), so
/// lines may break there.
fn split_words(text: &str) -> Vec<String> {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = false;

    for (index, grapheme) in graphemes.iter().enumerate() {
        let is_ws = grapheme.chars().all(char::is_whitespace);
        if is_ws != in_whitespace && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push_str(grapheme);
        in_whitespace = is_ws;

        if *grapheme == "-"
            && index > 0
            && is_letter(graphemes[index - 1])
            && graphemes.get(index + 1).is_some_and(|next| is_letter(next))
        {
            words.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn is_letter(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_alphabetic)
}

/// Takes graphemes from the front of `word` while they fit in `room`.
/// With `force_one`, the first grapheme is taken even if it is too wide.
fn split_at_width<M: WidthMeasure + ?Sized>(
    word: &str,
    room: usize,
    force_one: bool,
    measure: &M,
) -> (String, usize, String) {
    let mut head_len = 0;
    let mut head_width = 0;

    for grapheme in word.graphemes(true) {
        let width = measure.width(grapheme);
        let fits = head_width + width <= room;
        if !fits && !(force_one && head_len == 0) {
            break;
        }
        head_len += grapheme.len();
        head_width += width;
    }

    (
        word[..head_len].to_string(),
        head_width,
        word[head_len..].to_string(),
    )
}

/// Turns one chat message into colored, wrapped overlay lines.
#[derive(Debug, Clone)]
pub struct MessageWrapper<'a> {
    authors: &'a AuthorTable,
    max_width: usize,
    measure: WidthMode,
}

impl<'a> MessageWrapper<'a> {
    pub fn new(
        authors: &'a AuthorTable,
        max_width: usize,
        measure: WidthMode,
    ) -> Result<Self, ReplayError> {
        if max_width <= CONTINUATION_INDENT_WIDTH {
            return Err(ReplayError::LineWidthTooSmall(max_width));
        }
        Ok(Self {
            authors,
            max_width,
            measure,
        })
    }

    /// `author` is the display name; `raw_text` is the quoted transcript field.
    pub fn wrap(
        &self,
        author: &str,
        time: Timecode,
        raw_text: &str,
    ) -> Result<Vec<DisplayLine>, ReplayError> {
        let color = self.authors.color_tag(author)?;
        let message = format!("{author}: {}", unquote(raw_text));

        let lines = wrap_text(&message, self.max_width, &self.measure)
            .into_iter()
            .map(|line| {
                let escaped = escape_ass_text(&line.text);
                let text = if line.continuation {
                    format!("{CONTINUATION_INDENT}{escaped}")
                } else {
                    color_author_label(&escaped, &escape_ass_text(author), &color)
                };
                DisplayLine::new(time, text)
            })
            .collect();

        Ok(lines)
    }
}

fn color_author_label(line: &str, author: &str, color: &str) -> String {
    let label = format!("{author}: ");
    match line.strip_prefix(&label) {
        Some(rest) => format!("{color}{label}{WHITE_RESET}{rest}"),
        // The label ends the line (its space was trimmed) or overflowed it.
        None => format!("{color}{line}{WHITE_RESET}"),
    }
}
