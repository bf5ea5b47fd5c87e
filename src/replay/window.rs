//! The rolling chat window.
//!
//! The overlay shows a fixed number of lines. Each incoming message pushes
//! its lines in at the bottom and the oldest lines fall off the top. Every
//! step yields a `Frame`: a snapshot of the screen plus how many of its
//! bottom lines just arrived.

use std::collections::VecDeque;

use super::ass::{Cue, CueLayout, faded_cues, static_cue};
use super::error::ReplayError;
use super::timecode::Timecode;
use super::wrap::DisplayLine;

/// One on-screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<DisplayLine>,
    /// Number of lines at the bottom that are new in this frame.
    pub introduced: usize,
}

impl Frame {
    /// A frame starts when its newest line was sent.
    pub fn begin(&self) -> Timecode {
        self.lines
            .last()
            .map(|line| line.time)
            .unwrap_or(Timecode::ZERO)
    }

    pub fn static_lines(&self) -> &[DisplayLine] {
        &self.lines[..self.lines.len() - self.introduced]
    }

    pub fn new_lines(&self) -> &[DisplayLine] {
        &self.lines[self.lines.len() - self.introduced..]
    }
}

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    lines: VecDeque<DisplayLine>,
}

impl SlidingWindow {
    /// A window filled with blank placeholder lines at time zero.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: std::iter::repeat_with(DisplayLine::blank)
                .take(capacity)
                .collect(),
        }
    }

    /// The blank screen shown before the first message, with its bottom
    /// placeholder counted as new.
    pub fn initial_frame(&self) -> Frame {
        self.snapshot(1)
    }

    /// Pushes one message's lines in at the bottom. A message taller than
    /// the screen keeps only its newest lines.
    pub fn advance(&mut self, group: &[DisplayLine]) -> Frame {
        let visible = &group[group.len().saturating_sub(self.capacity)..];
        self.lines.drain(..visible.len());
        self.lines.extend(visible.iter().cloned());
        debug_assert_eq!(self.lines.len(), self.capacity);
        self.snapshot(visible.len())
    }

    fn snapshot(&self, introduced: usize) -> Frame {
        Frame {
            lines: self.lines.iter().cloned().collect(),
            introduced,
        }
    }
}

/// Folds every message group through a fresh window, starting with the blank
/// screen. Empty groups are skipped.
pub fn fold_windows(groups: &[Vec<DisplayLine>], screen_height: usize) -> Vec<Frame> {
    let mut window = SlidingWindow::new(screen_height);
    let mut frames = Vec::with_capacity(groups.len() + 1);
    frames.push(window.initial_frame());
    for group in groups.iter().filter(|group| !group.is_empty()) {
        frames.push(window.advance(group));
    }
    frames
}

/// Turns frames into contiguous cues. Each frame lasts until the next one
/// begins; the last one lasts until `closing`.
pub fn frames_to_cues(
    frames: &[Frame],
    closing: Timecode,
    layout: &CueLayout,
) -> Result<Vec<Cue>, ReplayError> {
    let mut cues = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        let begin = frame.begin();
        let end = match frames.get(index + 1) {
            Some(next) => next.begin(),
            None => closing,
        };

        if end < begin {
            return Err(match frames.get(index + 1) {
                Some(_) => ReplayError::OutOfOrder {
                    previous: begin,
                    current: end,
                },
                None => ReplayError::ClosingTooEarly {
                    closing,
                    last: begin,
                },
            });
        }

        cues.extend(static_cue(frame.static_lines(), begin, end));
        cues.extend(faded_cues(frame.new_lines(), begin, end, layout));
    }

    Ok(cues)
}
