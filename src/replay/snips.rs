//! Chat-clock to video-clock mapping.
//!
//! Snips are listed in sequential-edit coordinates: each cut is expressed in
//! the timeline left over after every earlier cut was applied. The table
//! shifts them back to absolute recording time once, up front.

use super::error::ReplayError;
use super::timecode::Timecode;

/// A removed interval, as written in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snip {
    pub start: Timecode,
    pub end: Timecode,
}

impl Snip {
    pub fn new(start: Timecode, end: Timecode) -> Self {
        Self { start, end }
    }

    fn length(&self) -> Timecode {
        self.end - self.start
    }
}

/// A snip shifted into absolute recording time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnipState {
    pub absolute_start: Timecode,
    pub absolute_end: Timecode,
    /// Total time cut by all snips before this one.
    pub removed_before: Timecode,
}

impl SnipState {
    /// Total time cut up to and including this snip.
    pub fn removed_through(&self) -> Timecode {
        self.removed_before + (self.absolute_end - self.absolute_start)
    }

    fn contains(&self, candidate: Timecode) -> bool {
        self.absolute_start <= candidate && candidate <= self.absolute_end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnipTable {
    states: Vec<SnipState>,
}

impl SnipTable {
    /// Builds the absolute table, rejecting empty snips and snips whose
    /// absolute ranges would overlap or run backwards.
    pub fn new(snips: &[Snip]) -> Result<Self, ReplayError> {
        let mut states: Vec<SnipState> = Vec::with_capacity(snips.len());
        let mut removed = Timecode::ZERO;

        for (index, snip) in snips.iter().enumerate() {
            if snip.end <= snip.start {
                return Err(ReplayError::EmptySnip {
                    index,
                    start: snip.start,
                    end: snip.end,
                });
            }

            let state = SnipState {
                absolute_start: snip.start + removed,
                absolute_end: snip.end + removed,
                removed_before: removed,
            };

            if let Some(previous) = states.last()
                && state.absolute_start <= previous.absolute_end
            {
                return Err(ReplayError::UnorderedSnip {
                    index,
                    previous: index - 1,
                });
            }

            removed = removed + snip.length();
            states.push(state);
        }

        Ok(Self { states })
    }

    pub fn states(&self) -> &[SnipState] {
        &self.states
    }

    pub fn total_removed(&self) -> Timecode {
        self.states
            .last()
            .map(SnipState::removed_through)
            .unwrap_or(Timecode::ZERO)
    }

    /// Moves an absolute recording time onto the edited timeline.
    ///
    /// Times inside a snip (boundaries included) collapse onto the instant
    /// the cut begins. Times after a snip lose everything cut so far.
    pub fn collapse(&self, candidate: Timecode) -> Timecode {
        // Absolute ends are strictly increasing, so this counts the snips
        // that finished before the candidate.
        let finished = self
            .states
            .partition_point(|state| state.absolute_end < candidate);

        if let Some(state) = self.states.get(finished)
            && state.contains(candidate)
        {
            return state.absolute_start - state.removed_before;
        }

        match finished.checked_sub(1) {
            Some(last) => candidate - self.states[last].removed_through(),
            None => candidate,
        }
    }
}

/// Maps raw chat timestamps onto the edited video's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOffsetMapper {
    chat_offset: Timecode,
    snips: SnipTable,
}

impl TimeOffsetMapper {
    pub fn new(chat_offset: Timecode, snips: SnipTable) -> Self {
        Self { chat_offset, snips }
    }

    pub fn chat_offset(&self) -> Timecode {
        self.chat_offset
    }

    pub fn snips(&self) -> &SnipTable {
        &self.snips
    }

    pub fn map(&self, raw: Timecode) -> Result<Timecode, ReplayError> {
        let candidate =
            raw.checked_sub(self.chat_offset)
                .ok_or(ReplayError::BeforeVideoStart {
                    timestamp: raw,
                    offset: self.chat_offset,
                })?;
        Ok(self.snips.collapse(candidate))
    }
}
