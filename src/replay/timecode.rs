//! Fixed-precision timestamps.
//!
//! Chat transcripts carry `HH:MM:SS`, snip lists and cue output use
//! `HH:MM:SS.ss`. Everything is stored as whole centiseconds so that
//! formatting never drifts.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ReplayError;

const CENTIS_PER_SECOND: u64 = 100;
const CENTIS_PER_MINUTE: u64 = 60 * CENTIS_PER_SECOND;
const CENTIS_PER_HOUR: u64 = 60 * CENTIS_PER_MINUTE;

/// Anything longer is a malformed value, not a recording.
const MAX_HOURS: u64 = 99_999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timecode(u64);

impl Timecode {
    pub const ZERO: Timecode = Timecode(0);

    pub const fn from_centis(centis: u64) -> Self {
        Self(centis)
    }

    pub const fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self(hours * CENTIS_PER_HOUR + minutes * CENTIS_PER_MINUTE + seconds * CENTIS_PER_SECOND)
    }

    pub const fn centis(self) -> u64 {
        self.0
    }

    pub fn checked_sub(self, other: Timecode) -> Option<Timecode> {
        self.0.checked_sub(other.0).map(Timecode)
    }
}

impl Add for Timecode {
    type Output = Timecode;

    fn add(self, rhs: Timecode) -> Timecode {
        Timecode(self.0 + rhs.0)
    }
}

impl Sub for Timecode {
    type Output = Timecode;

    /// Saturates at zero; callers that must detect underflow use `checked_sub`.
    fn sub(self, rhs: Timecode) -> Timecode {
        Timecode(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / CENTIS_PER_HOUR;
        let minutes = (self.0 % CENTIS_PER_HOUR) / CENTIS_PER_MINUTE;
        let seconds = (self.0 % CENTIS_PER_MINUTE) / CENTIS_PER_SECOND;
        let centis = self.0 % CENTIS_PER_SECOND;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
    }
}

impl FromStr for Timecode {
    type Err = ReplayError;

    /// Accepts `HH:MM:SS` and `HH:MM:SS.f...`; fractions beyond hundredths
    /// are truncated.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| ReplayError::InvalidTimestamp {
            value: value.to_string(),
            reason,
        };

        let trimmed = value.trim();
        let (time_part, fractional_part) = match trimmed.split_once('.') {
            Some((time, fraction)) => (time, Some(fraction)),
            None => (trimmed, None),
        };

        let mut hms = time_part.split(':');
        let hours = parse_component(hms.next(), "missing hours").map_err(invalid)?;
        let minutes = parse_component(hms.next(), "missing minutes").map_err(invalid)?;
        let seconds = parse_component(hms.next(), "missing seconds").map_err(invalid)?;
        if hms.next().is_some() {
            return Err(invalid("more than three components"));
        }
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid("minutes and seconds must be below 60"));
        }
        if hours > MAX_HOURS {
            return Err(invalid("hours out of range"));
        }

        let centis = match fractional_part {
            None => 0,
            Some(fraction) => {
                if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("fraction must be digits"));
                }
                let mut digits: String = fraction.chars().take(2).collect();
                while digits.len() < 2 {
                    digits.push('0');
                }
                digits
                    .parse::<u64>()
                    .map_err(|_| invalid("fraction must be digits"))?
            }
        };

        Ok(Timecode::from_hms(hours, minutes, seconds) + Timecode(centis))
    }
}

fn parse_component(part: Option<&str>, missing: &'static str) -> Result<u64, &'static str> {
    let part = part.ok_or(missing)?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err("components must be digits");
    }
    part.parse::<u64>().map_err(|_| "component out of range")
}

impl TryFrom<String> for Timecode {
    type Error = ReplayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timecode> for String {
    fn from(value: Timecode) -> Self {
        value.to_string()
    }
}
