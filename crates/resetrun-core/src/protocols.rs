//! Reset modes and session lengths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Kind of reset session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Calm,
    Focus,
    Clean,
    Body,
    Timeout,
}

/// Every mode, in default display order.
pub const MODES: [Mode; 5] = [Mode::Calm, Mode::Focus, Mode::Clean, Mode::Body, Mode::Timeout];

/// The mode set that existed before `timeout` was introduced.
const LEGACY_MODES: [Mode; 4] = [Mode::Calm, Mode::Focus, Mode::Clean, Mode::Body];

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Calm => "calm",
            Mode::Focus => "focus",
            Mode::Clean => "clean",
            Mode::Body => "body",
            Mode::Timeout => "timeout",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Calm => "Calm",
            Mode::Focus => "Focus",
            Mode::Clean => "Clean",
            Mode::Body => "Body",
            Mode::Timeout => "Time Out",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MODES
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownMode(s.to_string()))
    }
}

/// Dedupe modes keeping first occurrence, and add `timeout` to lists saved
/// before it existed that selected every mode of that era.
pub fn upgrade_preferred_modes(modes: &[Mode]) -> Vec<Mode> {
    let mut unique: Vec<Mode> = Vec::with_capacity(modes.len());
    for mode in modes {
        if !unique.contains(mode) {
            unique.push(*mode);
        }
    }
    let was_all_legacy = unique.len() == LEGACY_MODES.len()
        && LEGACY_MODES.iter().all(|m| unique.contains(m));
    if was_all_legacy {
        unique.push(Mode::Timeout);
    }
    unique
}

/// Preferred session length in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SessionLength {
    Two,
    Five,
    Ten,
}

pub const SESSION_LENGTHS: [SessionLength; 3] =
    [SessionLength::Two, SessionLength::Five, SessionLength::Ten];

impl SessionLength {
    pub fn minutes(&self) -> u32 {
        match self {
            SessionLength::Two => 2,
            SessionLength::Five => 5,
            SessionLength::Ten => 10,
        }
    }
}

impl TryFrom<i64> for SessionLength {
    type Error = ValidationError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        match minutes {
            2 => Ok(SessionLength::Two),
            5 => Ok(SessionLength::Five),
            10 => Ok(SessionLength::Ten),
            other => Err(ValidationError::InvalidSessionLength(other)),
        }
    }
}

impl From<SessionLength> for i64 {
    fn from(length: SessionLength) -> Self {
        i64::from(length.minutes())
    }
}

impl fmt::Display for SessionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}
