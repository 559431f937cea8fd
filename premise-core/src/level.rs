//! The six tree levels and the five expansion stages over them.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// One of the six depths of the story-element tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Theme,
    Background,
    Persona,
    Event,
    Ending,
    Twist,
}

impl Level {
    /// All levels, root first.
    pub const ALL: [Level; 6] = [
        Level::Theme,
        Level::Background,
        Level::Persona,
        Level::Event,
        Level::Ending,
        Level::Twist,
    ];

    /// Zero-based position of this level in a key path.
    pub fn index(self) -> usize {
        match self {
            Level::Theme => 0,
            Level::Background => 1,
            Level::Persona => 2,
            Level::Event => 3,
            Level::Ending => 4,
            Level::Twist => 5,
        }
    }

    /// Lowercase level name as used in file names and CLI arguments.
    pub fn name(self) -> &'static str {
        match self {
            Level::Theme => "theme",
            Level::Background => "background",
            Level::Persona => "persona",
            Level::Event => "event",
            Level::Ending => "ending",
            Level::Twist => "twist",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| Error::UnknownLevel(s.to_string()))
    }
}

/// One expansion stage: generates the children at one level under every
/// parent path of the previous level's tree.
///
/// The theme level is externally supplied, so there is no theme stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Background,
    Persona,
    Event,
    Ending,
    Twist,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Background,
        Stage::Persona,
        Stage::Event,
        Stage::Ending,
        Stage::Twist,
    ];

    /// The level this stage populates.
    pub fn level(self) -> Level {
        match self {
            Stage::Background => Level::Background,
            Stage::Persona => Level::Persona,
            Stage::Event => Level::Event,
            Stage::Ending => Level::Ending,
            Stage::Twist => Level::Twist,
        }
    }

    /// Depth of the children this stage creates (theme is depth 1).
    pub fn depth(self) -> usize {
        self.level().index() + 1
    }

    /// File holding the parent tree this stage reads.
    pub fn input_file(self) -> &'static str {
        match self {
            Stage::Background => "theme.json",
            Stage::Persona => "background.json",
            Stage::Event => "persona.json",
            Stage::Ending => "event.json",
            Stage::Twist => "ending.json",
        }
    }

    /// File this stage writes.
    pub fn output_file(self) -> &'static str {
        match self {
            Stage::Background => "background.json",
            Stage::Persona => "persona.json",
            Stage::Event => "event.json",
            Stage::Ending => "ending.json",
            Stage::Twist => "twist.json",
        }
    }

    /// Default number of children every parent path must reach.
    pub fn default_target(self) -> usize {
        match self {
            Stage::Background => 30,
            Stage::Persona => 9,
            Stage::Event => 2,
            Stage::Ending => 1,
            Stage::Twist => 1,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level().name())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.level().name() == s)
            .ok_or_else(|| Error::UnknownLevel(s.to_string()))
    }
}
