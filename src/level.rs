use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Ordered log level.
///
/// Levels are plain integers so that frontends can use intermediate
/// values between the named tiers: `Level::INFO + 1` is a valid level
/// and still maps to the `"INFO"` severity. The named constants keep the
/// conventional spacing of four between tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);

    /// Build a level from its raw numeric value.
    pub const fn new(value: i32) -> Self {
        Level(value)
    }

    /// Raw numeric value of this level.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Map this level to its Google Cloud Logging severity label.
    ///
    /// Total over all numeric levels: each value falls into one of the
    /// four tiers, and boundary values map to the higher tier (exactly
    /// `WARN` is `"WARNING"`, not `"INFO"`).
    pub const fn severity(self) -> &'static str {
        if self.0 >= Level::ERROR.0 {
            "ERROR"
        } else if self.0 >= Level::WARN.0 {
            "WARNING"
        } else if self.0 >= Level::INFO.0 {
            "INFO"
        } else {
            "DEBUG"
        }
    }
}

impl fmt::Display for Level {
    /// Renders the tier name plus the offset from it, e.g. `INFO`,
    /// `INFO+1`, `DEBUG-4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = if self.0 >= Level::ERROR.0 {
            ("ERROR", Level::ERROR.0)
        } else if self.0 >= Level::WARN.0 {
            ("WARN", Level::WARN.0)
        } else if self.0 >= Level::INFO.0 {
            ("INFO", Level::INFO.0)
        } else {
            ("DEBUG", Level::DEBUG.0)
        };

        let delta = self.0 - base;
        if delta == 0 {
            f.write_str(name)
        } else {
            write!(f, "{}{:+}", name, delta)
        }
    }
}

/// Error type returned when parsing a [`Level`] from text.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unrecognized log level {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a tier name with an optional signed offset, matching the
    /// [`Display`] form: `"info"`, `"WARN+1"`, `"debug-4"`. `WARNING` is
    /// accepted as an alias for `WARN` so severity labels round-trip.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, offset) = match trimmed.find(|c| c == '+' || c == '-') {
            Some(at) => (&trimmed[..at], &trimmed[at..]),
            None => (trimmed, ""),
        };

        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" | "WARNING" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(ParseLevelError(s.to_string())),
        };

        if offset.is_empty() {
            return Ok(base);
        }
        let delta: i32 = offset
            .parse()
            .map_err(|_| ParseLevelError(s.to_string()))?;
        base.0
            .checked_add(delta)
            .map(Level)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl Add<i32> for Level {
    type Output = Level;

    /// Saturates at the numeric extremes instead of wrapping.
    fn add(self, rhs: i32) -> Level {
        Level(self.0.saturating_add(rhs))
    }
}

impl Sub<i32> for Level {
    type Output = Level;

    fn sub(self, rhs: i32) -> Level {
        Level(self.0.saturating_sub(rhs))
    }
}
