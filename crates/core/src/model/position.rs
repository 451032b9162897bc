use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Lowest string number (the highest-pitched string).
pub const MIN_STRING: u8 = 1;
/// Highest string number (the lowest-pitched string).
pub const MAX_STRING: u8 = 6;
/// Highest fret on the reference fretboard.
pub const MAX_FRET: u8 = 24;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PositionError {
    #[error("string {0} is out of range (expected 1-6)")]
    InvalidString(i64),

    #[error("fret {0} is out of range (expected 0-24)")]
    InvalidFret(i64),

    #[error("malformed position key: {0:?}")]
    MalformedKey(String),
}

//
// ─── NOTE POSITION ─────────────────────────────────────────────────────────────
//

/// A single string/fret coordinate on the fretboard.
///
/// Ordering is by string, then fret. Zones rely on it for stable enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotePosition {
    pub string: u8,
    pub fret: u8,
}

impl NotePosition {
    /// Builds a position without range checks. Use [`NotePosition::try_new`]
    /// for untrusted input.
    #[must_use]
    pub const fn new(string: u8, fret: u8) -> Self {
        Self { string, fret }
    }

    /// Builds a validated position from wide integers.
    ///
    /// # Errors
    ///
    /// Returns `PositionError` if the string or fret is out of range.
    pub fn try_new(string: i64, fret: i64) -> Result<Self, PositionError> {
        if !(i64::from(MIN_STRING)..=i64::from(MAX_STRING)).contains(&string) {
            return Err(PositionError::InvalidString(string));
        }
        if !(0..=i64::from(MAX_FRET)).contains(&fret) {
            return Err(PositionError::InvalidFret(fret));
        }
        Ok(Self::new(string as u8, fret as u8))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (MIN_STRING..=MAX_STRING).contains(&self.string) && self.fret <= MAX_FRET
    }

    /// Packed integer key, unique across valid positions.
    #[must_use]
    pub fn packed(&self) -> u16 {
        u16::from(self.string) * (u16::from(MAX_FRET) + 1) + u16::from(self.fret)
    }

    /// Text key in the `s{string}f{fret}` form.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Moves the fret by `offset`, returning `None` when the result leaves the board.
    #[must_use]
    pub fn shifted(&self, offset: i32) -> Option<Self> {
        let fret = i32::from(self.fret).checked_add(offset)?;
        if !(0..=i32::from(MAX_FRET)).contains(&fret) {
            return None;
        }
        u8::try_from(fret).ok().map(|fret| Self::new(self.string, fret))
    }
}

impl fmt::Display for NotePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}f{}", self.string, self.fret)
    }
}

impl FromStr for NotePosition {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PositionError::MalformedKey(s.to_string());
        let rest = s.trim().strip_prefix('s').ok_or_else(malformed)?;
        let (string, fret) = rest.split_once('f').ok_or_else(malformed)?;
        let string: i64 = string.parse().map_err(|_| malformed())?;
        let fret: i64 = fret.parse().map_err(|_| malformed())?;
        Self::try_new(string, fret)
    }
}

//
// ─── SPAN ──────────────────────────────────────────────────────────────────────
//

/// Inclusive numeric range whose endpoints are stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    low: u8,
    high: u8,
}

impl Span {
    /// Creates a span, swapping the endpoints if they arrive reversed.
    #[must_use]
    pub fn new(a: u8, b: u8) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    #[must_use]
    pub fn single(value: u8) -> Self {
        Self::new(value, value)
    }

    #[must_use]
    pub fn low(&self) -> u8 {
        self.low
    }

    #[must_use]
    pub fn high(&self) -> u8 {
        self.high
    }

    #[must_use]
    pub fn contains(&self, value: u8) -> bool {
        (self.low..=self.high).contains(&value)
    }

    /// Number of values covered, endpoints included.
    #[must_use]
    pub fn count(&self) -> usize {
        usize::from(self.high - self.low) + 1
    }

    #[must_use]
    pub fn iter(&self) -> RangeInclusive<u8> {
        self.low..=self.high
    }

    /// Every string on the board.
    #[must_use]
    pub fn all_strings() -> Self {
        Self::new(MIN_STRING, MAX_STRING)
    }

    /// Every fret on the board.
    #[must_use]
    pub fn all_frets() -> Self {
        Self::new(0, MAX_FRET)
    }

    pub(crate) fn is_string_span(&self) -> bool {
        self.low >= MIN_STRING && self.high <= MAX_STRING
    }

    pub(crate) fn is_fret_span(&self) -> bool {
        self.high <= MAX_FRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_out_of_range() {
        assert_eq!(
            NotePosition::try_new(0, 3).unwrap_err(),
            PositionError::InvalidString(0)
        );
        assert_eq!(
            NotePosition::try_new(7, 3).unwrap_err(),
            PositionError::InvalidString(7)
        );
        assert_eq!(
            NotePosition::try_new(2, -1).unwrap_err(),
            PositionError::InvalidFret(-1)
        );
        assert_eq!(
            NotePosition::try_new(2, 25).unwrap_err(),
            PositionError::InvalidFret(25)
        );
        assert_eq!(NotePosition::try_new(6, 24).unwrap(), NotePosition::new(6, 24));
    }

    #[test]
    fn key_round_trips() {
        let pos = NotePosition::new(3, 12);
        assert_eq!(pos.key(), "s3f12");
        assert_eq!("s3f12".parse::<NotePosition>().unwrap(), pos);
        assert!("3f12".parse::<NotePosition>().is_err());
        assert!("s3x12".parse::<NotePosition>().is_err());
        assert!(matches!(
            "s9f1".parse::<NotePosition>(),
            Err(PositionError::InvalidString(9))
        ));
    }

    #[test]
    fn packed_keys_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for string in MIN_STRING..=MAX_STRING {
            for fret in 0..=MAX_FRET {
                assert!(seen.insert(NotePosition::new(string, fret).packed()));
            }
        }
    }

    #[test]
    fn ordering_is_string_then_fret() {
        let mut positions = vec![
            NotePosition::new(2, 0),
            NotePosition::new(1, 5),
            NotePosition::new(1, 2),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                NotePosition::new(1, 2),
                NotePosition::new(1, 5),
                NotePosition::new(2, 0)
            ]
        );
    }

    #[test]
    fn shifted_drops_off_board() {
        let pos = NotePosition::new(1, 2);
        assert_eq!(pos.shifted(3), Some(NotePosition::new(1, 5)));
        assert_eq!(pos.shifted(-3), None);
        assert_eq!(NotePosition::new(1, 23).shifted(2), None);
        assert_eq!(pos.shifted(i32::MAX), None);
        assert_eq!(pos.shifted(i32::MIN), None);
    }

    #[test]
    fn span_normalizes_order() {
        let span = Span::new(7, 3);
        assert_eq!(span.low(), 3);
        assert_eq!(span.high(), 7);
        assert_eq!(span.count(), 5);
        assert!(span.contains(5));
        assert!(!span.contains(8));
    }
}
