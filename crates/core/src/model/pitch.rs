use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PitchError {
    #[error("unknown note spelling: {0:?}")]
    UnknownSpelling(String),

    #[error("pitch class index {0} is out of range (expected 0-11)")]
    InvalidIndex(u8),
}

//
// ─── PITCH CLASS ───────────────────────────────────────────────────────────────
//

/// One of the twelve chromatic pitch classes, canonically spelled with sharps.
///
/// Serialized by its sharp name (`"C#"`), deserialized from any accepted spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        Self::C,
        Self::CSharp,
        Self::D,
        Self::DSharp,
        Self::E,
        Self::F,
        Self::FSharp,
        Self::G,
        Self::GSharp,
        Self::A,
        Self::ASharp,
        Self::B,
    ];

    /// Semitones above C (0-11).
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// # Errors
    ///
    /// Returns `PitchError::InvalidIndex` for values above 11.
    pub fn from_index(index: u8) -> Result<Self, PitchError> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(PitchError::InvalidIndex(index))
    }

    /// Pitch class of a MIDI note number.
    #[must_use]
    pub fn from_midi(midi: u8) -> Self {
        Self::ALL[usize::from(midi % 12)]
    }

    /// Canonical spelling (`"C#"`, never `"Db"`).
    #[must_use]
    pub fn sharp_name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::B => "B",
        }
    }

    /// Flat synonym for accidentals, `None` for naturals.
    #[must_use]
    pub fn flat_name(self) -> Option<&'static str> {
        match self {
            Self::CSharp => Some("Db"),
            Self::DSharp => Some("Eb"),
            Self::FSharp => Some("Gb"),
            Self::GSharp => Some("Ab"),
            Self::ASharp => Some("Bb"),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_natural(self) -> bool {
        self.flat_name().is_none()
    }

    /// Pitch class `semitones` above this one, wrapping at the octave.
    #[must_use]
    pub fn transpose(self, semitones: i32) -> Self {
        let index = (i32::from(self.index()) + semitones).rem_euclid(12);
        Self::ALL[index as usize]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}

impl FromStr for PitchClass {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_to_pitch_class(s)
    }
}

impl Serialize for PitchClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.sharp_name())
    }
}

impl<'de> Deserialize<'de> for PitchClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize_to_pitch_class(&raw).map_err(serde::de::Error::custom)
    }
}

//
// ─── SPELLING ──────────────────────────────────────────────────────────────────
//

/// Maps a note spelling to its pitch class.
///
/// Accepts the twelve sharp spellings and the five flat synonyms. The letter is
/// case-insensitive; `♯`/`♭` are accepted alongside `#`/`b`.
///
/// # Errors
///
/// Returns `PitchError::UnknownSpelling` for anything else, including
/// theoretical spellings such as `E#` or `Cb`.
pub fn normalize_to_pitch_class(spelling: &str) -> Result<PitchClass, PitchError> {
    let unknown = || PitchError::UnknownSpelling(spelling.to_string());
    let trimmed = spelling.trim();
    let mut chars = trimmed.chars();
    let letter = chars.next().ok_or_else(unknown)?.to_ascii_uppercase();
    let accidental: String = chars.collect();

    let natural = match letter {
        'C' => PitchClass::C,
        'D' => PitchClass::D,
        'E' => PitchClass::E,
        'F' => PitchClass::F,
        'G' => PitchClass::G,
        'A' => PitchClass::A,
        'B' => PitchClass::B,
        _ => return Err(unknown()),
    };

    let class = match accidental.as_str() {
        "" => natural,
        "#" | "♯" => natural.transpose(1),
        "b" | "♭" => natural.transpose(-1),
        _ => return Err(unknown()),
    };

    // Only spellings that exist in the sharp/flat table are accepted.
    let canonical = match accidental.as_str() {
        "" => class.is_natural(),
        _ => !class.is_natural(),
    };
    if canonical { Ok(class) } else { Err(unknown()) }
}

/// True when both spellings name the same pitch class. Unknown spellings are
/// never equivalent to anything.
#[must_use]
pub fn are_enharmonic_equivalent(a: &str, b: &str) -> bool {
    match (normalize_to_pitch_class(a), normalize_to_pitch_class(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// All accepted spellings of a pitch class: sharp first, then flat if any.
#[must_use]
pub fn enharmonic_spellings(pitch_class: PitchClass) -> Vec<&'static str> {
    let mut spellings = vec![pitch_class.sharp_name()];
    if let Some(flat) = pitch_class.flat_name() {
        spellings.push(flat);
    }
    spellings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flats_normalize_to_sharps() {
        assert_eq!(normalize_to_pitch_class("Db").unwrap(), PitchClass::CSharp);
        assert_eq!(normalize_to_pitch_class("Eb").unwrap(), PitchClass::DSharp);
        assert_eq!(normalize_to_pitch_class("Gb").unwrap(), PitchClass::FSharp);
        assert_eq!(normalize_to_pitch_class("Ab").unwrap(), PitchClass::GSharp);
        assert_eq!(normalize_to_pitch_class("Bb").unwrap(), PitchClass::ASharp);
    }

    #[test]
    fn naturals_and_sharps_pass_through() {
        for pc in PitchClass::ALL {
            assert_eq!(normalize_to_pitch_class(pc.sharp_name()).unwrap(), pc);
        }
        assert_eq!(normalize_to_pitch_class(" g ").unwrap(), PitchClass::G);
        assert_eq!(normalize_to_pitch_class("F♯").unwrap(), PitchClass::FSharp);
        assert_eq!(normalize_to_pitch_class("B♭").unwrap(), PitchClass::ASharp);
    }

    #[test]
    fn normalization_is_idempotent() {
        for pc in PitchClass::ALL {
            for spelling in enharmonic_spellings(pc) {
                let once = normalize_to_pitch_class(spelling).unwrap();
                let twice = normalize_to_pitch_class(once.sharp_name()).unwrap();
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn rejects_unknown_spellings() {
        for bad in ["", "H", "E#", "Cb", "Fb", "B#", "C##", "Dbb", "x"] {
            assert!(
                matches!(
                    normalize_to_pitch_class(bad),
                    Err(PitchError::UnknownSpelling(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn enharmonic_equivalence_is_symmetric() {
        let spellings = ["C", "C#", "Db", "D", "Eb", "D#", "A#", "Bb", "B", "nope"];
        for a in spellings {
            for b in spellings {
                assert_eq!(are_enharmonic_equivalent(a, b), are_enharmonic_equivalent(b, a));
            }
        }
        assert!(are_enharmonic_equivalent("C#", "Db"));
        assert!(!are_enharmonic_equivalent("C", "Db"));
        assert!(!are_enharmonic_equivalent("nope", "nope"));
    }

    #[test]
    fn spellings_list_sharp_then_flat() {
        assert_eq!(enharmonic_spellings(PitchClass::E), vec!["E"]);
        assert_eq!(enharmonic_spellings(PitchClass::GSharp), vec!["G#", "Ab"]);
    }

    #[test]
    fn serde_uses_sharp_names() {
        let json = serde_json::to_string(&PitchClass::ASharp).unwrap();
        assert_eq!(json, "\"A#\"");
        let parsed: PitchClass = serde_json::from_str("\"Bb\"").unwrap();
        assert_eq!(parsed, PitchClass::ASharp);
    }

    #[test]
    fn transpose_wraps() {
        assert_eq!(PitchClass::B.transpose(1), PitchClass::C);
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
        assert_eq!(PitchClass::from_midi(64), PitchClass::E);
    }
}
