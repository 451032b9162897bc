use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::pitch::PitchClass;
use crate::model::position::NotePosition;

/// A sounding note at a concrete fretboard position.
///
/// Produced by [`crate::model::Fretboard`]; validation and zone shapes read it
/// but never build one from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i8,
    pub string: u8,
    pub fret: u8,
    pub midi: u8,
}

impl Note {
    /// Builds a note from a MIDI number at a given position.
    #[must_use]
    pub fn from_midi(midi: u8, position: NotePosition) -> Self {
        Self {
            pitch_class: PitchClass::from_midi(midi),
            octave: octave_of(midi),
            string: position.string,
            fret: position.fret,
            midi,
        }
    }

    #[must_use]
    pub fn position(&self) -> NotePosition {
        NotePosition::new(self.string, self.fret)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Scientific-pitch octave of a MIDI number (60 is C4).
#[must_use]
pub fn octave_of(midi: u8) -> i8 {
    (i16::from(midi) / 12 - 1) as i8
}

/// MIDI number of `pitch_class` in `octave`, if it fits in 0..=127.
#[must_use]
pub fn midi_of(pitch_class: PitchClass, octave: i8) -> Option<u8> {
    let midi = (i16::from(octave) + 1) * 12 + i16::from(pitch_class.index());
    u8::try_from(midi).ok().filter(|m| *m <= 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_and_octave_agree() {
        assert_eq!(midi_of(PitchClass::C, 4), Some(60));
        assert_eq!(midi_of(PitchClass::E, 2), Some(40));
        assert_eq!(octave_of(60), 4);
        assert_eq!(octave_of(59), 3);
        assert_eq!(midi_of(PitchClass::C, -2), None);
        assert_eq!(midi_of(PitchClass::A, 9), None);
    }

    #[test]
    fn display_uses_scientific_pitch() {
        let note = Note::from_midi(61, NotePosition::new(2, 2));
        assert_eq!(note.to_string(), "C#4");
        assert_eq!(note.position(), NotePosition::new(2, 2));
    }
}
