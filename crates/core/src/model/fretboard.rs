use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::note::Note;
use crate::model::pitch::PitchClass;
use crate::model::position::{MAX_FRET, MAX_STRING, NotePosition};
use crate::model::zone::Zone;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TuningError {
    #[error("open string MIDI {midi} leaves no room for {frets} frets")]
    OutOfMidiRange { midi: u8, frets: u8 },
}

//
// ─── TUNING ────────────────────────────────────────────────────────────────────
//

/// Open-string MIDI numbers, indexed by string number minus one.
///
/// String 1 is the highest-pitched string, matching tablature convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TuningRecord")]
pub struct Tuning {
    open_strings: [u8; MAX_STRING as usize],
}

/// Unchecked serialized form; loading goes through [`Tuning::new`].
#[derive(Deserialize)]
struct TuningRecord {
    open_strings: [u8; MAX_STRING as usize],
}

impl TryFrom<TuningRecord> for Tuning {
    type Error = TuningError;

    fn try_from(record: TuningRecord) -> Result<Self, Self::Error> {
        Tuning::new(record.open_strings)
    }
}

impl Tuning {
    /// E4 B3 G3 D3 A2 E2.
    pub const STANDARD: Tuning = Tuning {
        open_strings: [64, 59, 55, 50, 45, 40],
    };

    /// # Errors
    ///
    /// Returns `TuningError::OutOfMidiRange` if the top fret of any string would
    /// exceed MIDI 127.
    pub fn new(open_strings: [u8; MAX_STRING as usize]) -> Result<Self, TuningError> {
        if let Some(&midi) = open_strings.iter().find(|m| u16::from(**m) + u16::from(MAX_FRET) > 127) {
            return Err(TuningError::OutOfMidiRange {
                midi,
                frets: MAX_FRET,
            });
        }
        Ok(Self { open_strings })
    }

    /// Open-string MIDI number for a 1-based string.
    #[must_use]
    pub fn open_midi(&self, string: u8) -> Option<u8> {
        let index = usize::from(string.checked_sub(1)?);
        self.open_strings.get(index).copied()
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::STANDARD
    }
}

//
// ─── FRETBOARD ─────────────────────────────────────────────────────────────────
//

/// Reference fretboard: maps positions to notes for a tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fretboard {
    tuning: Tuning,
}

impl Fretboard {
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning }
    }

    #[must_use]
    pub fn standard() -> Self {
        Self::new(Tuning::STANDARD)
    }

    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Note sounding at `string`/`fret`, or `None` off the board.
    #[must_use]
    pub fn note_at(&self, string: u8, fret: u8) -> Option<Note> {
        let position = NotePosition::new(string, fret);
        if !position.is_valid() {
            return None;
        }
        let open = self.tuning.open_midi(string)?;
        Some(Note::from_midi(open.checked_add(fret)?, position))
    }

    #[must_use]
    pub fn note_at_position(&self, position: NotePosition) -> Option<Note> {
        self.note_at(position.string, position.fret)
    }

    /// Every note on the board, ordered by string then fret.
    pub fn all_notes(&self) -> impl Iterator<Item = Note> + '_ {
        (1..=MAX_STRING)
            .flat_map(move |string| (0..=MAX_FRET).filter_map(move |fret| self.note_at(string, fret)))
    }

    /// Every position where `pitch_class` occurs.
    #[must_use]
    pub fn positions_of(&self, pitch_class: PitchClass) -> Vec<NotePosition> {
        self.all_notes()
            .filter(|note| note.pitch_class == pitch_class)
            .map(|note| note.position())
            .collect()
    }

    /// Notes for every position in the zone, in zone order.
    #[must_use]
    pub fn notes_in(&self, zone: &Zone) -> Vec<Note> {
        zone.positions()
            .filter_map(|pos| self.note_at_position(pos))
            .collect()
    }

    /// Distinct pitch classes present in the zone, in chromatic order.
    #[must_use]
    pub fn pitch_classes_in(&self, zone: &Zone) -> Vec<PitchClass> {
        let mut classes: Vec<PitchClass> = self
            .notes_in(zone)
            .into_iter()
            .map(|note| note.pitch_class)
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tuning_open_strings() {
        let board = Fretboard::standard();
        let high_e = board.note_at(1, 0).unwrap();
        assert_eq!(high_e.pitch_class, PitchClass::E);
        assert_eq!(high_e.octave, 4);
        assert_eq!(high_e.midi, 64);

        let low_e = board.note_at(6, 0).unwrap();
        assert_eq!(low_e.midi, 40);
        assert_eq!(low_e.octave, 2);

        assert_eq!(board.note_at(5, 3).unwrap().pitch_class, PitchClass::C);
        assert_eq!(board.note_at(5, 3).unwrap().midi, 48);
    }

    #[test]
    fn off_board_positions_have_no_note() {
        let board = Fretboard::standard();
        assert!(board.note_at(0, 0).is_none());
        assert!(board.note_at(7, 0).is_none());
        assert!(board.note_at(1, 25).is_none());
    }

    #[test]
    fn pitch_class_occurs_twice_or_thrice_per_string() {
        let board = Fretboard::standard();
        let positions = board.positions_of(PitchClass::E);
        // Frets 0, 12 and 24 on both E strings; 25 frets cover at least two octaves.
        assert!(positions.contains(&NotePosition::new(1, 0)));
        assert!(positions.contains(&NotePosition::new(1, 12)));
        assert!(positions.contains(&NotePosition::new(6, 24)));
        for string in 1..=6 {
            let count = positions.iter().filter(|p| p.string == string).count();
            assert!((2..=3).contains(&count));
        }
    }

    #[test]
    fn tuning_rejects_unplayable_range() {
        assert!(Tuning::new([120, 59, 55, 50, 45, 40]).is_err());
        let drop_d = Tuning::new([64, 59, 55, 50, 45, 38]).unwrap();
        assert_eq!(Fretboard::new(drop_d).note_at(6, 0).unwrap().pitch_class, PitchClass::D);
    }

    #[test]
    fn persisted_tuning_is_validated_on_load() {
        let bad = serde_json::from_str::<Tuning>(r#"{"open_strings":[250,59,55,50,45,40]}"#);
        assert!(bad.is_err());

        let json = serde_json::to_string(&Tuning::STANDARD).unwrap();
        let loaded: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, Tuning::STANDARD);
        assert_eq!(Fretboard::new(loaded).note_at(1, 12).unwrap().midi, 76);
    }
}
