mod fretboard;
mod note;
mod pitch;
mod position;
mod zone;
mod zone_codec;

pub use fretboard::{Fretboard, Tuning, TuningError};
pub use note::{Note, midi_of, octave_of};
pub use pitch::{
    PitchClass, PitchError, are_enharmonic_equivalent, enharmonic_spellings,
    normalize_to_pitch_class,
};
pub use position::{MAX_FRET, MAX_STRING, MIN_STRING, NotePosition, PositionError, Span};
pub use zone::Zone;
pub use zone_codec::{PositionRecord, ZONE_FORMAT_VERSION, ZoneFormatError, ZoneRecord};
