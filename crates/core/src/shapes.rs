//! Zone constructors for common practice shapes, plus fret shifting.
//!
//! Every constructor validates its parameters and fails instead of clamping.
//! [`shift`] is the exception by contract: positions pushed off the board are
//! dropped and the result may be smaller or empty.

use rand::Rng;
use thiserror::Error;

use crate::model::{
    Fretboard, MAX_FRET, NotePosition, PitchClass, Span, Zone, midi_of,
};

/// Frets covered beyond the first one in a box position.
pub const DEFAULT_FRET_SPAN: u8 = 4;
/// Widest box accepted by [`position_zone`].
pub const MAX_FRET_SPAN: u8 = 12;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShapeError {
    #[error("string range {low}-{high} is outside 1-6")]
    InvalidStringRange { low: u8, high: u8 },

    #[error("fret range {low}-{high} is outside 0-24")]
    InvalidFretRange { low: u8, high: u8 },

    #[error("start fret {start} is after end fret {end}")]
    ReversedFrets { start: u8, end: u8 },

    #[error("string {0} is outside 1-6")]
    InvalidString(u8),

    #[error("position number {0} is outside 1-24")]
    InvalidPositionNumber(u8),

    #[error("fret span {0} is outside 1-12")]
    InvalidFretSpan(u8),

    #[error("octave count must be at least 1")]
    InvalidOctaveCount,

    #[error("{pitch_class}{octave} plus {octaves} octave(s) is outside the MIDI range")]
    OctaveOutOfRange {
        pitch_class: PitchClass,
        octave: i8,
        octaves: u8,
    },

    #[error("at least one pitch class is required")]
    EmptyPitchClasses,

    #[error("position {0} is off the fretboard")]
    InvalidPosition(NotePosition),
}

//
// ─── FILTER ────────────────────────────────────────────────────────────────────
//

/// Optional fret/string bounds applied to fretboard-wide shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    pub frets: Option<Span>,
    pub strings: Option<Span>,
}

impl ZoneFilter {
    #[must_use]
    pub fn frets(mut self, frets: Span) -> Self {
        self.frets = Some(frets);
        self
    }

    #[must_use]
    pub fn strings(mut self, strings: Span) -> Self {
        self.strings = Some(strings);
        self
    }

    fn validate(&self) -> Result<(), ShapeError> {
        if let Some(strings) = self.strings {
            check_strings(strings)?;
        }
        if let Some(frets) = self.frets {
            check_frets(frets)?;
        }
        Ok(())
    }

    fn accepts(&self, position: NotePosition) -> bool {
        self.frets.is_none_or(|f| f.contains(position.fret))
            && self.strings.is_none_or(|s| s.contains(position.string))
    }
}

fn check_strings(span: Span) -> Result<(), ShapeError> {
    if span.is_string_span() {
        Ok(())
    } else {
        Err(ShapeError::InvalidStringRange {
            low: span.low(),
            high: span.high(),
        })
    }
}

fn check_frets(span: Span) -> Result<(), ShapeError> {
    if span.is_fret_span() {
        Ok(())
    } else {
        Err(ShapeError::InvalidFretRange {
            low: span.low(),
            high: span.high(),
        })
    }
}

//
// ─── SHAPES ────────────────────────────────────────────────────────────────────
//

/// Every position in the cross product of the two ranges.
///
/// # Errors
///
/// Returns `ShapeError` if either range leaves the board.
pub fn rectangle(strings: Span, frets: Span, name: Option<&str>) -> Result<Zone, ShapeError> {
    check_strings(strings)?;
    check_frets(frets)?;
    let zone: Zone = strings
        .iter()
        .flat_map(|string| frets.iter().map(move |fret| NotePosition::new(string, fret)))
        .collect();
    Ok(zone.with_name(name))
}

/// Positions whose note lies in the inclusive MIDI window
/// `[midi(root, start_octave), midi(root, start_octave) + 12 * octaves]`.
///
/// # Errors
///
/// Returns `ShapeError` for a zero octave count, a window outside MIDI 0-127,
/// or filter bounds that leave the board.
pub fn octave_range(
    board: &Fretboard,
    root: PitchClass,
    start_octave: i8,
    octaves: u8,
    filter: ZoneFilter,
) -> Result<Zone, ShapeError> {
    if octaves == 0 {
        return Err(ShapeError::InvalidOctaveCount);
    }
    filter.validate()?;

    let out_of_range = ShapeError::OctaveOutOfRange {
        pitch_class: root,
        octave: start_octave,
        octaves,
    };
    let low = midi_of(root, start_octave).ok_or_else(|| out_of_range.clone())?;
    let high = u16::from(low) + 12 * u16::from(octaves);
    if high > 127 {
        return Err(out_of_range);
    }

    let zone: Zone = board
        .all_notes()
        .filter(|note| (u16::from(low)..=high).contains(&u16::from(note.midi)))
        .map(|note| note.position())
        .filter(|pos| filter.accepts(*pos))
        .collect();
    let end_octave = i16::from(start_octave) + i16::from(octaves);
    Ok(zone.with_name(Some(&format!("{root}{start_octave}-{root}{end_octave}"))))
}

/// Every occurrence of each requested pitch class.
///
/// # Errors
///
/// Returns `ShapeError::EmptyPitchClasses` if `classes` is empty, or a range
/// error for filter bounds that leave the board.
pub fn pitch_class_zone(
    board: &Fretboard,
    classes: &[PitchClass],
    filter: ZoneFilter,
) -> Result<Zone, ShapeError> {
    if classes.is_empty() {
        return Err(ShapeError::EmptyPitchClasses);
    }
    filter.validate()?;

    let zone: Zone = board
        .all_notes()
        .filter(|note| classes.contains(&note.pitch_class))
        .map(|note| note.position())
        .filter(|pos| filter.accepts(*pos))
        .collect();
    let names: Vec<&str> = classes.iter().map(|pc| pc.sharp_name()).collect();
    Ok(zone.with_name(Some(&names.join(" "))))
}

/// Box position: position 1 covers frets `0..=fret_span` (open strings
/// included), position N covers `N..=N + fret_span`. The top end is capped at
/// the last fret.
///
/// # Errors
///
/// Returns `ShapeError` for a position outside 1-24, a span outside 1-12, or
/// strings that leave the board.
pub fn position_zone(
    position: u8,
    fret_span: u8,
    strings: Option<Span>,
) -> Result<Zone, ShapeError> {
    if !(1..=MAX_FRET).contains(&position) {
        return Err(ShapeError::InvalidPositionNumber(position));
    }
    if !(1..=MAX_FRET_SPAN).contains(&fret_span) {
        return Err(ShapeError::InvalidFretSpan(fret_span));
    }
    let start = if position == 1 { 0 } else { position };
    let end = start.saturating_add(fret_span).min(MAX_FRET);
    let name = format!("Position {position}");
    rectangle(
        strings.unwrap_or_else(Span::all_strings),
        Span::new(start, end),
        Some(&name),
    )
}

/// Frets `start_fret..=end_fret` on one string. Conventional defaults are
/// `0..=12`.
///
/// # Errors
///
/// Returns `ShapeError` for an invalid string, frets past 24, or a start
/// fret after the end fret.
pub fn single_string_zone(
    string: u8,
    start_fret: u8,
    end_fret: u8,
    name: Option<&str>,
) -> Result<Zone, ShapeError> {
    if !Span::all_strings().contains(string) {
        return Err(ShapeError::InvalidString(string));
    }
    if start_fret > end_fret {
        return Err(ShapeError::ReversedFrets {
            start: start_fret,
            end: end_fret,
        });
    }
    let default_name = format!("String {string}");
    rectangle(
        Span::single(string),
        Span::new(start_fret, end_fret),
        Some(name.unwrap_or(&default_name)),
    )
}

/// Arbitrary pattern from explicit positions; duplicates collapse.
///
/// # Errors
///
/// Returns `ShapeError::InvalidPosition` for the first off-board position.
pub fn diagonal_zone(positions: &[NotePosition], name: Option<&str>) -> Result<Zone, ShapeError> {
    if let Some(bad) = positions.iter().find(|p| !p.is_valid()) {
        return Err(ShapeError::InvalidPosition(*bad));
    }
    Ok(Zone::from_positions(positions.iter().copied()).with_name(name))
}

//
// ─── BUILDER ───────────────────────────────────────────────────────────────────
//

/// Mutable zone editor. [`ZoneBuilder::build`] hands out a copy, so later
/// edits never reach a zone that was already built.
///
/// Off-board positions are ignored.
#[derive(Debug, Clone, Default)]
pub struct ZoneBuilder {
    zone: Zone,
}

impl ZoneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a copy of an existing zone.
    #[must_use]
    pub fn from_zone(zone: &Zone) -> Self {
        Self { zone: zone.clone() }
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.zone.set_name(Some(name.into()));
        self
    }

    pub fn add(&mut self, string: u8, fret: u8) -> &mut Self {
        self.zone.add(NotePosition::new(string, fret));
        self
    }

    pub fn remove(&mut self, string: u8, fret: u8) -> &mut Self {
        self.zone.remove(NotePosition::new(string, fret));
        self
    }

    /// Adds frets `start..=end` (either order) on one string.
    pub fn add_range(&mut self, string: u8, start: u8, end: u8) -> &mut Self {
        for fret in Span::new(start, end).iter() {
            self.zone.add(NotePosition::new(string, fret));
        }
        self
    }

    pub fn remove_range(&mut self, string: u8, start: u8, end: u8) -> &mut Self {
        for fret in Span::new(start, end).iter() {
            self.zone.remove(NotePosition::new(string, fret));
        }
        self
    }

    pub fn add_from_zone(&mut self, other: &Zone) -> &mut Self {
        self.zone.merge(other);
        self
    }

    pub fn remove_from_zone(&mut self, other: &Zone) -> &mut Self {
        self.zone.retain(|p| !other.contains(*p));
        self
    }

    /// Adds every occurrence of `pitch_class` on the board.
    pub fn add_pitch_class(&mut self, board: &Fretboard, pitch_class: PitchClass) -> &mut Self {
        self.zone.extend(board.positions_of(pitch_class));
        self
    }

    /// Removes every position; the name is kept.
    pub fn clear(&mut self) -> &mut Self {
        self.zone.clear();
        self
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.zone.size()
    }

    #[must_use]
    pub fn build(&self) -> Zone {
        self.zone.clone()
    }
}

//
// ─── SHIFTING ──────────────────────────────────────────────────────────────────
//

/// Offsets for which a shifted zone keeps at least one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRange {
    pub min_offset: i32,
    pub max_offset: i32,
}

impl ShiftRange {
    #[must_use]
    pub fn contains(&self, offset: i32) -> bool {
        (self.min_offset..=self.max_offset).contains(&offset)
    }
}

/// Moves every position by `fret_offset`. Positions leaving 0-24 are dropped.
/// The result keeps the source name unless `name` is given.
#[must_use]
pub fn shift(zone: &Zone, fret_offset: i32, name: Option<&str>) -> Zone {
    let shifted: Zone = zone
        .positions()
        .filter_map(|pos| pos.shifted(fret_offset))
        .collect();
    shifted.with_name(name.or(zone.name()))
}

/// `[-max_fret, 24 - min_fret]`, or `None` for an empty zone.
#[must_use]
pub fn shift_range(zone: &Zone) -> Option<ShiftRange> {
    let min = i32::from(zone.min_fret()?);
    let max = i32::from(zone.max_fret()?);
    Some(ShiftRange {
        min_offset: -max,
        max_offset: i32::from(MAX_FRET) - min,
    })
}

/// Uniform offset within [`shift_range`], further limited to
/// `[-max_shift, max_shift]` when given. Empty zones yield 0.
pub fn random_shift_offset<R: Rng + ?Sized>(
    zone: &Zone,
    max_shift: Option<u32>,
    rng: &mut R,
) -> i32 {
    let Some(range) = shift_range(zone) else {
        return 0;
    };
    let (low, high) = match max_shift {
        Some(limit) => {
            let limit = i32::try_from(limit).unwrap_or(i32::MAX);
            (range.min_offset.max(-limit), range.max_offset.min(limit))
        }
        None => (range.min_offset, range.max_offset),
    };
    // The range always straddles zero, so the intersection is never empty.
    rng.random_range(low..=high)
}
