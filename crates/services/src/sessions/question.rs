use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use fret_core::model::{Fretboard, Note, NotePosition, PitchClass, Zone};

use super::config::QuestionFilter;
use crate::error::QuestionError;

/// One quiz prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub target_pitch_class: PitchClass,
    pub root_note: Option<Note>,
    pub question_text: String,
    pub question_number: u32,
    /// Zone positions that count as a correct answer.
    pub target_notes_in_zone: Vec<NotePosition>,
}

/// Produces questions constrained to a zone.
///
/// A failure is final for the question being asked; callers surface it and
/// never substitute a question of their own.
pub trait QuestionGenerator {
    /// # Errors
    ///
    /// Returns `QuestionError` when no question can be asked for the zone.
    fn generate(
        &mut self,
        zone: &Zone,
        filter: &QuestionFilter,
        question_number: u32,
    ) -> Result<Question, QuestionError>;
}

/// "Find this note" questions over the pitch classes present in a zone.
#[derive(Debug, Clone)]
pub struct ZoneQuestionGenerator {
    board: Fretboard,
    rng: StdRng,
    last_target: Option<PitchClass>,
}

impl ZoneQuestionGenerator {
    #[must_use]
    pub fn new(board: Fretboard) -> Self {
        Self {
            board,
            rng: StdRng::from_os_rng(),
            last_target: None,
        }
    }

    /// Deterministic generator for tests and replays.
    #[must_use]
    pub fn seeded(board: Fretboard, seed: u64) -> Self {
        Self {
            board,
            rng: StdRng::seed_from_u64(seed),
            last_target: None,
        }
    }
}

impl Default for ZoneQuestionGenerator {
    fn default() -> Self {
        Self::new(Fretboard::standard())
    }
}

impl QuestionGenerator for ZoneQuestionGenerator {
    fn generate(
        &mut self,
        zone: &Zone,
        filter: &QuestionFilter,
        question_number: u32,
    ) -> Result<Question, QuestionError> {
        if zone.is_empty() {
            return Err(QuestionError::EmptyZone);
        }

        let mut candidates: Vec<PitchClass> = self
            .board
            .pitch_classes_in(zone)
            .into_iter()
            .filter(|pc| filter.allows(*pc))
            .collect();
        if filter.avoid_repeats && candidates.len() > 1 {
            if let Some(last) = self.last_target {
                candidates.retain(|pc| *pc != last);
            }
        }

        let &target = candidates
            .choose(&mut self.rng)
            .ok_or(QuestionError::NoCandidates)?;
        self.last_target = Some(target);

        let target_notes_in_zone: Vec<NotePosition> = self
            .board
            .notes_in(zone)
            .into_iter()
            .filter(|note| note.pitch_class == target)
            .map(|note| note.position())
            .collect();
        let question_text = match zone.name() {
            Some(name) => format!("Find {target} in {name}"),
            None => format!("Find {target}"),
        };

        Ok(Question {
            target_pitch_class: target,
            root_note: None,
            question_text,
            question_number,
            target_notes_in_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fret_core::model::Span;
    use fret_core::shapes::rectangle;

    #[test]
    fn targets_come_from_the_zone() {
        let board = Fretboard::standard();
        let zone = rectangle(Span::new(5, 6), Span::new(0, 3), Some("low box")).unwrap();
        let present = board.pitch_classes_in(&zone);
        let mut generator = ZoneQuestionGenerator::seeded(board, 42);

        for n in 1..=20 {
            let question = generator
                .generate(&zone, &QuestionFilter::default(), n)
                .unwrap();
            assert!(present.contains(&question.target_pitch_class));
            assert_eq!(question.question_number, n);
            assert!(!question.target_notes_in_zone.is_empty());
            for pos in &question.target_notes_in_zone {
                assert!(zone.contains(*pos));
                assert_eq!(
                    board.note_at_position(*pos).unwrap().pitch_class,
                    question.target_pitch_class
                );
            }
            assert!(question.question_text.ends_with("in low box"));
        }
    }

    #[test]
    fn avoids_immediate_repeats() {
        let zone = rectangle(Span::new(1, 6), Span::new(0, 12), None).unwrap();
        let mut generator = ZoneQuestionGenerator::seeded(Fretboard::standard(), 3);
        let filter = QuestionFilter::default();
        let mut last = None;
        for n in 1..=50 {
            let target = generator.generate(&zone, &filter, n).unwrap().target_pitch_class;
            assert_ne!(Some(target), last);
            last = Some(target);
        }
    }

    #[test]
    fn single_candidate_may_repeat() {
        let zone = Zone::from_positions([NotePosition::new(6, 0), NotePosition::new(1, 0)]);
        let mut generator = ZoneQuestionGenerator::seeded(Fretboard::standard(), 1);
        for n in 1..=3 {
            let question = generator.generate(&zone, &QuestionFilter::default(), n).unwrap();
            assert_eq!(question.target_pitch_class, PitchClass::E);
            assert_eq!(question.target_notes_in_zone.len(), 2);
        }
    }

    #[test]
    fn filter_can_exclude_everything() {
        // F# only.
        let zone = Zone::from_positions([NotePosition::new(6, 2)]);
        let mut generator = ZoneQuestionGenerator::seeded(Fretboard::standard(), 1);
        let filter = QuestionFilter {
            naturals_only: true,
            ..QuestionFilter::default()
        };
        assert_eq!(
            generator.generate(&zone, &filter, 1).unwrap_err(),
            QuestionError::NoCandidates
        );
        assert_eq!(
            generator
                .generate(&Zone::new(), &QuestionFilter::default(), 1)
                .unwrap_err(),
            QuestionError::EmptyZone
        );
    }
}
