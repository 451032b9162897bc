//! Answer checking and per-question attempt tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Note, PitchClass, PitchError, normalize_to_pitch_class};

/// Attempts allowed per question unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

//
// ─── VALIDATION RESULT ─────────────────────────────────────────────────────────
//

/// Outcome of checking one clicked note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_correct: bool,
    pub clicked_pitch_class: PitchClass,
    pub target_pitch_class: PitchClass,
    /// Correct, but the target was spelled differently from the clicked note's
    /// canonical name (e.g. target `Db`, clicked `C#`).
    pub was_enharmonic_match: bool,
    /// Same MIDI number. Always `false` against a pitch-class target.
    pub is_exact_pitch_match: bool,
    pub feedback_message: String,
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// Attempt ceiling, or remaining attempts under that ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptLimit {
    Limited(u32),
    Unlimited,
}

impl fmt::Display for AttemptLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptLimit::Limited(n) => write!(f, "{n}"),
            AttemptLimit::Unlimited => f.write_str("∞"),
        }
    }
}

/// Attempt bookkeeping for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    pub attempts: u32,
    /// Wrong answers given so far, each listed once, in the order first given.
    pub incorrect_pitch_classes: Vec<PitchClass>,
    pub max_attempts: AttemptLimit,
    /// Set once `attempts >= max_attempts`, whether or not the last try was
    /// correct. Never set with unlimited attempts.
    pub max_attempts_reached: bool,
}

impl AttemptState {
    #[must_use]
    pub fn new(max_attempts: AttemptLimit) -> Self {
        Self {
            attempts: 0,
            incorrect_pitch_classes: Vec::new(),
            max_attempts,
            max_attempts_reached: false,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> AttemptLimit {
        match self.max_attempts {
            AttemptLimit::Limited(max) => AttemptLimit::Limited(max.saturating_sub(self.attempts)),
            AttemptLimit::Unlimited => AttemptLimit::Unlimited,
        }
    }
}

//
// ─── VALIDATOR ─────────────────────────────────────────────────────────────────
//

/// Checks answers by pitch class and tracks attempts for one question at a time.
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    limit: AttemptLimit,
    state: AttemptState,
}

impl AnswerValidator {
    /// `unlimited_attempts` overrides `max_attempts`. A limit of zero is
    /// treated as one.
    #[must_use]
    pub fn new(max_attempts: u32, unlimited_attempts: bool) -> Self {
        let limit = if unlimited_attempts {
            AttemptLimit::Unlimited
        } else {
            AttemptLimit::Limited(max_attempts.max(1))
        };
        Self {
            limit,
            state: AttemptState::new(limit),
        }
    }

    #[must_use]
    pub fn limit(&self) -> AttemptLimit {
        self.limit
    }

    /// Correctness by pitch class only; octave and string are ignored.
    #[must_use]
    pub fn validate_answer(&self, clicked: &Note, target: PitchClass) -> ValidationResult {
        build_class_result(clicked, target, target.sharp_name())
    }

    /// Like [`AnswerValidator::validate_answer`] with the target given as a
    /// spelling, so an enharmonic match can be reported.
    ///
    /// # Errors
    ///
    /// Returns `PitchError` if the target spelling is unknown.
    pub fn validate_answer_spelled(
        &self,
        clicked: &Note,
        target_spelling: &str,
    ) -> Result<ValidationResult, PitchError> {
        let target = normalize_to_pitch_class(target_spelling)?;
        Ok(build_class_result(clicked, target, target_spelling.trim()))
    }

    /// Correct on matching pitch class; `is_exact_pitch_match` additionally
    /// requires the same MIDI number.
    #[must_use]
    pub fn validate_exact_note(&self, clicked: &Note, target: &Note) -> ValidationResult {
        let is_correct = clicked.pitch_class == target.pitch_class;
        let is_exact = is_correct && clicked.midi == target.midi;
        let feedback_message = if is_exact {
            format!("Correct! That's {target}.")
        } else if is_correct {
            format!(
                "Right note, different octave: you played {clicked}, the target was {target}."
            )
        } else {
            format!("Not quite. You played {clicked}, the target was {target}.")
        };
        ValidationResult {
            is_correct,
            clicked_pitch_class: clicked.pitch_class,
            target_pitch_class: target.pitch_class,
            was_enharmonic_match: false,
            is_exact_pitch_match: is_exact,
            feedback_message,
        }
    }

    /// Records one submission and returns the updated state.
    pub fn record_attempt(&mut self, is_correct: bool, pitch_class: Option<PitchClass>) -> AttemptState {
        let state = &mut self.state;
        state.attempts = state.attempts.saturating_add(1);
        if !is_correct {
            if let Some(pc) = pitch_class {
                if !state.incorrect_pitch_classes.contains(&pc) {
                    state.incorrect_pitch_classes.push(pc);
                }
            }
        }
        if let AttemptLimit::Limited(max) = self.limit {
            state.max_attempts_reached = state.attempts >= max;
        }
        state.clone()
    }

    pub fn reset_attempts(&mut self) {
        self.state = AttemptState::new(self.limit);
    }

    #[must_use]
    pub fn can_attempt(&self) -> bool {
        !self.state.max_attempts_reached
    }

    #[must_use]
    pub fn remaining_attempts(&self) -> AttemptLimit {
        self.state.remaining()
    }

    #[must_use]
    pub fn attempt_state(&self) -> &AttemptState {
        &self.state
    }
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, false)
    }
}

/// Whether `spelling` names `pitch_class` by its sharp (or natural) letter,
/// ignoring case and the accidental's form (`#` or `♯`).
fn same_letter(spelling: &str, pitch_class: PitchClass) -> bool {
    let letter = spelling.trim().chars().next().map(|c| c.to_ascii_uppercase());
    letter == pitch_class.sharp_name().chars().next()
}

fn build_class_result(clicked: &Note, target: PitchClass, target_spelling: &str) -> ValidationResult {
    let is_correct = clicked.pitch_class == target;
    let was_enharmonic_match = is_correct && !same_letter(target_spelling, clicked.pitch_class);
    let feedback_message = if was_enharmonic_match {
        format!(
            "Correct! {} is the same note as {target_spelling}.",
            clicked.pitch_class
        )
    } else if is_correct {
        format!("Correct! That's {target_spelling}.")
    } else {
        format!(
            "Not quite. That was {}, you were looking for {target_spelling}.",
            clicked.pitch_class
        )
    };
    ValidationResult {
        is_correct,
        clicked_pitch_class: clicked.pitch_class,
        target_pitch_class: target,
        was_enharmonic_match,
        is_exact_pitch_match: false,
        feedback_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fretboard;

    fn note(string: u8, fret: u8) -> Note {
        Fretboard::standard().note_at(string, fret).unwrap()
    }

    #[test]
    fn class_validation_ignores_octave_and_string() {
        let validator = AnswerValidator::default();
        // A on the open 5th string and A on the 1st string, 5th fret.
        for clicked in [note(5, 0), note(1, 5), note(6, 17)] {
            let result = validator.validate_answer(&clicked, PitchClass::A);
            assert!(result.is_correct);
            assert!(!result.is_exact_pitch_match);
            assert!(!result.was_enharmonic_match);
        }

        let wrong = validator.validate_answer(&note(5, 2), PitchClass::A);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.clicked_pitch_class, PitchClass::B);
        assert!(wrong.feedback_message.contains("looking for A"));
    }

    #[test]
    fn spelled_target_reports_enharmonic_match() {
        let validator = AnswerValidator::default();
        let c_sharp = note(5, 4);
        let result = validator.validate_answer_spelled(&c_sharp, "Db").unwrap();
        assert!(result.is_correct);
        assert!(result.was_enharmonic_match);
        assert_eq!(result.target_pitch_class, PitchClass::CSharp);

        let result = validator.validate_answer_spelled(&c_sharp, "C#").unwrap();
        assert!(result.is_correct);
        assert!(!result.was_enharmonic_match);

        assert!(validator.validate_answer_spelled(&c_sharp, "H").is_err());
    }

    #[test]
    fn spelling_case_and_symbol_do_not_count_as_enharmonic() {
        let validator = AnswerValidator::default();
        let c_sharp = note(5, 4);
        for spelling in ["c#", "C♯", " C# "] {
            let result = validator.validate_answer_spelled(&c_sharp, spelling).unwrap();
            assert!(result.is_correct, "{spelling}");
            assert!(!result.was_enharmonic_match, "{spelling}");
        }
        for spelling in ["db", "D♭"] {
            let result = validator.validate_answer_spelled(&c_sharp, spelling).unwrap();
            assert!(result.was_enharmonic_match, "{spelling}");
        }
        let a = validator.validate_answer_spelled(&note(5, 0), "a").unwrap();
        assert!(a.is_correct);
        assert!(!a.was_enharmonic_match);
    }

    #[test]
    fn exact_validation_distinguishes_octaves() {
        let validator = AnswerValidator::default();
        let a2 = note(5, 0);
        let a4 = note(1, 5);

        let same = validator.validate_exact_note(&a2, &note(6, 5));
        assert!(same.is_correct);
        assert!(same.is_exact_pitch_match);

        let octave_off = validator.validate_exact_note(&a4, &a2);
        assert!(octave_off.is_correct);
        assert!(!octave_off.is_exact_pitch_match);
        assert!(octave_off.feedback_message.contains("different octave"));

        let wrong = validator.validate_exact_note(&note(5, 1), &a2);
        assert!(!wrong.is_correct);
        assert!(!wrong.is_exact_pitch_match);
    }

    #[test]
    fn max_attempts_reached_even_when_last_attempt_is_correct() {
        let mut validator = AnswerValidator::new(3, false);
        validator.record_attempt(false, Some(PitchClass::C));
        validator.record_attempt(false, Some(PitchClass::D));
        assert!(validator.can_attempt());
        assert_eq!(validator.remaining_attempts(), AttemptLimit::Limited(1));

        let state = validator.record_attempt(true, Some(PitchClass::E));
        assert!(state.max_attempts_reached);
        assert_eq!(state.attempts, 3);
        assert_eq!(state.incorrect_pitch_classes, vec![PitchClass::C, PitchClass::D]);
        assert!(!validator.can_attempt());
        assert_eq!(validator.remaining_attempts(), AttemptLimit::Limited(0));
    }

    #[test]
    fn incorrect_classes_are_listed_once() {
        let mut validator = AnswerValidator::new(5, false);
        validator.record_attempt(false, Some(PitchClass::C));
        let state = validator.record_attempt(false, Some(PitchClass::C));
        assert_eq!(state.incorrect_pitch_classes, vec![PitchClass::C]);
        assert_eq!(state.attempts, 2);
    }

    #[test]
    fn unlimited_attempts_never_max_out() {
        let mut validator = AnswerValidator::new(3, true);
        for _ in 0..100 {
            let state = validator.record_attempt(false, None);
            assert!(!state.max_attempts_reached);
        }
        assert!(validator.can_attempt());
        assert_eq!(validator.remaining_attempts(), AttemptLimit::Unlimited);
    }

    #[test]
    fn reset_clears_state() {
        let mut validator = AnswerValidator::new(1, false);
        validator.record_attempt(false, Some(PitchClass::G));
        assert!(!validator.can_attempt());
        validator.reset_attempts();
        assert!(validator.can_attempt());
        assert_eq!(validator.attempt_state().attempts, 0);
        assert!(validator.attempt_state().incorrect_pitch_classes.is_empty());
    }
}
