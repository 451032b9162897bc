//! Progressive mastery: frets unlock one at a time per string, strings unlock
//! in a fixed order, driven by rolling accuracy and answer-speed statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Fretboard, MAX_FRET, MAX_STRING, MIN_STRING, Note, NotePosition};
use crate::time::Clock;

/// Newest progress record version this crate writes and fully understands.
pub const PROGRESS_FORMAT_VERSION: u32 = 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressiveError {
    #[error("minimum attempts to unlock must be > 0")]
    InvalidMinAttempts,

    #[error("accuracy threshold must be within 0-100, got {0}")]
    InvalidAccuracyThreshold(f64),

    #[error("time thresholds must be positive and finite")]
    InvalidTimeThreshold,

    #[error("frets per string must be within 1-25, got {0}")]
    InvalidFretsPerString(u8),

    #[error("string order must list each string 1-6 at most once and not be empty")]
    InvalidStringOrder,

    #[error("string {0} is outside 1-6")]
    InvalidString(u8),

    #[error("fret {0} is outside 0-24")]
    InvalidFret(u8),

    #[error("answer time must be finite and non-negative, got {0}")]
    InvalidAnswerTime(f64),

    #[error("string index {index} is outside the string order (len {len})")]
    InvalidStringIndex { index: usize, len: usize },

    #[error("progress data could not be parsed: {0}")]
    Unparseable(String),

    #[error("progress data is structurally invalid: {0}")]
    InvalidStructure(String),
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Unlock thresholds. All comparisons are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveConfig {
    pub min_attempts_to_unlock: u32,
    /// Percentage, 0-100.
    pub accuracy_threshold: f64,
    /// Seconds.
    pub average_time_threshold: f64,
    /// Answers slower than this (seconds) count toward accuracy but not speed.
    pub max_answer_time_to_count: f64,
    pub frets_per_string: u8,
    /// Learning order of strings, first entry first.
    pub string_order: Vec<u8>,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            min_attempts_to_unlock: 3,
            accuracy_threshold: 80.0,
            average_time_threshold: 3.0,
            max_answer_time_to_count: 10.0,
            frets_per_string: 12,
            string_order: vec![6, 5, 4, 3, 2, 1],
        }
    }
}

impl ProgressiveConfig {
    /// # Errors
    ///
    /// Returns the first `ProgressiveError` describing an invalid setting.
    pub fn validate(&self) -> Result<(), ProgressiveError> {
        if self.min_attempts_to_unlock == 0 {
            return Err(ProgressiveError::InvalidMinAttempts);
        }
        if !self.accuracy_threshold.is_finite() || !(0.0..=100.0).contains(&self.accuracy_threshold)
        {
            return Err(ProgressiveError::InvalidAccuracyThreshold(
                self.accuracy_threshold,
            ));
        }
        for threshold in [self.average_time_threshold, self.max_answer_time_to_count] {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ProgressiveError::InvalidTimeThreshold);
            }
        }
        if !(1..=MAX_FRET + 1).contains(&self.frets_per_string) {
            return Err(ProgressiveError::InvalidFretsPerString(self.frets_per_string));
        }
        let mut seen = [false; MAX_STRING as usize + 1];
        if self.string_order.is_empty() {
            return Err(ProgressiveError::InvalidStringOrder);
        }
        for &string in &self.string_order {
            if !(MIN_STRING..=MAX_STRING).contains(&string) || seen[usize::from(string)] {
                return Err(ProgressiveError::InvalidStringOrder);
            }
            seen[usize::from(string)] = true;
        }
        Ok(())
    }
}

//
// ─── FRET STATS ────────────────────────────────────────────────────────────────
//

/// Rolling performance for one string/fret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FretStats {
    pub attempts: u32,
    pub correct: u32,
    /// Seconds, only answers within `max_answer_time_to_count`.
    pub answer_times: Vec<f64>,
    pub last_attempt_time: Option<DateTime<Utc>>,
}

impl FretStats {
    /// Percentage correct, 0 with no attempts.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.correct) * 100.0 / f64::from(self.attempts)
    }

    #[must_use]
    pub fn average_time(&self) -> Option<f64> {
        if self.answer_times.is_empty() {
            return None;
        }
        Some(self.answer_times.iter().sum::<f64>() / self.answer_times.len() as f64)
    }

    fn qualifies(&self, config: &ProgressiveConfig) -> bool {
        self.attempts >= config.min_attempts_to_unlock
            && self.accuracy() >= config.accuracy_threshold
            && self
                .average_time()
                .is_some_and(|avg| avg <= config.average_time_threshold)
    }
}

//
// ─── UNLOCKS ───────────────────────────────────────────────────────────────────
//

/// What a recorded attempt unlocked, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unlock {
    /// The next fret on the current string.
    Fret { string: u8, fret: u8 },
    /// The current string was mastered; learning moved on to `string`.
    String { string: u8 },
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Persisted form; mirrors the in-memory state one to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub version: u32,
    pub performance: BTreeMap<u8, BTreeMap<u8, FretStats>>,
    pub unlocked_frets_per_string: BTreeMap<u8, u8>,
    pub current_string_index: usize,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Per-string fret unlocking based on how well unlocked frets are known.
///
/// A new fret unlocks only while every already unlocked fret on the current
/// string meets the thresholds at the same time. Unlocked counts never
/// decrease on their own.
#[derive(Debug, Clone)]
pub struct ProgressiveQuizState {
    config: ProgressiveConfig,
    performance: BTreeMap<u8, BTreeMap<u8, FretStats>>,
    unlocked_frets_per_string: BTreeMap<u8, u8>,
    current_string_index: usize,
    clock: Clock,
}

impl ProgressiveQuizState {
    /// Starts with a single unlocked fret on the first string.
    ///
    /// # Errors
    ///
    /// Returns `ProgressiveError` if the config is invalid.
    pub fn new(config: ProgressiveConfig) -> Result<Self, ProgressiveError> {
        config.validate()?;
        let mut state = Self {
            config,
            performance: BTreeMap::new(),
            unlocked_frets_per_string: BTreeMap::new(),
            current_string_index: 0,
            clock: Clock::default(),
        };
        state.reset();
        Ok(state)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProgressiveConfig {
        &self.config
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn current_string_index(&self) -> usize {
        self.current_string_index
    }

    /// String currently being learned.
    #[must_use]
    pub fn current_string(&self) -> u8 {
        self.config.string_order[self.current_string_index]
    }

    /// Number of unlocked frets on `string` (frets `0..n`).
    #[must_use]
    pub fn unlocked_frets(&self, string: u8) -> u8 {
        self.unlocked_frets_per_string
            .get(&string)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn fret_stats(&self, string: u8, fret: u8) -> Option<&FretStats> {
        self.performance.get(&string)?.get(&fret)
    }

    #[must_use]
    pub fn is_fret_qualified(&self, string: u8, fret: u8) -> bool {
        self.fret_stats(string, fret)
            .is_some_and(|stats| stats.qualifies(&self.config))
    }

    /// Every unlocked position, in learning order, then by fret.
    #[must_use]
    pub fn unlocked_positions(&self) -> Vec<NotePosition> {
        self.config
            .string_order
            .iter()
            .flat_map(|&string| {
                (0..self.unlocked_frets(string)).map(move |fret| NotePosition::new(string, fret))
            })
            .collect()
    }

    /// Notes for every unlocked position, named through the given fretboard.
    #[must_use]
    pub fn unlocked_notes(&self, board: &Fretboard) -> Vec<Note> {
        self.unlocked_positions()
            .into_iter()
            .filter_map(|pos| board.note_at_position(pos))
            .collect()
    }

    /// Accuracy across every recorded attempt, 0 with none.
    #[must_use]
    pub fn overall_accuracy(&self) -> f64 {
        let (attempts, correct) = self
            .performance
            .values()
            .flat_map(BTreeMap::values)
            .fold((0_u64, 0_u64), |(a, c), s| {
                (a + u64::from(s.attempts), c + u64::from(s.correct))
            });
        if attempts == 0 {
            0.0
        } else {
            correct as f64 * 100.0 / attempts as f64
        }
    }

    /// True once the last string in the order is fully unlocked and mastered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_string_index + 1 == self.config.string_order.len()
            && self.unlocked_frets(self.current_string()) == self.config.frets_per_string
            && self.all_unlocked_qualify(self.current_string())
    }

    /// Records one answer and promotes the learner if eligible.
    ///
    /// # Errors
    ///
    /// Returns `ProgressiveError` for an invalid string, fret or answer time.
    pub fn record_attempt(
        &mut self,
        string: u8,
        fret: u8,
        correct: bool,
        answer_time_secs: f64,
    ) -> Result<Option<Unlock>, ProgressiveError> {
        if !(MIN_STRING..=MAX_STRING).contains(&string) {
            return Err(ProgressiveError::InvalidString(string));
        }
        if fret > MAX_FRET {
            return Err(ProgressiveError::InvalidFret(fret));
        }
        if !answer_time_secs.is_finite() || answer_time_secs < 0.0 {
            return Err(ProgressiveError::InvalidAnswerTime(answer_time_secs));
        }

        let now = self.clock.now();
        let max_time = self.config.max_answer_time_to_count;
        let stats = self
            .performance
            .entry(string)
            .or_default()
            .entry(fret)
            .or_default();
        stats.attempts = stats.attempts.saturating_add(1);
        if correct {
            stats.correct = stats.correct.saturating_add(1);
        }
        if answer_time_secs <= max_time {
            stats.answer_times.push(answer_time_secs);
        }
        stats.last_attempt_time = Some(now);

        Ok(self.evaluate_unlock())
    }

    fn all_unlocked_qualify(&self, string: u8) -> bool {
        (0..self.unlocked_frets(string)).all(|fret| self.is_fret_qualified(string, fret))
    }

    fn evaluate_unlock(&mut self) -> Option<Unlock> {
        let string = self.current_string();
        if !self.all_unlocked_qualify(string) {
            return None;
        }

        let unlocked = self.unlocked_frets(string);
        if unlocked < self.config.frets_per_string {
            self.unlocked_frets_per_string.insert(string, unlocked + 1);
            tracing::debug!(string, fret = unlocked, "fret unlocked");
            return Some(Unlock::Fret {
                string,
                fret: unlocked,
            });
        }

        let next_index = self.current_string_index + 1;
        let &next = self.config.string_order.get(next_index)?;
        self.current_string_index = next_index;
        let seeded = self.unlocked_frets(next).max(1);
        self.unlocked_frets_per_string.insert(next, seeded);
        tracing::debug!(from = string, to = next, "string mastered, advancing");
        Some(Unlock::String { string: next })
    }

    /// Sets the unlocked fret count on the current string, skipping the
    /// qualification check. Clamped to `1..=frets_per_string`.
    pub fn force_unlock(&mut self, frets: u8) {
        let frets = frets.clamp(1, self.config.frets_per_string);
        self.unlocked_frets_per_string
            .insert(self.current_string(), frets);
    }

    /// Jumps to a string in the learning order. Every earlier string becomes
    /// fully unlocked; the target string keeps at least one unlocked fret.
    ///
    /// # Errors
    ///
    /// Returns `ProgressiveError::InvalidStringIndex` if `index` is outside the order.
    pub fn force_string_index(&mut self, index: usize) -> Result<(), ProgressiveError> {
        let len = self.config.string_order.len();
        if index >= len {
            return Err(ProgressiveError::InvalidStringIndex { index, len });
        }
        let full = self.config.frets_per_string;
        for &string in &self.config.string_order[..index] {
            self.unlocked_frets_per_string.insert(string, full);
        }
        let target = self.config.string_order[index];
        let seeded = self.unlocked_frets(target).max(1);
        self.unlocked_frets_per_string.insert(target, seeded);
        self.current_string_index = index;
        Ok(())
    }

    /// Clears all performance data and returns to one fret on the first string.
    pub fn reset(&mut self) {
        self.performance.clear();
        self.unlocked_frets_per_string.clear();
        self.current_string_index = 0;
        let first = self.current_string();
        self.unlocked_frets_per_string.insert(first, 1);
    }

    #[must_use]
    pub fn to_record(&self) -> ProgressRecord {
        ProgressRecord {
            version: PROGRESS_FORMAT_VERSION,
            performance: self.performance.clone(),
            unlocked_frets_per_string: self.unlocked_frets_per_string.clone(),
            current_string_index: self.current_string_index,
        }
    }

    /// Restores state saved with [`ProgressiveQuizState::to_record`]. A newer
    /// version is logged and read best-effort.
    ///
    /// # Errors
    ///
    /// Returns `ProgressiveError` if the config is invalid or the record does
    /// not fit it (unknown strings, frets past the board, index out of order).
    pub fn from_record(
        record: &ProgressRecord,
        config: ProgressiveConfig,
    ) -> Result<Self, ProgressiveError> {
        config.validate()?;
        if record.version == 0 {
            return Err(ProgressiveError::InvalidStructure(
                "version must be at least 1".to_string(),
            ));
        }
        if record.version > PROGRESS_FORMAT_VERSION {
            tracing::warn!(
                version = record.version,
                supported = PROGRESS_FORMAT_VERSION,
                "progress record is newer than supported, reading best-effort"
            );
        }
        if record.current_string_index >= config.string_order.len() {
            return Err(ProgressiveError::InvalidStringIndex {
                index: record.current_string_index,
                len: config.string_order.len(),
            });
        }
        for (&string, frets) in &record.performance {
            if !(MIN_STRING..=MAX_STRING).contains(&string) {
                return Err(ProgressiveError::InvalidString(string));
            }
            if let Some(&fret) = frets.keys().find(|&&f| f > MAX_FRET) {
                return Err(ProgressiveError::InvalidFret(fret));
            }
            for (&fret, stats) in frets {
                check_stats(string, fret, stats)?;
            }
        }
        for (&string, &count) in &record.unlocked_frets_per_string {
            if !(MIN_STRING..=MAX_STRING).contains(&string) {
                return Err(ProgressiveError::InvalidString(string));
            }
            if count > config.frets_per_string {
                return Err(ProgressiveError::InvalidStructure(format!(
                    "string {string} has {count} unlocked frets, more than {}",
                    config.frets_per_string
                )));
            }
        }

        let mut state = Self {
            config,
            performance: record.performance.clone(),
            unlocked_frets_per_string: record.unlocked_frets_per_string.clone(),
            current_string_index: record.current_string_index,
            clock: Clock::default(),
        };
        let current = state.current_string();
        if state.unlocked_frets(current) == 0 {
            state.unlocked_frets_per_string.insert(current, 1);
        }
        Ok(state)
    }

    /// # Errors
    ///
    /// Returns `ProgressiveError::InvalidStructure` if serialization fails.
    pub fn to_json(&self) -> Result<String, ProgressiveError> {
        serde_json::to_string(&self.to_record())
            .map_err(|e| ProgressiveError::InvalidStructure(e.to_string()))
    }

    /// # Errors
    ///
    /// `Unparseable` for invalid JSON, `InvalidStructure` for mistyped fields,
    /// plus anything [`ProgressiveQuizState::from_record`] rejects.
    pub fn from_json(input: &str, config: ProgressiveConfig) -> Result<Self, ProgressiveError> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| ProgressiveError::Unparseable(e.to_string()))?;
        let record: ProgressRecord = serde_json::from_value(value)
            .map_err(|e| ProgressiveError::InvalidStructure(e.to_string()))?;
        Self::from_record(&record, config)
    }
}

fn check_stats(string: u8, fret: u8, stats: &FretStats) -> Result<(), ProgressiveError> {
    let invalid = |detail: String| {
        Err(ProgressiveError::InvalidStructure(format!(
            "string {string} fret {fret}: {detail}"
        )))
    };
    if stats.correct > stats.attempts {
        return invalid(format!(
            "{} correct out of {} attempts",
            stats.correct, stats.attempts
        ));
    }
    if stats.answer_times.len() > stats.attempts as usize {
        return invalid(format!(
            "{} answer times for {} attempts",
            stats.answer_times.len(),
            stats.attempts
        ));
    }
    if let Some(time) = stats
        .answer_times
        .iter()
        .find(|t| !t.is_finite() || **t < 0.0)
    {
        return invalid(format!("answer time {time} is not a finite, non-negative number"));
    }
    Ok(())
}
