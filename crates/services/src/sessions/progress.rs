use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use fret_core::model::NotePosition;

/// Score as of the moment it was taken.
///
/// `total` counts finished questions: answered correctly, or ended by a hint.
/// `total_attempts` counts every submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSnapshot {
    pub correct: u32,
    pub total: u32,
    pub hints_used: u32,
    pub total_attempts: u32,
    /// Percentage in `0.0..=100.0`; zero before any question is finished.
    pub accuracy: f64,
}

impl ScoreSnapshot {
    #[must_use]
    pub fn new(correct: u32, total: u32, hints_used: u32, total_attempts: u32) -> Self {
        let accuracy = if total == 0 {
            0.0
        } else {
            f64::from(correct) * 100.0 / f64::from(total)
        };
        Self {
            correct,
            total,
            hints_used,
            total_attempts,
            accuracy,
        }
    }

    /// e.g. `3/4 (75%)`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}/{} ({:.0}%)", self.correct, self.total, self.accuracy)
    }
}

/// Position within the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub current_question: u32,
    pub total_questions: u32,
    pub percentage: f64,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(current_question: u32, total_questions: u32) -> Self {
        let percentage = if total_questions == 0 {
            0.0
        } else {
            f64::from(current_question.min(total_questions)) * 100.0 / f64::from(total_questions)
        };
        Self {
            current_question,
            total_questions,
            percentage,
        }
    }

    /// e.g. `Question 3 of 10`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "Question {} of {}",
            self.current_question, self.total_questions
        )
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub session_id: Uuid,
    pub score: ScoreSnapshot,
    pub total_questions: u32,
    pub zone_size: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Correct,
    Incorrect,
    Hint,
}

/// What the UI should show about the last answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
    /// Positions to highlight; populated for hints.
    pub positions: Vec<NotePosition>,
}
