//! Shared error types for the services crate.

use thiserror::Error;

/// Invalid quiz configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("total questions must be > 0")]
    InvalidTotalQuestions,
    #[error("auto-advance delay must be at most {max} ms, got {provided}")]
    InvalidAutoAdvanceDelay { provided: u32, max: u32 },
    #[error("max attempts must be > 0 unless attempts are unlimited")]
    InvalidMaxAttempts,
    #[error("pitch class filter must not be empty when given")]
    EmptyPitchClassFilter,
}

/// Failures reported by a question generator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("zone has no positions to ask about")]
    EmptyZone,
    #[error("no pitch class in the zone matches the question filter")]
    NoCandidates,
    #[error("question generation failed: {0}")]
    Generator(String),
}

/// Errors emitted by the quiz session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot start a quiz with an empty zone")]
    EmptyZone,
    #[error("a quiz is already in progress")]
    AlreadyActive,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] QuizConfigError),
}
