#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use fret_core::Clock;

pub use error::{QuestionError, QuizConfigError, SessionError};

pub use sessions::{
    AnswerOutcome, Feedback, FeedbackKind, PauseState, ProgressSnapshot, Question, QuestionFilter,
    QuestionGenerator, QuizConfig, QuizEvent, QuizEventPayload, QuizEventType, QuizFlowController,
    QuizPhase, QuizResult, ScoreSnapshot, ZoneQuestionGenerator,
};
