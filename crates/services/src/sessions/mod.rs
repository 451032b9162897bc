mod config;
mod events;
mod progress;
mod question;
mod service;
mod timer;

// Public API of the quiz session subsystem.
pub use crate::error::{QuestionError, QuizConfigError, SessionError};
pub use config::{MAX_AUTO_ADVANCE_DELAY_MS, QuestionFilter, QuizConfig};
pub use events::{EventBus, ListenerError, ListenerId, QuizEvent, QuizEventPayload, QuizEventType};
pub use progress::{Feedback, FeedbackKind, ProgressSnapshot, QuizResult, ScoreSnapshot};
pub use question::{Question, QuestionGenerator, ZoneQuestionGenerator};
pub use service::{AnswerOutcome, PauseState, QuizFlowController, QuizPhase};
pub use timer::AutoAdvanceTimer;
