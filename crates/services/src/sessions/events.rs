//! Quiz lifecycle events and the listener registry that delivers them.
//!
//! Listeners run synchronously in registration order. A listener that returns
//! an error or panics is logged and skipped; the remaining listeners still run
//! and the controller's state is unaffected.

use std::error::Error as StdError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use fret_core::model::NotePosition;
use fret_core::validation::{AttemptState, ValidationResult};

use super::progress::QuizResult;
use super::question::Question;

pub type ListenerError = Box<dyn StdError + Send + Sync>;

type Listener = Box<dyn FnMut(&QuizEvent) -> Result<(), ListenerError> + Send>;

//
// ─── EVENT TYPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizEventType {
    QuizStarted,
    QuestionReady,
    AnswerProcessed,
    AutoAdvanceScheduled,
    AutoAdvanceCancelled,
    HintShown,
    QuizPaused,
    QuizResumed,
    QuizCompleted,
    QuizReset,
    QuestionFailed,
}

impl fmt::Display for QuizEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuizEventType::QuizStarted => "quizStarted",
            QuizEventType::QuestionReady => "questionReady",
            QuizEventType::AnswerProcessed => "answerProcessed",
            QuizEventType::AutoAdvanceScheduled => "autoAdvanceScheduled",
            QuizEventType::AutoAdvanceCancelled => "autoAdvanceCancelled",
            QuizEventType::HintShown => "hintShown",
            QuizEventType::QuizPaused => "quizPaused",
            QuizEventType::QuizResumed => "quizResumed",
            QuizEventType::QuizCompleted => "quizCompleted",
            QuizEventType::QuizReset => "quizReset",
            QuizEventType::QuestionFailed => "questionFailed",
        };
        f.write_str(name)
    }
}

/// Event data. Each variant carries what a listener needs without querying
/// the controller back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuizEventPayload {
    QuizStarted {
        session_id: Uuid,
        zone_size: usize,
        total_questions: u32,
    },
    QuestionReady {
        question: Question,
    },
    AnswerProcessed {
        validation: ValidationResult,
        attempts: AttemptState,
    },
    AutoAdvanceScheduled {
        delay_ms: i64,
        deadline: DateTime<Utc>,
    },
    AutoAdvanceCancelled {
        remaining_ms: i64,
    },
    HintShown {
        positions: Vec<NotePosition>,
    },
    QuizPaused {
        remaining_ms: Option<i64>,
    },
    QuizResumed {
        deadline: Option<DateTime<Utc>>,
    },
    QuizCompleted {
        result: QuizResult,
    },
    QuizReset,
    QuestionFailed {
        question_number: u32,
        message: String,
    },
}

impl QuizEventPayload {
    #[must_use]
    pub fn event_type(&self) -> QuizEventType {
        match self {
            QuizEventPayload::QuizStarted { .. } => QuizEventType::QuizStarted,
            QuizEventPayload::QuestionReady { .. } => QuizEventType::QuestionReady,
            QuizEventPayload::AnswerProcessed { .. } => QuizEventType::AnswerProcessed,
            QuizEventPayload::AutoAdvanceScheduled { .. } => QuizEventType::AutoAdvanceScheduled,
            QuizEventPayload::AutoAdvanceCancelled { .. } => QuizEventType::AutoAdvanceCancelled,
            QuizEventPayload::HintShown { .. } => QuizEventType::HintShown,
            QuizEventPayload::QuizPaused { .. } => QuizEventType::QuizPaused,
            QuizEventPayload::QuizResumed { .. } => QuizEventType::QuizResumed,
            QuizEventPayload::QuizCompleted { .. } => QuizEventType::QuizCompleted,
            QuizEventPayload::QuizReset => QuizEventType::QuizReset,
            QuizEventPayload::QuestionFailed { .. } => QuizEventType::QuestionFailed,
        }
    }
}

/// A delivered event. `sequence` increases by one per emitted event and
/// timestamps never go backwards within a bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizEvent {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: QuizEventPayload,
}

impl QuizEvent {
    #[must_use]
    pub fn event_type(&self) -> QuizEventType {
        self.payload.event_type()
    }
}

//
// ─── BUS ───────────────────────────────────────────────────────────────────────
//

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    event_type: QuizEventType,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    registrations: Vec<Registration>,
    next_id: u64,
    next_sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.registrations.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, event_type: QuizEventType, listener: F) -> ListenerId
    where
        F: FnMut(&QuizEvent) -> Result<(), ListenerError> + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            event_type,
            listener: Box::new(listener),
        });
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Removes listeners for one event type, or all of them.
    pub fn remove_all_listeners(&mut self, event_type: Option<QuizEventType>) {
        match event_type {
            Some(event_type) => self.registrations.retain(|r| r.event_type != event_type),
            None => self.registrations.clear(),
        }
    }

    #[must_use]
    pub fn listener_count(&self, event_type: QuizEventType) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    /// Stamps the payload and delivers it to every matching listener.
    pub fn emit(&mut self, now: DateTime<Utc>, payload: QuizEventPayload) -> QuizEvent {
        let timestamp = match self.last_timestamp {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        let event = QuizEvent {
            sequence: self.next_sequence,
            timestamp,
            payload,
        };
        self.next_sequence += 1;

        let event_type = event.event_type();
        for registration in self
            .registrations
            .iter_mut()
            .filter(|r| r.event_type == event_type)
        {
            let outcome = catch_unwind(AssertUnwindSafe(|| (registration.listener)(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(event = %event_type, error = %err, "quiz event listener failed");
                }
                Err(_) => {
                    tracing::warn!(event = %event_type, "quiz event listener panicked");
                }
            }
        }
        event
    }
}
