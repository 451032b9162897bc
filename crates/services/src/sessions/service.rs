use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use fret_core::Clock;
use fret_core::model::{Note, Zone};
use fret_core::validation::{AnswerValidator, AttemptState, ValidationResult};

use super::config::QuizConfig;
use super::events::{EventBus, ListenerError, ListenerId, QuizEvent, QuizEventPayload, QuizEventType};
use super::progress::{Feedback, FeedbackKind, ProgressSnapshot, QuizResult, ScoreSnapshot};
use super::question::{Question, QuestionGenerator, ZoneQuestionGenerator};
use super::timer::AutoAdvanceTimer;
use crate::error::{QuestionError, QuizConfigError, SessionError};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    Idle,
    Active,
    Hint,
    Complete,
}

/// Orthogonal to [`QuizPhase`] while a quiz is active or showing a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseState {
    Running,
    Paused,
    AutoAdvancePending,
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub validation: ValidationResult,
    pub attempts: AttemptState,
    pub show_hint: bool,
    pub auto_advance_scheduled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Score {
    correct: u32,
    total: u32,
    hints_used: u32,
    total_attempts: u32,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one quiz over a zone: asks questions, checks answers, keeps score
/// and schedules auto-advance.
///
/// Single-threaded and cooperative. The auto-advance countdown only fires
/// from [`QuizFlowController::tick`], which the host calls from its own loop.
pub struct QuizFlowController {
    config: QuizConfig,
    clock: Clock,
    generator: Box<dyn QuestionGenerator + Send>,
    validator: AnswerValidator,
    events: EventBus,

    phase: QuizPhase,
    pause_state: PauseState,
    paused_at: Option<DateTime<Utc>>,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    active_zone: Option<Zone>,
    current_question: Option<Question>,
    question_number: u32,
    question_resolved: bool,
    score: Score,
    feedback: Option<Feedback>,
    timer: Option<AutoAdvanceTimer>,
    last_error: Option<QuestionError>,
    result: Option<QuizResult>,
}

impl QuizFlowController {
    /// Uses [`ZoneQuestionGenerator`] on a standard-tuned fretboard and the
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError` if the configuration is invalid.
    pub fn new(config: QuizConfig) -> Result<Self, QuizConfigError> {
        config.validate()?;
        let validator = validator_for(&config);
        Ok(Self {
            config,
            clock: Clock::default(),
            generator: Box::new(ZoneQuestionGenerator::default()),
            validator,
            events: EventBus::new(),
            phase: QuizPhase::Idle,
            pause_state: PauseState::Running,
            paused_at: None,
            session_id: None,
            started_at: None,
            active_zone: None,
            current_question: None,
            question_number: 0,
            question_resolved: false,
            score: Score::default(),
            feedback: None,
            timer: None,
            last_error: None,
            result: None,
        })
    }

    #[must_use]
    pub fn with_generator(mut self, generator: impl QuestionGenerator + Send + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Lets tests and simulations move a fixed clock forward.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    // ─── lifecycle ───────────────────────────────────────────────────────────

    /// Starts a quiz over a copy of `zone`.
    ///
    /// Allowed from idle or complete. On failure the controller is left as it
    /// was before the call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` while a quiz is running,
    /// `SessionError::EmptyZone` for an empty zone, or
    /// `SessionError::Question` when the first question cannot be generated.
    pub fn start(&mut self, zone: &Zone) -> Result<(), SessionError> {
        if matches!(self.phase, QuizPhase::Active | QuizPhase::Hint) {
            return Err(SessionError::AlreadyActive);
        }
        if zone.is_empty() {
            return Err(SessionError::EmptyZone);
        }

        let zone = zone.clone();
        let first = match self.generator.generate(&zone, &self.config.filter, 1) {
            Ok(question) => question,
            Err(err) => {
                tracing::warn!(error = %err, "could not generate the first quiz question");
                return Err(err.into());
            }
        };

        let now = self.clock.now();
        let session_id = Uuid::new_v4();
        self.clear_session();
        self.validator = validator_for(&self.config);
        self.phase = QuizPhase::Active;
        self.session_id = Some(session_id);
        self.started_at = Some(now);
        self.question_number = 1;
        let zone_size = zone.size();
        self.active_zone = Some(zone);
        self.current_question = Some(first.clone());

        tracing::debug!(%session_id, zone_size, "quiz started");
        self.emit(QuizEventPayload::QuizStarted {
            session_id,
            zone_size,
            total_questions: self.config.total_questions,
        });
        self.emit(QuizEventPayload::QuestionReady { question: first });
        Ok(())
    }

    /// Returns to idle from any state, dropping the zone, score and any
    /// pending auto-advance.
    pub fn reset(&mut self) {
        self.clear_session();
        self.validator = validator_for(&self.config);
        self.emit(QuizEventPayload::QuizReset);
    }

    /// Ends the controller's life, dropping every listener and the zone.
    pub fn dispose(mut self) {
        self.timer = None;
        self.events.remove_all_listeners(None);
        self.active_zone = None;
    }

    /// Validates and applies a new configuration. The attempt limit takes
    /// effect from the next question.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError` and keeps the current configuration if the
    /// new one is invalid.
    pub fn update_config(&mut self, config: QuizConfig) -> Result<(), QuizConfigError> {
        config.validate()?;
        self.config = config;
        if matches!(self.phase, QuizPhase::Idle | QuizPhase::Complete) {
            self.validator = validator_for(&self.config);
        }
        Ok(())
    }

    // ─── answering ───────────────────────────────────────────────────────────

    /// Checks `note` against the current question.
    ///
    /// Returns `None`, changing nothing, unless a question is open for
    /// answers: the quiz is active, running and the question not yet
    /// resolved.
    pub fn submit_answer(&mut self, note: &Note) -> Option<AnswerOutcome> {
        if self.phase != QuizPhase::Active
            || self.pause_state != PauseState::Running
            || self.question_resolved
        {
            return None;
        }
        let question = self.current_question.as_ref()?;
        let target = question.target_pitch_class;
        let hint_positions = question.target_notes_in_zone.clone();

        let validation = self.validator.validate_answer(note, target);
        let attempts = self
            .validator
            .record_attempt(validation.is_correct, Some(validation.clicked_pitch_class));
        self.score.total_attempts = self.score.total_attempts.saturating_add(1);

        let mut show_hint = false;
        let mut auto_advance_scheduled = false;
        if validation.is_correct {
            self.score.correct += 1;
            self.score.total += 1;
            self.question_resolved = true;
            self.feedback = Some(Feedback {
                kind: FeedbackKind::Correct,
                message: validation.feedback_message.clone(),
                positions: Vec::new(),
            });
            if self.config.auto_advance {
                self.timer = Some(AutoAdvanceTimer::start(
                    self.clock.now(),
                    self.config.auto_advance_delay(),
                ));
                self.pause_state = PauseState::AutoAdvancePending;
                auto_advance_scheduled = true;
            }
        } else if attempts.max_attempts_reached {
            self.score.total += 1;
            self.question_resolved = true;
            self.phase = QuizPhase::Hint;
            show_hint = true;
            self.feedback = Some(Feedback {
                kind: FeedbackKind::Hint,
                message: format!("The answer was {target}. Here is where it sits in the zone."),
                positions: hint_positions.clone(),
            });
        } else {
            self.feedback = Some(Feedback {
                kind: FeedbackKind::Incorrect,
                message: validation.feedback_message.clone(),
                positions: Vec::new(),
            });
        }

        self.emit(QuizEventPayload::AnswerProcessed {
            validation: validation.clone(),
            attempts: attempts.clone(),
        });
        if auto_advance_scheduled {
            if let Some(timer) = &self.timer {
                let payload = QuizEventPayload::AutoAdvanceScheduled {
                    delay_ms: timer.total_delay().num_milliseconds(),
                    deadline: timer.deadline().unwrap_or_else(|| timer.scheduled_at()),
                };
                self.emit(payload);
            }
        }
        if show_hint {
            self.emit(QuizEventPayload::HintShown {
                positions: hint_positions,
            });
        }

        Some(AnswerOutcome {
            validation,
            attempts,
            show_hint,
            auto_advance_scheduled,
        })
    }

    /// Fires the auto-advance countdown once the clock reaches its deadline.
    /// Returns whether the quiz advanced.
    pub fn tick(&mut self) -> bool {
        if self.phase != QuizPhase::Active || self.pause_state != PauseState::AutoAdvancePending {
            return false;
        }
        let now = self.clock.now();
        if !self.timer.as_ref().is_some_and(|timer| timer.is_due(now)) {
            return false;
        }
        self.timer = None;
        self.pause_state = PauseState::Running;
        self.advance();
        true
    }

    /// Moves on without waiting for auto-advance. Any pending countdown is
    /// dropped. Not available while paused or showing a hint.
    pub fn advance_to_next_question(&mut self) -> bool {
        if self.phase != QuizPhase::Active || self.pause_state == PauseState::Paused {
            return false;
        }
        self.timer = None;
        self.pause_state = PauseState::Running;
        self.advance();
        true
    }

    /// Closes the hint and moves on, counting one hint used.
    pub fn acknowledge_hint(&mut self) -> bool {
        if self.phase != QuizPhase::Hint || self.pause_state == PauseState::Paused {
            return false;
        }
        self.score.hints_used += 1;
        self.phase = QuizPhase::Active;
        self.pause_state = PauseState::Running;
        self.advance();
        true
    }

    /// Drops a pending auto-advance, leaving the current question on screen.
    pub fn cancel_auto_advance(&mut self) -> bool {
        let Some(timer) = self.timer.take() else {
            return false;
        };
        let remaining_ms = timer.remaining(self.clock.now()).num_milliseconds();
        if self.pause_state == PauseState::AutoAdvancePending {
            self.pause_state = PauseState::Running;
        }
        self.emit(QuizEventPayload::AutoAdvanceCancelled { remaining_ms });
        true
    }

    // ─── pause ───────────────────────────────────────────────────────────────

    /// Freezes the quiz, keeping whatever time is left on a pending
    /// auto-advance. Returns `false` if already paused or no quiz is running.
    pub fn pause(&mut self) -> bool {
        if !matches!(self.phase, QuizPhase::Active | QuizPhase::Hint)
            || self.pause_state == PauseState::Paused
        {
            return false;
        }
        let now = self.clock.now();
        let remaining_ms = self.timer.as_mut().map(|timer| {
            timer.pause(now);
            timer.remaining(now).num_milliseconds()
        });
        self.pause_state = PauseState::Paused;
        self.paused_at = Some(now);
        self.emit(QuizEventPayload::QuizPaused { remaining_ms });
        true
    }

    /// Returns `false` unless paused.
    pub fn resume(&mut self) -> bool {
        if self.pause_state != PauseState::Paused {
            return false;
        }
        let now = self.clock.now();
        let deadline = self.timer.as_mut().and_then(|timer| {
            timer.resume(now);
            timer.deadline()
        });
        self.pause_state = if self.timer.is_some() {
            PauseState::AutoAdvancePending
        } else {
            PauseState::Running
        };
        self.paused_at = None;
        self.emit(QuizEventPayload::QuizResumed { deadline });
        true
    }

    // ─── queries ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn pause_state(&self) -> PauseState {
        self.pause_state
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause_state == PauseState::Paused
    }

    #[must_use]
    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    #[must_use]
    pub fn active_zone(&self) -> Option<&Zone> {
        self.active_zone.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn attempt_state(&self) -> &AttemptState {
        self.validator.attempt_state()
    }

    /// Fresh snapshot on every call.
    #[must_use]
    pub fn score(&self) -> ScoreSnapshot {
        ScoreSnapshot::new(
            self.score.correct,
            self.score.total,
            self.score.hints_used,
            self.score.total_attempts,
        )
    }

    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.question_number, self.config.total_questions)
    }

    #[must_use]
    pub fn auto_advance_deadline(&self) -> Option<DateTime<Utc>> {
        self.timer.as_ref().and_then(AutoAdvanceTimer::deadline)
    }

    #[must_use]
    pub fn auto_advance_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.timer.as_ref().map(|timer| timer.remaining(now))
    }

    /// Generator failure for the current question, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&QuestionError> {
        self.last_error.as_ref()
    }

    /// Set once the quiz completes.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    // ─── events ──────────────────────────────────────────────────────────────

    pub fn on<F>(&mut self, event_type: QuizEventType, listener: F) -> ListenerId
    where
        F: FnMut(&QuizEvent) -> Result<(), ListenerError> + Send + 'static,
    {
        self.events.on(event_type, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    pub fn remove_all_listeners(&mut self, event_type: Option<QuizEventType>) {
        self.events.remove_all_listeners(event_type);
    }

    // ─── internals ───────────────────────────────────────────────────────────

    fn emit(&mut self, payload: QuizEventPayload) {
        let now = self.clock.now();
        self.events.emit(now, payload);
    }

    fn clear_session(&mut self) {
        self.phase = QuizPhase::Idle;
        self.pause_state = PauseState::Running;
        self.paused_at = None;
        self.session_id = None;
        self.started_at = None;
        self.active_zone = None;
        self.current_question = None;
        self.question_number = 0;
        self.question_resolved = false;
        self.score = Score::default();
        self.feedback = None;
        self.timer = None;
        self.last_error = None;
        self.result = None;
    }

    /// Moves to the next question, or completes the quiz after the last one.
    fn advance(&mut self) {
        self.feedback = None;
        self.question_resolved = false;
        self.last_error = None;

        if self.question_number >= self.config.total_questions {
            self.complete();
            return;
        }

        self.question_number += 1;
        self.validator = validator_for(&self.config);
        let Some(zone) = self.active_zone.as_ref() else {
            self.current_question = None;
            return;
        };
        match self
            .generator
            .generate(zone, &self.config.filter, self.question_number)
        {
            Ok(question) => {
                self.current_question = Some(question.clone());
                self.emit(QuizEventPayload::QuestionReady { question });
            }
            Err(err) => {
                tracing::warn!(
                    question_number = self.question_number,
                    error = %err,
                    "question generation failed"
                );
                self.current_question = None;
                let message = err.to_string();
                self.last_error = Some(err);
                self.emit(QuizEventPayload::QuestionFailed {
                    question_number: self.question_number,
                    message,
                });
            }
        }
    }

    fn complete(&mut self) {
        let now = self.clock.now();
        self.phase = QuizPhase::Complete;
        self.pause_state = PauseState::Running;
        self.timer = None;
        self.current_question = None;
        let result = QuizResult {
            session_id: self.session_id.unwrap_or_else(Uuid::nil),
            score: self.score(),
            total_questions: self.config.total_questions,
            zone_size: self.active_zone.as_ref().map_or(0, Zone::size),
            started_at: self.started_at.unwrap_or(now),
            completed_at: now,
        };
        tracing::debug!(
            session_id = %result.session_id,
            accuracy = result.score.accuracy,
            "quiz completed"
        );
        self.result = Some(result.clone());
        self.emit(QuizEventPayload::QuizCompleted { result });
    }
}

fn validator_for(config: &QuizConfig) -> AnswerValidator {
    AnswerValidator::new(config.max_attempts, config.unlimited_attempts)
}
