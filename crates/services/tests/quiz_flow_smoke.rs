use std::sync::{Arc, Mutex};

use fret_core::model::{Fretboard, Note, Span, Zone};
use fret_core::shapes::{position_zone, rectangle};
use fret_core::time::fixed_clock;
use services::{
    PauseState, QuizConfig, QuizEventType, QuizFlowController, QuizPhase, SessionError,
    ZoneQuestionGenerator,
};

fn quiz(config: QuizConfig) -> QuizFlowController {
    QuizFlowController::new(config)
        .unwrap()
        .with_clock(fixed_clock())
        .with_generator(ZoneQuestionGenerator::seeded(Fretboard::standard(), 7))
}

fn right_answer(quiz: &QuizFlowController) -> Note {
    let question = quiz.current_question().expect("question is open");
    let position = question.target_notes_in_zone[0];
    Fretboard::standard().note_at_position(position).unwrap()
}

fn wrong_answer(quiz: &QuizFlowController) -> Note {
    let board = Fretboard::standard();
    let target = quiz.current_question().unwrap().target_pitch_class;
    quiz.active_zone()
        .unwrap()
        .positions()
        .filter_map(|pos| board.note_at_position(pos))
        .find(|note| note.pitch_class != target)
        .expect("zone has more than one pitch class")
}

#[test]
fn empty_zone_fails_and_stays_idle() {
    let mut quiz = quiz(QuizConfig::default());
    assert_eq!(quiz.start(&Zone::new()), Err(SessionError::EmptyZone));
    assert_eq!(quiz.phase(), QuizPhase::Idle);
}

#[test]
fn single_question_quiz_completes_after_auto_advance() {
    let mut quiz = quiz(QuizConfig {
        total_questions: 1,
        ..QuizConfig::default()
    });
    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    quiz.on(QuizEventType::QuizCompleted, move |event| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });

    let zone = rectangle(Span::new(2, 5), Span::new(3, 7), Some("box")).unwrap();
    assert_eq!(zone.size(), 20);
    quiz.start(&zone).unwrap();

    let answer = right_answer(&quiz);
    let outcome = quiz.submit_answer(&answer).unwrap();
    assert!(outcome.validation.is_correct);

    let delay = quiz.config().auto_advance_delay();
    quiz.clock_mut().advance(delay + chrono::Duration::milliseconds(1));
    assert!(quiz.tick());

    assert_eq!(quiz.phase(), QuizPhase::Complete);
    let score = quiz.score();
    assert!((score.accuracy - 100.0).abs() < f64::EPSILON);
    assert_eq!(score.display(), "1/1 (100%)");
    assert_eq!(completed.lock().unwrap().len(), 1);
    assert_eq!(quiz.result().unwrap().zone_size, 20);
}

#[test]
fn pause_does_not_stretch_the_countdown() {
    let mut quiz = quiz(QuizConfig {
        auto_advance_delay_ms: 2_000,
        ..QuizConfig::default()
    });
    quiz.start(&position_zone(5, 4, None).unwrap()).unwrap();
    let answer = right_answer(&quiz);
    quiz.submit_answer(&answer).unwrap();
    let answered_at = quiz.clock_mut().now();

    quiz.clock_mut().advance_millis(800);
    assert!(quiz.pause());
    let paused_at = quiz.clock_mut().now();
    quiz.clock_mut().advance_millis(45_000);
    assert!(!quiz.tick());
    assert!(quiz.resume());
    let resumed_at = quiz.clock_mut().now();

    let mut advanced_at = None;
    for _ in 0..40 {
        quiz.clock_mut().advance_millis(50);
        if quiz.tick() {
            advanced_at = Some(quiz.clock_mut().now());
            break;
        }
    }
    let advanced_at = advanced_at.expect("auto-advance fired");
    let active = (paused_at - answered_at) + (advanced_at - resumed_at);
    assert!((active.num_milliseconds() - 2_000).abs() <= 50);
    assert_eq!(quiz.question_number(), 2);
    assert_eq!(quiz.pause_state(), PauseState::Running);
}

#[test]
fn full_quiz_with_hints_and_misbehaving_listeners() {
    let mut quiz = quiz(QuizConfig {
        total_questions: 4,
        auto_advance: false,
        max_attempts: 2,
        ..QuizConfig::default()
    });
    quiz.on(QuizEventType::QuestionReady, |_| Err("listener failed".into()));
    quiz.on(QuizEventType::QuestionReady, |_| -> Result<(), services::sessions::ListenerError> {
        panic!("listener bug")
    });
    let ready = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&ready);
    quiz.on(QuizEventType::QuestionReady, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let zone = rectangle(Span::new(1, 6), Span::new(0, 4), None).unwrap();
    quiz.start(&zone).unwrap();

    for n in 1..=4 {
        assert_eq!(quiz.progress().display(), format!("Question {n} of 4"));
        if n % 2 == 0 {
            let miss = wrong_answer(&quiz);
            quiz.submit_answer(&miss).unwrap();
            let outcome = quiz.submit_answer(&miss).unwrap();
            assert!(outcome.show_hint);
            assert_eq!(quiz.phase(), QuizPhase::Hint);
            assert!(quiz.acknowledge_hint());
        } else {
            let answer = right_answer(&quiz);
            assert!(quiz.submit_answer(&answer).unwrap().validation.is_correct);
            assert!(quiz.advance_to_next_question());
        }
    }

    assert_eq!(quiz.phase(), QuizPhase::Complete);
    assert_eq!(*ready.lock().unwrap(), 4);
    let score = quiz.score();
    assert_eq!(score.correct, 2);
    assert_eq!(score.total, 4);
    assert_eq!(score.hints_used, 2);
    assert_eq!(score.total_attempts, 6);
    assert!((score.accuracy - 50.0).abs() < f64::EPSILON);

    let result = quiz.result().unwrap();
    assert_eq!(Some(result.session_id), quiz.session_id());
    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json["score"]["hints_used"], 2);

    quiz.dispose();
}
