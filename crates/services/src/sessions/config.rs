use chrono::Duration;
use serde::{Deserialize, Serialize};

use fret_core::model::PitchClass;
use fret_core::validation::DEFAULT_MAX_ATTEMPTS;

use crate::error::QuizConfigError;

/// Longest accepted auto-advance delay.
pub const MAX_AUTO_ADVANCE_DELAY_MS: u32 = 60_000;

//
// ─── QUESTION FILTER ───────────────────────────────────────────────────────────
//

/// Narrows which pitch classes a question generator may ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    /// Only ask for these classes, when given.
    pub pitch_classes: Option<Vec<PitchClass>>,
    pub naturals_only: bool,
    /// Avoid asking for the same class twice in a row when another is available.
    pub avoid_repeats: bool,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self {
            pitch_classes: None,
            naturals_only: false,
            avoid_repeats: true,
        }
    }
}

impl QuestionFilter {
    #[must_use]
    pub fn allows(&self, pitch_class: PitchClass) -> bool {
        if self.naturals_only && !pitch_class.is_natural() {
            return false;
        }
        self.pitch_classes
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&pitch_class))
    }
}

//
// ─── QUIZ CONFIG ───────────────────────────────────────────────────────────────
//

/// Session settings for a [`super::QuizFlowController`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    pub total_questions: u32,
    pub auto_advance: bool,
    pub auto_advance_delay_ms: u32,
    pub max_attempts: u32,
    pub unlimited_attempts: bool,
    pub filter: QuestionFilter,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            total_questions: 10,
            auto_advance: true,
            auto_advance_delay_ms: 1_500,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            unlimited_attempts: false,
            filter: QuestionFilter::default(),
        }
    }
}

impl QuizConfig {
    /// # Errors
    ///
    /// Returns the first `QuizConfigError` describing an invalid setting.
    pub fn validate(&self) -> Result<(), QuizConfigError> {
        if self.total_questions == 0 {
            return Err(QuizConfigError::InvalidTotalQuestions);
        }
        if self.auto_advance_delay_ms > MAX_AUTO_ADVANCE_DELAY_MS {
            return Err(QuizConfigError::InvalidAutoAdvanceDelay {
                provided: self.auto_advance_delay_ms,
                max: MAX_AUTO_ADVANCE_DELAY_MS,
            });
        }
        if !self.unlimited_attempts && self.max_attempts == 0 {
            return Err(QuizConfigError::InvalidMaxAttempts);
        }
        if self
            .filter
            .pitch_classes
            .as_ref()
            .is_some_and(Vec::is_empty)
        {
            return Err(QuizConfigError::EmptyPitchClassFilter);
        }
        Ok(())
    }

    #[must_use]
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::milliseconds(i64::from(self.auto_advance_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = QuizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auto_advance_delay(), Duration::milliseconds(1500));
    }

    #[test]
    fn rejects_invalid_settings() {
        let config = QuizConfig {
            total_questions: 0,
            ..QuizConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            QuizConfigError::InvalidTotalQuestions
        );

        let config = QuizConfig {
            auto_advance_delay_ms: 90_000,
            ..QuizConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            QuizConfigError::InvalidAutoAdvanceDelay { provided: 90_000, .. }
        ));

        let config = QuizConfig {
            max_attempts: 0,
            ..QuizConfig::default()
        };
        assert_eq!(config.validate().unwrap_err(), QuizConfigError::InvalidMaxAttempts);

        let config = QuizConfig {
            max_attempts: 0,
            unlimited_attempts: true,
            ..QuizConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = QuizConfig {
            filter: QuestionFilter {
                pitch_classes: Some(Vec::new()),
                ..QuestionFilter::default()
            },
            ..QuizConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            QuizConfigError::EmptyPitchClassFilter
        );
    }

    #[test]
    fn filter_allows() {
        let filter = QuestionFilter {
            pitch_classes: Some(vec![PitchClass::C, PitchClass::CSharp]),
            naturals_only: true,
            avoid_repeats: false,
        };
        assert!(filter.allows(PitchClass::C));
        assert!(!filter.allows(PitchClass::CSharp));
        assert!(!filter.allows(PitchClass::D));
        assert!(QuestionFilter::default().allows(PitchClass::GSharp));
    }
}
