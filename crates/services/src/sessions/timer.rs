use chrono::{DateTime, Duration, Utc};

/// A pausable one-shot countdown polled against a caller-supplied "now".
///
/// Pausing freezes the remaining time; resuming sets a fresh deadline from
/// it, so the total running time always equals the configured delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAdvanceTimer {
    scheduled_at: DateTime<Utc>,
    total_delay: Duration,
    remaining: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl AutoAdvanceTimer {
    /// Negative delays are treated as zero.
    #[must_use]
    pub fn start(now: DateTime<Utc>, delay: Duration) -> Self {
        let delay = delay.max(Duration::zero());
        Self {
            scheduled_at: now,
            total_delay: delay,
            remaining: delay,
            deadline: Some(now + delay),
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let Some(deadline) = self.deadline.take() {
            self.remaining = (deadline - now).max(Duration::zero());
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.remaining);
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.deadline.is_none()
    }

    /// Paused timers are never due.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.deadline {
            Some(deadline) => (deadline - now).max(Duration::zero()),
            None => self.remaining,
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    #[must_use]
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    #[must_use]
    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }
}
