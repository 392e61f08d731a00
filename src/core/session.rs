//! Per-connection alerting state machine.
//!
//! [`SessionState`] turns a stream of per-sample classifications into two
//! decisions: an immediate fall alert, and a rate-limited vibration alert
//! driven by the share of incorrect posture in the trailing window. It does
//! no I/O; callers act on the returned [`AlertDecision`].

use super::classification::Classification;
use super::window::PostureWindow;
use crate::policy::AlertPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the caller should do after a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub fall_alert: bool,
    pub vibration_alert: bool,
}

impl AlertDecision {
    pub fn any(&self) -> bool {
        self.fall_alert || self.vibration_alert
    }
}

/// Running counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    pub samples: u64,
    pub correct: u64,
    pub incorrect: u64,
    pub vibration_alerts: u64,
    pub fall_alerts: u64,
}

/// Totals for a finished session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub tally: SessionTally,
    /// Percentage of classified samples judged correct, `None` if no sample
    /// had a posture verdict
    pub correctness_percentage: Option<f64>,
}

/// Mutable state owned by exactly one connection.
///
/// # Example
///
/// ```rust
/// use spinewatch::core::{Classification, FallVerdict, SessionState};
/// use spinewatch::policy::AlertPolicy;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let mut session = SessionState::new(AlertPolicy::default(), now);
///
/// let fall = Classification::new(None, Some(FallVerdict { fall: true, confidence: 0.9 }));
/// let decision = session.on_sample(&fall, now);
///
/// assert!(decision.fall_alert);
/// assert!(!decision.vibration_alert);
/// assert!(session.history().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct SessionState {
    policy: AlertPolicy,
    history: PostureWindow,
    last_vibration: Option<DateTime<Utc>>,
    started_at: DateTime<Utc>,
    tally: SessionTally,
}

impl SessionState {
    pub fn new(policy: AlertPolicy, started_at: DateTime<Utc>) -> Self {
        Self {
            policy,
            history: PostureWindow::new(),
            last_vibration: None,
            started_at,
            tally: SessionTally::default(),
        }
    }

    /// Feed one classified sample observed at `now`.
    ///
    /// `now` must not decrease between calls on the same session.
    pub fn on_sample(&mut self, classification: &Classification, now: DateTime<Utc>) -> AlertDecision {
        self.tally.samples += 1;

        let fall_alert = classification.is_fall();

        if let Some(correct) = classification.posture_correct() {
            self.history.push(now, correct);
            if correct {
                self.tally.correct += 1;
            } else {
                self.tally.incorrect += 1;
            }
        }

        self.history.evict(now, self.policy.window());

        let vibration_alert = self.should_vibrate(now);
        if vibration_alert {
            self.last_vibration = Some(now);
            self.tally.vibration_alerts += 1;
        }
        if fall_alert {
            self.tally.fall_alerts += 1;
        }

        AlertDecision {
            fall_alert,
            vibration_alert,
        }
    }

    fn should_vibrate(&self, now: DateTime<Utc>) -> bool {
        if self.history.len() < self.policy.min_samples {
            return false;
        }
        let Some(ratio) = self.history.incorrect_ratio() else {
            return false;
        };
        ratio >= self.policy.incorrect_ratio && self.cooldown_elapsed(now)
    }

    /// Whether a vibration would be allowed at `now` as far as spacing goes.
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.last_vibration
            .is_none_or(|last| now.signed_duration_since(last) >= self.policy.cooldown())
    }

    pub fn history(&self) -> &PostureWindow {
        &self.history
    }

    pub fn last_vibration(&self) -> Option<DateTime<Utc>> {
        self.last_vibration
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn tally(&self) -> SessionTally {
        self.tally
    }

    pub fn summary(&self, ended_at: DateTime<Utc>) -> SessionSummary {
        let judged = self.tally.correct + self.tally.incorrect;
        let correctness_percentage =
            (judged > 0).then(|| self.tally.correct as f64 / judged as f64 * 100.0);

        SessionSummary {
            started_at: self.started_at,
            ended_at,
            tally: self.tally,
            correctness_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classification::{FallVerdict, PostureVerdict};
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn posture(correct: bool) -> Classification {
        Classification::new(
            Some(PostureVerdict {
                correct,
                confidence: 0.8,
            }),
            None,
        )
    }

    fn fall() -> Classification {
        Classification::new(
            None,
            Some(FallVerdict {
                fall: true,
                confidence: 0.95,
            }),
        )
    }

    fn session() -> SessionState {
        SessionState::new(AlertPolicy::default(), t(0))
    }

    /// Feed `incorrect` bad samples then `correct` good ones, all within one
    /// second, returning the decision for the last sample.
    fn feed(session: &mut SessionState, incorrect: usize, correct: usize, base: i64) -> AlertDecision {
        let mut last = AlertDecision::default();
        for i in 0..(incorrect + correct) {
            let now = t(base) + Duration::milliseconds(i as i64 * 5);
            last = session.on_sample(&posture(i >= incorrect), now);
        }
        last
    }

    #[test]
    fn sixty_one_percent_incorrect_fires_on_hundredth_sample() {
        let mut session = session();
        let decision = feed(&mut session, 61, 39, 0);

        assert!(decision.vibration_alert);
        assert!(!decision.fall_alert);
        assert!(session.last_vibration().is_some());
    }

    #[test]
    fn fifty_nine_percent_incorrect_does_not_fire() {
        let mut session = session();
        let decision = feed(&mut session, 59, 41, 0);

        assert!(!decision.vibration_alert);
        assert!(session.last_vibration().is_none());
    }

    #[test]
    fn exactly_sixty_percent_fires() {
        let mut session = session();
        let decision = feed(&mut session, 60, 40, 0);
        assert!(decision.vibration_alert);
    }

    #[test]
    fn ninety_nine_samples_never_fire() {
        let mut session = session();
        let decision = feed(&mut session, 99, 0, 0);

        assert!(!decision.vibration_alert);
        assert_eq!(session.history().len(), 99);
    }

    #[test]
    fn cooldown_blocks_until_boundary() {
        let mut session = session();
        let first = feed(&mut session, 100, 0, 0);
        assert!(first.vibration_alert);
        let fired_at = session.last_vibration().unwrap();

        let mut fired_again = false;
        for _ in 0..100 {
            fired_again |= session.on_sample(&posture(false), fired_at + Duration::seconds(299)).vibration_alert;
        }
        assert!(!fired_again);

        let decision = session.on_sample(&posture(false), fired_at + Duration::seconds(300));
        assert!(decision.vibration_alert);
        assert_eq!(session.last_vibration(), Some(fired_at + Duration::seconds(300)));
        assert_eq!(session.tally().vibration_alerts, 2);
    }

    #[test]
    fn fall_only_sample_leaves_history_untouched() {
        let mut session = session();
        let decision = session.on_sample(&fall(), t(0));

        assert!(decision.fall_alert);
        assert!(!decision.vibration_alert);
        assert_eq!(session.history().len(), 0);
    }

    #[test]
    fn every_fall_sample_alerts() {
        let mut session = session();
        for secs in 0..5 {
            assert!(session.on_sample(&fall(), t(secs)).fall_alert);
        }
        assert_eq!(session.tally().fall_alerts, 5);
    }

    #[test]
    fn fall_alerts_ignore_vibration_cooldown() {
        let mut session = session();
        feed(&mut session, 100, 0, 0);

        let both = Classification::new(posture(false).posture, fall().fall);
        let decision = session.on_sample(&both, t(1));

        assert!(decision.fall_alert);
        assert!(!decision.vibration_alert);
    }

    #[test]
    fn no_opinion_changes_nothing() {
        let mut session = session();
        let decision = session.on_sample(&Classification::default(), t(0));

        assert!(!decision.any());
        assert!(session.history().is_empty());
    }

    #[test]
    fn old_entries_are_evicted_across_the_window() {
        let mut session = session();
        let span_ms = 400_000_i64;
        let stamps: Vec<_> = (0..150_i64)
            .map(|i| t(0) + Duration::milliseconds(i * span_ms / 149))
            .collect();

        for (i, now) in stamps.iter().enumerate() {
            session.on_sample(&posture(i % 2 == 0), *now);
        }

        let cutoff = t(100);
        let expected = stamps.iter().filter(|s| **s >= cutoff).count();
        assert_eq!(session.history().len(), expected);
        assert!(session.history().iter().all(|e| e.timestamp >= cutoff));
        assert_eq!(session.history().newest().map(|e| e.timestamp), Some(t(400)));
    }

    #[test]
    fn eviction_runs_without_new_entries() {
        let mut session = session();
        session.on_sample(&posture(true), t(0));
        session.on_sample(&Classification::default(), t(301));

        assert!(session.history().is_empty());
    }

    #[test]
    fn summary_reports_correctness() {
        let mut session = session();
        feed(&mut session, 1, 3, 0);
        session.on_sample(&fall(), t(2));

        let summary = session.summary(t(10));
        assert_eq!(summary.tally.samples, 5);
        assert_eq!(summary.tally.correct, 3);
        assert_eq!(summary.tally.incorrect, 1);
        assert_eq!(summary.tally.fall_alerts, 1);
        assert_eq!(summary.correctness_percentage, Some(75.0));
        assert_eq!(summary.ended_at, t(10));
    }

    #[test]
    fn summary_without_posture_has_no_percentage() {
        let session = session();
        assert_eq!(session.summary(t(1)).correctness_percentage, None);
    }

    #[test]
    fn custom_policy_thresholds_apply() {
        let policy = AlertPolicy {
            min_samples: 4,
            incorrect_ratio: 0.5,
            ..AlertPolicy::default()
        };
        let mut session = SessionState::new(policy, t(0));

        let decision = feed(&mut session, 2, 2, 0);
        assert!(decision.vibration_alert);
    }
}
