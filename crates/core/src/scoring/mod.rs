//! Running performance metrics for a practice session.
//!
//! Every evaluated note produces a [`NoteAttempt`] which is folded into the
//! session counters and an incremental timing mean. Percentages are rounded
//! only when a [`ProgressMetrics`] snapshot is produced; the accumulators keep
//! full precision.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{FretCoachError, Note, ScoringConfig};

/// Outcome of the player's attempt at one scheduled note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteAttempt {
    pub is_correct: bool,
    /// Absolute onset deviation in milliseconds.
    pub timing_error_ms: f64,
}

impl NoteAttempt {
    pub fn new(is_correct: bool, timing_error_ms: f64) -> Self {
        Self {
            is_correct,
            timing_error_ms,
        }
    }

    /// Compares what was played with the scheduled note. `played_time` is in
    /// seconds from the start of the song.
    pub fn against(expected: &Note, string: u8, fret: u8, played_time: f32) -> Self {
        let is_correct = expected.string == string && expected.fret == fret;
        let deviation = f64::from(played_time - expected.time).abs() * 1000.0;
        Self::new(is_correct, deviation)
    }

    fn timing_score(&self) -> f64 {
        let error = self.timing_error_ms.abs();
        if error.is_finite() {
            (100.0 - error).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Session-scoped counters. Discarded when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub notes_played: u32,
    pub correct_notes: u32,
    pub minutes_practiced: f64,
}

/// Reported percentages, each within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub accuracy_percent: u32,
    pub timing_percent: u32,
    pub overall_progress_percent: u32,
}

#[derive(Debug, Clone)]
pub struct PerformanceScorer {
    weights: ScoringConfig,
    stats: SessionStats,
    timing_average: f64,
}

impl PerformanceScorer {
    pub fn new(weights: ScoringConfig) -> Self {
        Self {
            weights,
            stats: SessionStats::default(),
            timing_average: 0.0,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Folds one attempt into the session and returns the updated metrics.
    ///
    /// Overall progress blends the accuracy and timing values that include
    /// this attempt.
    pub fn record_attempt(&mut self, attempt: NoteAttempt) -> ProgressMetrics {
        self.stats.notes_played += 1;
        if attempt.is_correct {
            self.stats.correct_notes += 1;
        }

        let played = f64::from(self.stats.notes_played);
        self.timing_average =
            (self.timing_average * (played - 1.0) + attempt.timing_score()) / played;

        let metrics = self.metrics();
        tracing::debug!(
            correct = attempt.is_correct,
            timing_error_ms = attempt.timing_error_ms,
            accuracy = metrics.accuracy_percent,
            timing = metrics.timing_percent,
            overall = metrics.overall_progress_percent,
            "recorded note attempt"
        );
        metrics
    }

    /// Current metrics; all zero before the first attempt.
    pub fn metrics(&self) -> ProgressMetrics {
        if self.stats.notes_played == 0 {
            return ProgressMetrics::default();
        }

        let accuracy_percent = to_percent(self.accuracy());
        let timing_percent = to_percent(self.timing_average);
        let overall = self.weights.accuracy_weight * f64::from(accuracy_percent)
            + self.weights.timing_weight * f64::from(timing_percent);

        ProgressMetrics {
            accuracy_percent,
            timing_percent,
            overall_progress_percent: to_percent(overall),
        }
    }

    /// Adds the time between `started` and `stopped` to the practice total.
    pub fn accrue_between(&mut self, started: Instant, stopped: Instant) {
        match stopped.checked_duration_since(started) {
            Some(elapsed) => self.accrue(elapsed),
            None => stats_underflow("practice segment ends before it starts".to_string()),
        }
    }

    pub fn accrue(&mut self, elapsed: Duration) {
        self.accrue_minutes(elapsed.as_secs_f64() / 60.0);
    }

    /// Negative or non-finite amounts are an invariant violation and leave the
    /// total unchanged.
    pub fn accrue_minutes(&mut self, minutes: f64) {
        if !minutes.is_finite() || minutes < 0.0 {
            stats_underflow(format!("cannot accrue {minutes} minutes of practice"));
            return;
        }
        self.stats.minutes_practiced += minutes;
    }

    fn accuracy(&self) -> f64 {
        let SessionStats {
            notes_played,
            correct_notes,
            ..
        } = self.stats;
        if correct_notes > notes_played {
            stats_underflow(format!(
                "{correct_notes} correct notes out of {notes_played} played"
            ));
            return 100.0;
        }
        100.0 * f64::from(correct_notes) / f64::from(notes_played)
    }
}

impl Default for PerformanceScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

fn to_percent(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}

fn stats_underflow(reason: String) {
    let err = FretCoachError::StatsUnderflow(reason);
    tracing::error!(error = %err, "clamping session statistics");
    debug_assert!(false, "{err}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let scorer = PerformanceScorer::default();
        assert_eq!(scorer.metrics(), ProgressMetrics::default());
        assert_eq!(scorer.stats().notes_played, 0);
    }

    #[test]
    fn all_correct_converges_to_full_accuracy() {
        let mut scorer = PerformanceScorer::default();
        let mut metrics = ProgressMetrics::default();
        for _ in 0..7 {
            metrics = scorer.record_attempt(NoteAttempt::new(true, 0.0));
        }

        assert_eq!(metrics.accuracy_percent, 100);
        assert_eq!(metrics.timing_percent, 100);
        assert_eq!(metrics.overall_progress_percent, 100);
        assert_eq!(scorer.stats().correct_notes, 7);
    }

    #[test]
    fn all_incorrect_yields_zero_accuracy() {
        let mut scorer = PerformanceScorer::default();
        let mut metrics = ProgressMetrics::default();
        for _ in 0..4 {
            metrics = scorer.record_attempt(NoteAttempt::new(false, 0.0));
        }

        assert_eq!(metrics.accuracy_percent, 0);
        assert_eq!(metrics.timing_percent, 100);
        assert_eq!(metrics.overall_progress_percent, 40);
    }

    #[test]
    fn overall_uses_values_including_current_attempt() {
        let mut scorer = PerformanceScorer::default();

        let first = scorer.record_attempt(NoteAttempt::new(true, 20.0));
        assert_eq!(first.accuracy_percent, 100);
        assert_eq!(first.timing_percent, 80);
        // 0.6 * 100 + 0.4 * 80
        assert_eq!(first.overall_progress_percent, 92);

        let second = scorer.record_attempt(NoteAttempt::new(false, 60.0));
        assert_eq!(second.accuracy_percent, 50);
        assert_eq!(second.timing_percent, 60);
        assert_eq!(second.overall_progress_percent, 54);
    }

    #[test]
    fn timing_mean_is_rounded_only_when_reported() {
        let mut scorer = PerformanceScorer::default();
        scorer.record_attempt(NoteAttempt::new(true, 0.5));
        scorer.record_attempt(NoteAttempt::new(true, 0.5));
        let metrics = scorer.record_attempt(NoteAttempt::new(true, 1.5));

        // The intermediate 99.5 average would round up to 100 and skew the
        // final mean of 99.17.
        assert_eq!(metrics.timing_percent, 99);
    }

    #[test]
    fn overall_blends_the_reported_percentages() {
        let mut scorer = PerformanceScorer::default();
        scorer.record_attempt(NoteAttempt::new(true, 0.0));
        let mut metrics = ProgressMetrics::default();
        for _ in 0..6 {
            metrics = scorer.record_attempt(NoteAttempt::new(false, 0.0));
        }

        // 14.29% rounds to 14; 0.6 * 14 + 0.4 * 100 = 48.4
        assert_eq!(metrics.accuracy_percent, 14);
        assert_eq!(metrics.timing_percent, 100);
        assert_eq!(metrics.overall_progress_percent, 48);
    }

    #[test]
    fn huge_timing_errors_floor_at_zero() {
        let mut scorer = PerformanceScorer::default();

        let first = scorer.record_attempt(NoteAttempt::new(true, 10_000.0));
        assert_eq!(first.timing_percent, 0);
        assert_eq!(first.overall_progress_percent, 60);

        let second = scorer.record_attempt(NoteAttempt::new(true, 0.0));
        assert_eq!(second.timing_percent, 50);

        let third = scorer.record_attempt(NoteAttempt::new(false, f64::INFINITY));
        // Timing mean 100 / 3, accuracy 2 / 3.
        assert_eq!(third.timing_percent, 33);
        assert_eq!(third.accuracy_percent, 67);
        assert_eq!(third.overall_progress_percent, 53);

        let fourth = scorer.record_attempt(NoteAttempt::new(true, -40.0));
        // Negative deviations count by magnitude: score 60, mean 160 / 4.
        assert_eq!(fourth.timing_percent, 40);
        assert_eq!(fourth.accuracy_percent, 75);
        assert_eq!(fourth.overall_progress_percent, 61);
    }

    #[test]
    fn attempt_against_scheduled_note() {
        let expected = Note::new(2, 5, 3.0, 1.0);

        let hit = NoteAttempt::against(&expected, 2, 5, 3.05);
        assert!(hit.is_correct);
        assert!((hit.timing_error_ms - 50.0).abs() < 1e-3);

        let early_miss = NoteAttempt::against(&expected, 2, 4, 2.9);
        assert!(!early_miss.is_correct);
        assert!((early_miss.timing_error_ms - 100.0).abs() < 1e-3);
    }

    #[test]
    fn accrues_practice_minutes() {
        let mut scorer = PerformanceScorer::default();
        let start = Instant::now();

        scorer.accrue_between(start, start + Duration::from_secs(90));
        scorer.accrue(Duration::from_secs(30));

        assert!((scorer.stats().minutes_practiced - 2.0).abs() < 1e-9);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "underflow")]
    fn negative_practice_time_is_fatal_in_debug() {
        let mut scorer = PerformanceScorer::default();
        scorer.accrue_minutes(-1.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "underflow")]
    fn reversed_segment_is_fatal_in_debug() {
        let mut scorer = PerformanceScorer::default();
        let start = Instant::now() + Duration::from_secs(5);
        scorer.accrue_between(start, start - Duration::from_secs(5));
    }
}
