//! One continuous practice run.
//!
//! [`PracticeSession`] owns the only playback state and statistics of a run
//! and routes detector results, beat ticks and note attempts between the
//! detector, scheduler and scorer. Errors from detection and scheduling are
//! resolved here to their safe defaults (not visible, idle) and never reach
//! the caller.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    AppConfig, FeedbackRequest, FrameSample, FrameSource, MarkerDetector, MarkerRegistry,
    NoteAttempt, NoteScheduler, PerformanceScorer, PerformanceSummary, PlaybackState,
    ProgressMetrics, Result, SessionConfig, SessionStats, Song, SongCatalog, TickOutcome,
};

/// Everything the presentation layer needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub song_id: Option<String>,
    /// Song picked by its marker, not necessarily playing.
    pub selected_song_id: Option<String>,
    pub playback: PlaybackState,
    /// `-1` while idle.
    pub current_note_index: i64,
    pub marker_visible: bool,
    pub stats: SessionStats,
    pub metrics: ProgressMetrics,
}

#[derive(Debug)]
pub struct PracticeSession {
    config: SessionConfig,
    detector: MarkerDetector,
    scheduler: NoteScheduler,
    scorer: PerformanceScorer,
    marker_visible: bool,
    selected_song: Option<Arc<Song>>,
    segment_started: Option<Instant>,
}

impl PracticeSession {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.session,
            detector: MarkerDetector::new(config.detector, MarkerRegistry::builtin()),
            scheduler: NoteScheduler::new(),
            scorer: PerformanceScorer::new(config.scoring),
            marker_visible: false,
            selected_song: None,
            segment_started: None,
        }
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> &SessionStats {
        self.scorer.stats()
    }

    pub fn metrics(&self) -> ProgressMetrics {
        self.scorer.metrics()
    }

    pub fn marker_visible(&self) -> bool {
        self.marker_visible
    }

    pub fn selected_song(&self) -> Option<&Arc<Song>> {
        self.selected_song.as_ref()
    }

    /// Starts (or restarts) playback of `song`. Returns whether playback is
    /// now running; a rejected song leaves the session as it was.
    pub fn play(&mut self, song: Arc<Song>, now: Instant) -> bool {
        if self.config.require_marker_to_start && !self.marker_visible {
            tracing::info!(song = %song.id, "waiting for marker before starting playback");
            return false;
        }

        let song_id = song.id.clone();
        if let Err(err) = self.scheduler.start(song) {
            tracing::warn!(song = %song_id, error = %err, "playback not started");
            return false;
        }

        self.close_segment(now);
        self.segment_started = Some(now);
        tracing::info!(
            song = %song_id,
            interval = ?self.scheduler.interval(),
            "playback started"
        );
        true
    }

    /// Stops playback and banks the practice time. Safe to call when idle.
    pub fn stop(&mut self, now: Instant) {
        if self.scheduler.stop() {
            tracing::info!("playback stopped");
        }
        self.close_segment(now);
    }

    /// Advances playback by one beat.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.scheduler.tick();
        self.after_tick(Some(outcome), now);
        outcome
    }

    /// Feeds elapsed time into the beat clock, firing every tick that is due.
    pub fn advance(&mut self, delta: Duration, now: Instant) -> Option<TickOutcome> {
        let outcome = self.scheduler.advance(delta);
        self.after_tick(outcome, now);
        outcome
    }

    /// Runs marker detection on one frame. Losing the marker mid-song pauses
    /// playback when configured to.
    pub fn observe_frame(&mut self, frame: &FrameSample, marker_id: &str, now: Instant) -> bool {
        let visible = self.detector.is_marker_visible(frame, marker_id);
        if visible != self.marker_visible {
            tracing::debug!(marker = marker_id, visible, "marker visibility changed");
        }
        self.marker_visible = visible;

        if !visible && self.config.pause_on_marker_loss && self.scheduler.is_playing() {
            tracing::info!(marker = marker_id, "marker lost, pausing playback");
            self.stop(now);
        }
        visible
    }

    /// Selects the first catalog song whose marker is visible in `frame`.
    /// Playback is left untouched; a frame that matches nothing keeps the
    /// previous selection.
    pub fn select_song_for_frame(
        &mut self,
        frame: &FrameSample,
        catalog: &dyn SongCatalog,
    ) -> Result<Option<Arc<Song>>> {
        let found = catalog.list_songs()?.into_iter().find(|song| {
            song.marker_id
                .as_deref()
                .is_some_and(|marker| self.detector.is_marker_visible(frame, marker))
        });

        let Some(song) = found else {
            return Ok(None);
        };
        tracing::info!(song = %song.id, marker = ?song.marker_id, "song selected by marker");
        let song = Arc::new(song);
        self.selected_song = Some(song.clone());
        Ok(Some(song))
    }

    /// Plays the song picked by [`PracticeSession::select_song_for_frame`].
    pub fn play_selected(&mut self, now: Instant) -> bool {
        match self.selected_song.clone() {
            Some(song) => self.play(song, now),
            None => {
                tracing::debug!("no song selected");
                false
            }
        }
    }

    /// Pulls a single frame from `source` and observes it. `None` once the
    /// source is exhausted.
    pub fn observe_next_frame<S: FrameSource>(
        &mut self,
        source: &mut S,
        marker_id: &str,
        now: Instant,
    ) -> Option<bool> {
        let frame = source.next_frame()?;
        Some(self.observe_frame(&frame, marker_id, now))
    }

    pub fn record_attempt(&mut self, is_correct: bool, timing_error_ms: f64) -> ProgressMetrics {
        self.scorer
            .record_attempt(NoteAttempt::new(is_correct, timing_error_ms))
    }

    /// Scores a played note against the note currently scheduled. `None` when
    /// nothing is playing.
    pub fn record_played(&mut self, string: u8, fret: u8, played_time: f32) -> Option<ProgressMetrics> {
        let attempt = NoteAttempt::against(self.scheduler.current_note()?, string, fret, played_time);
        Some(self.scorer.record_attempt(attempt))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let playback = *self.scheduler.state();
        SessionSnapshot {
            song_id: self.scheduler.song().map(|song| song.id.clone()),
            selected_song_id: self.selected_song.as_ref().map(|song| song.id.clone()),
            playback,
            current_note_index: playback.note_index_or_idle(),
            marker_visible: self.marker_visible,
            stats: *self.scorer.stats(),
            metrics: self.scorer.metrics(),
        }
    }

    pub fn feedback_request(&self, message: impl Into<String>) -> FeedbackRequest {
        FeedbackRequest {
            message: message.into(),
            song: self.scheduler.song().cloned(),
            performance: PerformanceSummary::new(&self.scorer.metrics(), self.scorer.stats()),
        }
    }

    /// Ends the session and returns its final state.
    pub fn finish(mut self, now: Instant) -> SessionSnapshot {
        self.stop(now);
        self.snapshot()
    }

    fn after_tick(&mut self, outcome: Option<TickOutcome>, now: Instant) {
        if outcome == Some(TickOutcome::Finished) {
            tracing::info!("song finished");
            self.close_segment(now);
        }
    }

    fn close_segment(&mut self, now: Instant) {
        if let Some(started) = self.segment_started.take() {
            self.scorer.accrue_between(started, now);
        }
    }
}
