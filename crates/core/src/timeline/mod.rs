use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{FretCoachError, Note, Result, Song};

/// Converts arbitrary elapsed time into whole beat ticks. Acts as the pending
/// timer of the scheduler: [`BeatClock::cancel`] drops any partially elapsed
/// beat.
#[derive(Debug, Default, Clone)]
pub struct BeatClock {
    interval: Duration,
    accumulated: Duration,
}

impl BeatClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Adds `delta` and returns how many full intervals are now due.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulated += delta;
        let due = self.accumulated.as_nanos() / self.interval.as_nanos();
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        self.accumulated -= self.interval * due;
        due
    }

    pub fn cancel(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

/// Snapshot of where playback currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// `None` while idle.
    pub current_note_index: Option<usize>,
    /// Seconds of song time covered by the ticks so far.
    pub elapsed_time: f64,
}

impl PlaybackState {
    /// The current note index with `-1` standing for idle, as consumed by the
    /// presentation layer.
    pub fn note_index_or_idle(&self) -> i64 {
        self.current_note_index
            .and_then(|index| i64::try_from(index).ok())
            .unwrap_or(-1)
    }

    pub fn is_idle(&self) -> bool {
        !self.is_playing && self.current_note_index.is_none()
    }
}

/// Result of a single [`NoteScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is playing; the tick was ignored.
    Idle,
    /// Playback moved on to the note at this index.
    Advanced(usize),
    /// The last note has been passed and the scheduler is idle again.
    Finished,
}

/// Steps through a song's notes one beat at a time.
///
/// The scheduler owns no timer of its own. Any timing source (a real clock
/// through [`NoteScheduler::advance`], or a test calling
/// [`NoteScheduler::tick`] directly) drives it.
#[derive(Debug, Default)]
pub struct NoteScheduler {
    song: Option<Arc<Song>>,
    state: PlaybackState,
    clock: BeatClock,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_deref()
    }

    /// Tick interval derived from the tempo at the last successful start.
    pub fn interval(&self) -> Duration {
        self.clock.interval()
    }

    pub fn current_note(&self) -> Option<&Note> {
        let index = self.state.current_note_index?;
        self.song.as_ref()?.notes.get(index)
    }

    /// Begins playback from the first note.
    ///
    /// A song without notes, or with an invalid tempo or note ordering, is
    /// rejected and leaves the scheduler untouched. Starting while already
    /// playing cancels the running playback first.
    pub fn start(&mut self, song: Arc<Song>) -> Result<()> {
        if song.is_empty() {
            return Err(FretCoachError::EmptySong {
                id: song.id.clone(),
            });
        }
        song.validate()?;

        self.stop();
        self.clock = BeatClock::new(song.beat_interval());
        self.state = PlaybackState {
            is_playing: true,
            current_note_index: Some(0),
            elapsed_time: 0.0,
        };
        self.song = Some(song);
        Ok(())
    }

    /// Returns to idle and cancels any partially elapsed beat. Returns whether
    /// playback was running.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.state.is_playing;
        self.clock.cancel();
        self.state = PlaybackState::default();
        was_playing
    }

    /// Advances by exactly one note.
    pub fn tick(&mut self) -> TickOutcome {
        let (Some(index), Some(song)) = (self.state.current_note_index, self.song.as_ref()) else {
            return TickOutcome::Idle;
        };
        if !self.state.is_playing {
            return TickOutcome::Idle;
        }

        if index + 1 < song.notes.len() {
            self.state.current_note_index = Some(index + 1);
            self.state.elapsed_time += self.clock.interval().as_secs_f64();
            TickOutcome::Advanced(index + 1)
        } else {
            self.stop();
            TickOutcome::Finished
        }
    }

    /// Feeds elapsed wall-clock time and fires every tick that became due.
    /// Returns the outcome of the last tick fired, if any.
    pub fn advance(&mut self, delta: Duration) -> Option<TickOutcome> {
        if !self.state.is_playing {
            return None;
        }

        let due = self.clock.advance(delta);
        let mut last = None;
        for _ in 0..due {
            let outcome = self.tick();
            last = Some(outcome);
            if outcome == TickOutcome::Finished {
                break;
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Difficulty;

    fn song_with_notes(count: usize, bpm: f32) -> Arc<Song> {
        Arc::new(Song {
            id: "scale".to_string(),
            title: "Scale".to_string(),
            artist: "Test".to_string(),
            difficulty: Difficulty::Beginner,
            bpm,
            notes: (0..count)
                .map(|i| Note::new(1, i as u8, i as f32 * 0.5, 0.5))
                .collect(),
            marker_id: None,
        })
    }

    #[test]
    fn beat_clock_emits_whole_intervals() {
        let mut clock = BeatClock::new(Duration::from_millis(500));

        assert_eq!(clock.advance(Duration::from_millis(400)), 0);
        assert_eq!(clock.advance(Duration::from_millis(200)), 1);
        assert_eq!(clock.advance(Duration::from_millis(1000)), 2);

        clock.advance(Duration::from_millis(400));
        clock.cancel();
        assert_eq!(clock.advance(Duration::from_millis(200)), 0);
    }

    #[test]
    fn zero_interval_never_fires() {
        let mut clock = BeatClock::default();
        assert_eq!(clock.advance(Duration::from_secs(10)), 0);
    }

    #[test]
    fn advances_monotonically_then_finishes() {
        let mut scheduler = NoteScheduler::new();
        scheduler.start(song_with_notes(4, 120.0)).unwrap();
        assert_eq!(scheduler.state().current_note_index, Some(0));

        for expected in 1..4 {
            assert_eq!(scheduler.tick(), TickOutcome::Advanced(expected));
        }
        assert_eq!(scheduler.state().current_note_index, Some(3));
        assert!((scheduler.state().elapsed_time - 1.5).abs() < 1e-9);

        assert_eq!(scheduler.tick(), TickOutcome::Finished);
        assert!(scheduler.state().is_idle());
        assert_eq!(scheduler.state().note_index_or_idle(), -1);
        assert_eq!(scheduler.tick(), TickOutcome::Idle);
    }

    #[test]
    fn empty_song_leaves_scheduler_idle() {
        let mut scheduler = NoteScheduler::new();
        let err = scheduler.start(song_with_notes(0, 100.0)).unwrap_err();

        assert!(matches!(err, FretCoachError::EmptySong { .. }));
        assert!(scheduler.state().is_idle());
        assert!(scheduler.song().is_none());
    }

    #[test]
    fn empty_song_does_not_interrupt_running_playback() {
        let mut scheduler = NoteScheduler::new();
        scheduler.start(song_with_notes(3, 100.0)).unwrap();
        scheduler.tick();

        assert!(scheduler.start(song_with_notes(0, 100.0)).is_err());
        assert_eq!(scheduler.state().current_note_index, Some(1));
    }

    #[test]
    fn restart_resets_to_first_note() {
        let mut scheduler = NoteScheduler::new();
        scheduler.start(song_with_notes(3, 60.0)).unwrap();
        scheduler.tick();
        scheduler.advance(Duration::from_millis(900));

        scheduler.start(song_with_notes(3, 60.0)).unwrap();
        assert_eq!(scheduler.state().current_note_index, Some(0));
        // The partial beat from the previous run was cancelled.
        assert_eq!(scheduler.advance(Duration::from_millis(200)), None);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut scheduler = NoteScheduler::new();
        scheduler.start(song_with_notes(2, 100.0)).unwrap();

        assert!(scheduler.stop());
        let after_first = *scheduler.state();
        assert!(!scheduler.stop());
        assert_eq!(*scheduler.state(), after_first);
        assert!(after_first.is_idle());
    }

    #[test]
    fn advance_fires_one_tick_per_interval() {
        let mut scheduler = NoteScheduler::new();
        scheduler.start(song_with_notes(5, 120.0)).unwrap();
        assert_eq!(scheduler.interval(), Duration::from_millis(500));

        assert_eq!(scheduler.advance(Duration::from_millis(499)), None);
        assert_eq!(
            scheduler.advance(Duration::from_millis(1)),
            Some(TickOutcome::Advanced(1))
        );
        assert_eq!(
            scheduler.advance(Duration::from_millis(1000)),
            Some(TickOutcome::Advanced(3))
        );
        assert_eq!(scheduler.current_note().map(|n| n.fret), Some(3));
        assert_eq!(
            scheduler.advance(Duration::from_secs(10)),
            Some(TickOutcome::Finished)
        );
        assert!(scheduler.state().is_idle());
    }
}
