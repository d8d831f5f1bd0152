use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{FretCoachError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        f.pad(label)
    }
}

/// A single fretted note. `time` and `duration` are in seconds from the start
/// of the song.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub string: u8,
    pub fret: u8,
    pub time: f32,
    pub duration: f32,
}

impl Note {
    pub fn new(string: u8, fret: u8, time: f32, duration: f32) -> Self {
        Self {
            string,
            fret,
            time,
            duration,
        }
    }
}

/// Reference song the player practises against. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub difficulty: Difficulty,
    pub bpm: f32,
    pub notes: Vec<Note>,
    /// Marker that selects this song when it comes into view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_id: Option<String>,
}

impl Song {
    /// Time between two scheduler ticks, i.e. one beat. Zero when the tempo
    /// is not a positive number.
    pub fn beat_interval(&self) -> Duration {
        Duration::try_from_secs_f64(60.0 / f64::from(self.bpm)).unwrap_or(Duration::ZERO)
    }

    /// End of the last sounding note in seconds.
    pub fn total_duration(&self) -> f32 {
        self.notes
            .iter()
            .map(|note| note.time + note.duration)
            .fold(0.0, f32::max)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Checks tempo and note ordering. Empty songs pass; the scheduler decides
    /// what to do with them.
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(self.invalid(format!("tempo must be positive, got {}", self.bpm)));
        }

        let mut previous_onset = 0.0f32;
        for (index, note) in self.notes.iter().enumerate() {
            if !note.time.is_finite() || note.time < 0.0 {
                return Err(self.invalid(format!("note {index} has a negative onset")));
            }
            if !note.duration.is_finite() || note.duration < 0.0 {
                return Err(self.invalid(format!("note {index} has a negative duration")));
            }
            if note.time < previous_onset {
                return Err(self.invalid(format!(
                    "note {index} starts at {}s, before the previous note at {previous_onset}s",
                    note.time
                )));
            }
            previous_onset = note.time;
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> FretCoachError {
        FretCoachError::InvalidSong {
            id: self.id.clone(),
            reason,
        }
    }
}
