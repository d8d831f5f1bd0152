//! Song catalog collaborators.
//!
//! The core only ever reads from a catalog. [`BuiltinCatalog`] ships the
//! reference songs; [`JsonCatalog`] loads a user-supplied list from disk.

use std::path::Path;

use crate::{Difficulty, FretCoachError, Note, Result, Song};

/// Read-only source of songs. Implementations may be backed by slow or remote
/// storage, so both calls are fallible.
pub trait SongCatalog {
    fn list_songs(&self) -> Result<Vec<Song>>;

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        Ok(self.list_songs()?.into_iter().find(|song| song.id == id))
    }

    /// Like [`SongCatalog::get_song`] but treats a missing id as an error.
    fn require_song(&self, id: &str) -> Result<Song> {
        self.get_song(id)?
            .ok_or_else(|| FretCoachError::UnknownSong(id.to_string()))
    }
}

/// The reference songs bundled with the application.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    songs: Vec<Song>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self {
            songs: builtin_songs(),
        }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SongCatalog for BuiltinCatalog {
    fn list_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.clone())
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        Ok(self.songs.iter().find(|song| song.id == id).cloned())
    }
}

/// Catalog loaded from a JSON array of songs. Every song is validated on load.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    songs: Vec<Song>,
}

impl JsonCatalog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            FretCoachError::Catalog(format!("failed to read `{}`: {err}", path.display()))
        })?;
        Self::from_str(&raw)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(raw: &str) -> Result<Self> {
        let songs: Vec<Song> = serde_json::from_str(raw)?;
        for song in &songs {
            song.validate()?;
        }
        tracing::debug!(count = songs.len(), "loaded song catalog");
        Ok(Self { songs })
    }
}

impl SongCatalog for JsonCatalog {
    fn list_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.clone())
    }
}

fn song(
    id: &str,
    title: &str,
    artist: &str,
    difficulty: Difficulty,
    bpm: f32,
    marker: Option<&str>,
    notes: &[(u8, u8, f32, f32)],
) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        difficulty,
        bpm,
        notes: notes
            .iter()
            .map(|&(string, fret, time, duration)| Note::new(string, fret, time, duration))
            .collect(),
        marker_id: marker.map(str::to_string),
    }
}

// Tuples are (string, fret, onset, duration).
fn builtin_songs() -> Vec<Song> {
    vec![
        song(
            "song1",
            "Happy Birthday",
            "Traditional",
            Difficulty::Beginner,
            90.0,
            Some("guitar-head"),
            &[
                (1, 0, 0.0, 0.5),
                (1, 0, 0.5, 0.5),
                (1, 2, 1.0, 1.0),
                (1, 0, 2.0, 1.0),
                (2, 5, 3.0, 1.0),
                (2, 4, 4.0, 2.0),
            ],
        ),
        song(
            "song2",
            "Smoke on the Water",
            "Deep Purple",
            Difficulty::Beginner,
            112.0,
            None,
            &[
                (5, 0, 0.0, 1.0),
                (5, 3, 1.0, 1.0),
                (5, 5, 2.0, 1.0),
                (5, 0, 3.0, 1.0),
                (5, 3, 4.0, 1.0),
                (5, 6, 5.0, 1.0),
                (5, 5, 6.0, 1.0),
            ],
        ),
        song(
            "song3",
            "Wonderwall",
            "Oasis",
            Difficulty::Intermediate,
            86.0,
            None,
            &[
                (4, 3, 0.0, 0.5),
                (3, 3, 0.5, 0.5),
                (2, 0, 1.0, 0.5),
                (1, 2, 1.5, 0.5),
                (1, 3, 2.0, 1.0),
            ],
        ),
        song(
            "song4",
            "Nothing Else Matters",
            "Metallica",
            Difficulty::Intermediate,
            69.0,
            None,
            &[
                (0, 0, 0.0, 0.5),
                (1, 7, 0.5, 0.5),
                (2, 7, 1.0, 0.5),
                (3, 7, 1.5, 0.5),
                (2, 7, 2.0, 0.5),
                (1, 7, 2.5, 0.5),
            ],
        ),
        song(
            "song5",
            "Stairway to Heaven",
            "Led Zeppelin",
            Difficulty::Advanced,
            73.0,
            None,
            &[
                (1, 7, 0.0, 0.5),
                (0, 5, 0.5, 0.5),
                (1, 7, 1.0, 0.5),
                (1, 8, 1.5, 0.5),
                (0, 8, 2.0, 1.0),
            ],
        ),
    ]
}
