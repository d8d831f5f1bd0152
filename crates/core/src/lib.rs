//! Core library for the FretCoach practice aid.
//!
//! A camera frame is checked for a fretboard marker, a reference song is
//! stepped through one beat at a time, and every note attempt is folded into
//! running accuracy and timing scores. Each subsystem lives in its own module;
//! [`PracticeSession`] ties them together for a single practice run.

pub mod catalog;
pub mod config;
pub mod detection;
pub mod error;
pub mod feedback;
pub mod fretboard;
pub mod marker;
pub mod scoring;
pub mod session;
pub mod song;
pub mod timeline;

pub use catalog::{BuiltinCatalog, JsonCatalog, SongCatalog};
pub use config::{AppConfig, DetectorConfig, ScoringConfig, SessionConfig};
pub use detection::{BrightnessGrid, FrameSample, FrameSource, MarkerDetector, GRID_SIZE};
pub use error::{FretCoachError, Result};
pub use feedback::{EchoCoach, FeedbackClient, FeedbackRequest, PerformanceSummary};
pub use marker::{Marker, MarkerRegistry};
pub use scoring::{NoteAttempt, PerformanceScorer, ProgressMetrics, SessionStats};
pub use session::{PracticeSession, SessionSnapshot};
pub use song::{Difficulty, Note, Song};
pub use timeline::{BeatClock, NoteScheduler, PlaybackState, TickOutcome};
