use serde::{Deserialize, Serialize};

use crate::{ProgressMetrics, Result, SessionStats, Song};

/// Instructions given to the coaching model alongside every request.
pub const COACH_SYSTEM_PROMPT: &str = "You are a helpful guitar teacher assistant. \
Provide constructive feedback, tips, and encouragement based on the student's performance data. \
Be specific about what they're doing well and what they can improve. \
If they ask about technique, theory, or other guitar-related questions, provide helpful and accurate information. \
Keep responses concise but informative.";

/// The slice of session state shared with the coach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub accuracy: u32,
    pub timing: u32,
    pub notes_played: u32,
    pub minutes_practiced: f64,
}

impl PerformanceSummary {
    pub fn new(metrics: &ProgressMetrics, stats: &SessionStats) -> Self {
        Self {
            accuracy: metrics.accuracy_percent,
            timing: metrics.timing_percent,
            notes_played: stats.notes_played,
            minutes_practiced: stats.minutes_practiced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
    pub song: Option<Song>,
    pub performance: PerformanceSummary,
}

impl FeedbackRequest {
    /// Renders the context block sent to the coach.
    pub fn prompt(&self) -> String {
        let (title, artist, difficulty, bpm) = match &self.song {
            Some(song) => (
                song.title.clone(),
                song.artist.clone(),
                song.difficulty.to_string(),
                song.bpm.to_string(),
            ),
            None => unknown_song(),
        };
        let performance = &self.performance;

        format!(
            "Song: {title} by {artist}\n\
             Difficulty: {difficulty}\n\
             BPM: {bpm}\n\
             \n\
             Performance Data:\n\
             - Note Accuracy: {}%\n\
             - Timing Accuracy: {}%\n\
             - Notes Played: {}\n\
             - Practice Time: {:.2} minutes\n\
             \n\
             User Question: {}",
            performance.accuracy,
            performance.timing,
            performance.notes_played,
            performance.minutes_practiced,
            self.message,
        )
    }
}

fn unknown_song() -> (String, String, String, String) {
    let unknown = || "Unknown".to_string();
    (unknown(), unknown(), unknown(), unknown())
}

/// Remote coaching collaborator. Failures surface to the caller as
/// [`crate::FretCoachError::Feedback`].
pub trait FeedbackClient {
    fn request_feedback(&self, request: &FeedbackRequest) -> Result<String>;
}

/// Offline stand-in that answers with the prompt it would have sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoCoach;

impl FeedbackClient for EchoCoach {
    fn request_feedback(&self, request: &FeedbackRequest) -> Result<String> {
        Ok(format!("{COACH_SYSTEM_PROMPT}\n\n{}", request.prompt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuiltinCatalog, FretCoachError, SongCatalog};

    fn summary() -> PerformanceSummary {
        PerformanceSummary {
            accuracy: 83,
            timing: 71,
            notes_played: 12,
            minutes_practiced: 1.5,
        }
    }

    #[test]
    fn prompt_includes_song_and_performance() {
        let song = BuiltinCatalog::new().get_song("song2").unwrap();
        let request = FeedbackRequest {
            message: "How do I mute the other strings?".to_string(),
            song,
            performance: summary(),
        };

        let prompt = request.prompt();
        assert!(prompt.contains("Song: Smoke on the Water by Deep Purple"));
        assert!(prompt.contains("Difficulty: Beginner"));
        assert!(prompt.contains("BPM: 112"));
        assert!(prompt.contains("- Practice Time: 1.50 minutes"));
        assert!(prompt.ends_with("User Question: How do I mute the other strings?"));
    }

    #[test]
    fn prompt_marks_missing_song_as_unknown() {
        let request = FeedbackRequest {
            message: "Any tips?".to_string(),
            song: None,
            performance: summary(),
        };

        let prompt = request.prompt();
        assert!(prompt.contains("Song: Unknown by Unknown"));
        assert!(prompt.contains("BPM: Unknown"));
    }

    struct Offline;

    impl FeedbackClient for Offline {
        fn request_feedback(&self, _request: &FeedbackRequest) -> Result<String> {
            Err(FretCoachError::Feedback("Failed to generate feedback".to_string()))
        }
    }

    #[test]
    fn client_failures_propagate() {
        let request = FeedbackRequest {
            message: "?".to_string(),
            song: None,
            performance: PerformanceSummary::default(),
        };

        assert!(EchoCoach.request_feedback(&request).unwrap().starts_with(COACH_SYSTEM_PROMPT));
        assert!(matches!(
            Offline.request_feedback(&request),
            Err(FretCoachError::Feedback(_))
        ));
    }
}
