/// Result alias that carries the custom [`FretCoachError`] type.
pub type Result<T> = std::result::Result<T, FretCoachError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FretCoachError {
    /// Zero-sized or malformed pixel buffer handed to the marker detector.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// Playback was requested for a song without any notes.
    #[error("song `{id}` has no notes")]
    EmptySong { id: String },
    /// Song data violates the note ordering or tempo rules.
    #[error("song `{id}` is invalid: {reason}")]
    InvalidSong { id: String, reason: String },
    /// Session statistics would become inconsistent or negative.
    #[error("session statistics underflow: {0}")]
    StatsUnderflow(String),
    #[error("unknown song `{0}`")]
    UnknownSong(String),
    #[error("unknown marker `{0}`")]
    UnknownMarker(String),
    /// The song catalog collaborator failed to produce data.
    #[error("catalog error: {0}")]
    Catalog(String),
    /// The coaching feedback collaborator failed.
    #[error("feedback error: {0}")]
    Feedback(String),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl FretCoachError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_frame<T: Into<String>>(reason: T) -> Self {
        Self::InvalidFrame(reason.into())
    }
}

impl From<&str> for FretCoachError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FretCoachError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
