use thiserror::Error;

use crate::transcript::FailedAttempt;

/// Why a single caption fetch failed
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not extract InnerTube API key from watch page")]
    ApiKeyNotFound,

    #[error("video {video_id} is unavailable: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("no captions available for video {video_id}")]
    CaptionsDisabled { video_id: String },

    #[error("no transcript in [{}] for video {} (available: [{}])", .requested.join(", "), .video_id, .available.join(", "))]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("transcript for video {video_id} is empty")]
    Empty { video_id: String },

    #[error("error parsing caption XML: {0}")]
    MalformedCaptions(String),
}

/// Why the generative model call failed
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{env_var} environment variable not set (required for summarization)")]
    MissingApiKey { env_var: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("prompt was blocked by the model: {reason}")]
    Blocked { reason: String },

    #[error("unexpected Gemini API response format")]
    EmptyResponse,
}

/// A submission that could not produce a summary
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {input}")]
    InvalidUrl { input: String },

    #[error("Error getting transcript for {video_id}")]
    TranscriptUnavailable {
        video_id: String,
        attempts: Vec<FailedAttempt>,
    },

    #[error("summary generation failed: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, Error>;
