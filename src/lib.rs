pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{Error, ModelError, Result, TranscriptError};

/// A single captioned segment
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Caption track as delivered by the transcript service
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    /// Auto-generated (speech recognition) rather than uploaded captions
    pub generated: bool,
    pub segments: Vec<Segment>,
}

// Order matters: the first pattern that matches wins.
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // youtube.com/watch?v=ID
        Regex::new(r"youtube\.com/watch\?v=([^&]+)").expect("watch pattern"),
        // youtu.be/ID
        Regex::new(r"youtu\.be/([^?]+)").expect("short link pattern"),
        // youtube.com/embed/ID
        Regex::new(r"youtube\.com/embed/([^?]+)").expect("embed pattern"),
    ]
});

/// Extract video ID from a watch, short-link or embed URL
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
