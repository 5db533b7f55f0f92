use std::fmt;

use log::{debug, info};

use crate::extract_video_id;
use crate::summarize::TextGenerator;
use crate::transcript::{FailedAttempt, FetchStrategy, FetchedTranscript, TranscriptFetcher, fetch_transcript};
use crate::{Error, Result};

/// Where a submission is in the URL → transcript → summary sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ExtractingId,
    FetchingTranscript,
    GeneratingSummary,
    Displaying,
    InvalidUrl,
    TranscriptError,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Displaying | Stage::InvalidUrl | Stage::TranscriptError)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::ExtractingId => "extracting video ID",
            Stage::FetchingTranscript => "extracting video transcript",
            Stage::GeneratingSummary => "generating summary",
            Stage::Displaying => "displaying",
            Stage::InvalidUrl => "invalid URL",
            Stage::TranscriptError => "transcript error",
        };
        write!(f, "{label}")
    }
}

/// Receives progress from a running submission
pub trait Observer {
    fn on_stage(&mut self, stage: Stage);

    /// A fetch strategy failed; later strategies may still succeed
    fn on_attempt_failed(&mut self, _attempt: &FailedAttempt) {}
}

/// Observer that ignores everything
pub struct Silent;

impl Observer for Silent {
    fn on_stage(&mut self, _stage: Stage) {}
}

/// Result of a successful submission
#[derive(Debug)]
pub struct Summary {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub strategy: FetchStrategy,
    pub transcript_chars: usize,
    pub text: String,
}

/// One submit action: extract the ID, fetch the transcript, summarize it
pub struct Pipeline<F, G> {
    fetcher: F,
    generator: G,
    strategies: Vec<FetchStrategy>,
}

impl<F: TranscriptFetcher, G: TextGenerator> Pipeline<F, G> {
    pub fn new(fetcher: F, generator: G, strategies: Vec<FetchStrategy>) -> Self {
        Self {
            fetcher,
            generator,
            strategies,
        }
    }

    /// Run one submission to completion.
    ///
    /// Each stage starts only after the previous one succeeded. An unusable URL
    /// ends in [`Stage::InvalidUrl`], an unavailable transcript in
    /// [`Stage::TranscriptError`]. A model failure returns [`Error::Model`]
    /// with no further stage change.
    pub async fn submit<O: Observer>(&self, url: &str, observer: &mut O) -> Result<Summary> {
        observer.on_stage(Stage::ExtractingId);
        let Some(video_id) = extract_video_id(url) else {
            debug!("No video ID in {url:?}");
            observer.on_stage(Stage::InvalidUrl);
            return Err(Error::InvalidUrl {
                input: url.trim().to_string(),
            });
        };
        info!("Submission for video {video_id}");

        observer.on_stage(Stage::FetchingTranscript);
        let transcript = match fetch_transcript(&self.fetcher, &video_id, &self.strategies).await {
            Ok(t) => t,
            Err(Error::TranscriptUnavailable { video_id, attempts }) => {
                for attempt in &attempts {
                    observer.on_attempt_failed(attempt);
                }
                observer.on_stage(Stage::TranscriptError);
                return Err(Error::TranscriptUnavailable { video_id, attempts });
            }
            Err(e) => return Err(e),
        };
        for attempt in &transcript.failures {
            observer.on_attempt_failed(attempt);
        }

        observer.on_stage(Stage::GeneratingSummary);
        let text = self.generator.generate(&transcript.text).await?;

        observer.on_stage(Stage::Displaying);
        Ok(summary_from(transcript, text))
    }
}

fn summary_from(transcript: FetchedTranscript, text: String) -> Summary {
    Summary {
        transcript_chars: transcript.text.chars().count(),
        video_id: transcript.video_id,
        title: transcript.title,
        language: transcript.language,
        strategy: transcript.strategy,
        text,
    }
}
