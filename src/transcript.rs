use std::fmt;
use std::future::Future;

use log::{debug, info, warn};

use crate::{Error, Result, Transcript, TranscriptError};

/// Hard cap on the transcript text handed to the model, in characters
pub const TRANSCRIPT_CHAR_LIMIT: usize = 3000;

/// How to pick a caption track for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Only accept a track in one of these languages, earlier entries first
    Languages(Vec<String>),
    /// Accept whatever the service offers
    AnyLanguage,
}

impl FetchStrategy {
    pub fn english() -> Self {
        FetchStrategy::Languages(vec!["en".to_string()])
    }

    /// Preferred languages first, then one unrestricted attempt
    pub fn chain(languages: &[String]) -> Vec<FetchStrategy> {
        let mut chain = Vec::with_capacity(2);
        if !languages.is_empty() {
            chain.push(FetchStrategy::Languages(languages.to_vec()));
        }
        chain.push(FetchStrategy::AnyLanguage);
        chain
    }

    pub fn default_chain() -> Vec<FetchStrategy> {
        vec![FetchStrategy::english(), FetchStrategy::AnyLanguage]
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Languages(langs) => write!(f, "{}", langs.join(", ")),
            FetchStrategy::AnyLanguage => write!(f, "any language"),
        }
    }
}

/// A strategy that did not yield a transcript, and why
#[derive(Debug)]
pub struct FailedAttempt {
    pub strategy: FetchStrategy,
    pub error: TranscriptError,
}

/// Transcript text ready to be used as a prompt
#[derive(Debug)]
pub struct FetchedTranscript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub strategy: FetchStrategy,
    /// Strategies tried before the successful one
    pub failures: Vec<FailedAttempt>,
    pub text: String,
}

/// Source of caption tracks, keyed by video ID
pub trait TranscriptFetcher {
    fn fetch(
        &self,
        video_id: &str,
        strategy: &FetchStrategy,
    ) -> impl Future<Output = std::result::Result<Transcript, TranscriptError>> + Send;
}

/// Try each strategy in order until one yields a transcript.
///
/// The winning transcript is flattened and cut to [`TRANSCRIPT_CHAR_LIMIT`].
/// A transcript with no text counts as a failed attempt.
/// When every strategy fails the collected failures come back in
/// [`Error::TranscriptUnavailable`].
pub async fn fetch_transcript<F: TranscriptFetcher>(
    fetcher: &F,
    video_id: &str,
    strategies: &[FetchStrategy],
) -> Result<FetchedTranscript> {
    let mut failures = Vec::new();

    for strategy in strategies {
        debug!("Fetching transcript for {video_id} ({strategy})");
        match fetcher.fetch(video_id, strategy).await {
            Ok(transcript) => {
                let text = truncate_chars(&flatten(&transcript), TRANSCRIPT_CHAR_LIMIT);
                if text.is_empty() {
                    warn!("Transcript for {video_id} ({strategy}) has no text");
                    failures.push(FailedAttempt {
                        strategy: strategy.clone(),
                        error: TranscriptError::Empty {
                            video_id: video_id.to_string(),
                        },
                    });
                    continue;
                }
                info!(
                    "Transcript for {video_id}: lang={} segments={} chars={}",
                    transcript.language,
                    transcript.segments.len(),
                    text.chars().count()
                );
                return Ok(FetchedTranscript {
                    video_id: transcript.video_id,
                    title: transcript.title,
                    language: transcript.language,
                    strategy: strategy.clone(),
                    failures,
                    text,
                });
            }
            Err(error) => {
                warn!("Transcript fetch for {video_id} ({strategy}) failed: {error}");
                failures.push(FailedAttempt {
                    strategy: strategy.clone(),
                    error,
                });
            }
        }
    }

    Err(Error::TranscriptUnavailable {
        video_id: video_id.to_string(),
        attempts: failures,
    })
}

/// Join segment texts with single spaces, in order
pub fn flatten(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the first `limit` characters; may cut mid-word
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;
    use std::sync::Mutex;

    fn transcript(language: &str, texts: &[&str]) -> Transcript {
        Transcript {
            video_id: "abc123".to_string(),
            title: "Test Video".to_string(),
            language: language.to_string(),
            generated: false,
            segments: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Segment {
                    text: t.to_string(),
                    start: i as f64,
                    duration: 1.0,
                })
                .collect(),
        }
    }

    /// Answers each strategy from a canned script and records what was asked
    struct ScriptedFetcher {
        english: Option<Transcript>,
        any: Option<Transcript>,
        calls: Mutex<Vec<FetchStrategy>>,
    }

    impl ScriptedFetcher {
        fn new(english: Option<Transcript>, any: Option<Transcript>) -> Self {
            Self {
                english,
                any,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<FetchStrategy> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TranscriptFetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            video_id: &str,
            strategy: &FetchStrategy,
        ) -> std::result::Result<Transcript, TranscriptError> {
            self.calls.lock().unwrap().push(strategy.clone());
            let answer = match strategy {
                FetchStrategy::Languages(_) => self.english.clone(),
                FetchStrategy::AnyLanguage => self.any.clone(),
            };
            answer.ok_or_else(|| TranscriptError::CaptionsDisabled {
                video_id: video_id.to_string(),
            })
        }
    }

    #[test]
    fn test_flatten_joins_with_single_space() {
        let t = transcript("en", &["Hello world", "this is", "a test"]);
        assert_eq!(flatten(&t), "Hello world this is a test");
    }

    #[test]
    fn test_flatten_empty() {
        assert_eq!(flatten(&transcript("en", &[])), "");
    }

    #[test]
    fn test_truncate_chars_short_text_unchanged() {
        assert_eq!(truncate_chars("short", 3000), "short");
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語");
    }

    #[test]
    fn test_truncate_chars_exact_limit() {
        assert_eq!(truncate_chars("abcde", 5), "abcde");
        assert_eq!(truncate_chars("abcdef", 5), "abcde");
    }

    #[test]
    fn test_chain_from_languages() {
        let chain = FetchStrategy::chain(&["de".to_string(), "en".to_string()]);
        assert_eq!(
            chain,
            vec![
                FetchStrategy::Languages(vec!["de".to_string(), "en".to_string()]),
                FetchStrategy::AnyLanguage,
            ]
        );
        assert_eq!(FetchStrategy::chain(&[]), vec![FetchStrategy::AnyLanguage]);
        assert_eq!(FetchStrategy::chain(&["en".to_string()]), FetchStrategy::default_chain());
    }

    #[tokio::test]
    async fn test_english_success_stops_chain() {
        let fetcher = ScriptedFetcher::new(Some(transcript("en", &["one", "two"])), None);
        let fetched = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap();

        assert_eq!(fetched.text, "one two");
        assert_eq!(fetched.language, "en");
        assert_eq!(fetched.strategy, FetchStrategy::english());
        assert!(fetched.failures.is_empty());
        assert_eq!(fetcher.calls(), vec![FetchStrategy::english()]);
    }

    #[tokio::test]
    async fn test_falls_back_to_any_language() {
        let fetcher = ScriptedFetcher::new(None, Some(transcript("de", &["Hallo", "Welt"])));
        let fetched = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap();

        assert_eq!(fetched.text, "Hallo Welt");
        assert_eq!(fetched.language, "de");
        assert_eq!(fetched.strategy, FetchStrategy::AnyLanguage);
        assert_eq!(fetched.failures.len(), 1);
        assert_eq!(fetched.failures[0].strategy, FetchStrategy::english());
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_all_strategies_fail() {
        let fetcher = ScriptedFetcher::new(None, None);
        let err = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap_err();

        match err {
            Error::TranscriptUnavailable { video_id, attempts } => {
                assert_eq!(video_id, "abc123");
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].strategy, FetchStrategy::english());
                assert_eq!(attempts[1].strategy, FetchStrategy::AnyLanguage);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_transcripts_are_failures() {
        let fetcher = ScriptedFetcher::new(Some(transcript("en", &[])), Some(transcript("de", &[])));
        let err = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap_err();

        match err {
            Error::TranscriptUnavailable { attempts, .. } => {
                assert_eq!(attempts.len(), 2);
                assert!(
                    attempts
                        .iter()
                        .all(|a| matches!(a.error, TranscriptError::Empty { ref video_id } if video_id == "abc123"))
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_english_falls_back_to_any_language() {
        let fetcher = ScriptedFetcher::new(Some(transcript("en", &[])), Some(transcript("fr", &["Bonjour"])));
        let fetched = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap();

        assert_eq!(fetched.text, "Bonjour");
        assert_eq!(fetched.failures.len(), 1);
        assert!(matches!(fetched.failures[0].error, TranscriptError::Empty { .. }));
    }

    #[tokio::test]
    async fn test_long_transcript_is_cut_to_limit() {
        let segment = "x".repeat(1000);
        let texts = vec![segment.as_str(); 4];
        let fetcher = ScriptedFetcher::new(Some(transcript("en", &texts)), None);
        let fetched = fetch_transcript(&fetcher, "abc123", &FetchStrategy::default_chain())
            .await
            .unwrap();

        assert_eq!(fetched.text.chars().count(), TRANSCRIPT_CHAR_LIMIT);
        // 1000 x's, a space, 1000 x's, a space, then 998 x's
        assert_eq!(&fetched.text[1000..1001], " ");
        assert_eq!(&fetched.text[2001..2002], " ");
        assert!(fetched.text.ends_with(&"x".repeat(998)));
    }
}
