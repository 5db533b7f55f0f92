use crate::Error;
use crate::pipeline::Summary;
use crate::transcript::{FailedAttempt, FetchStrategy};

pub const INVALID_URL: &str = "Invalid URL";
pub const TRANSCRIPT_UNAVAILABLE: &str = "Error getting transcript";

/// Render the summary panel: heading, optional provenance line, then the text
pub fn render_summary(summary: &Summary, verbose: bool) -> String {
    let mut out = String::from("Summary:\n");
    if verbose {
        let title = if summary.title.is_empty() {
            summary.video_id.clone()
        } else {
            format!("{} ({})", summary.title, summary.video_id)
        };
        out.push_str(&format!(
            "[{title} · lang={} · {} transcript chars]\n",
            summary.language, summary.transcript_chars
        ));
    }
    out.push('\n');
    out.push_str(summary.text.trim_end());
    out
}

/// One-line message for a failed submission
pub fn render_error(err: &Error) -> String {
    match err {
        Error::InvalidUrl { .. } => INVALID_URL.to_string(),
        Error::TranscriptUnavailable { .. } => TRANSCRIPT_UNAVAILABLE.to_string(),
        Error::Model(e) => format!("Error generating summary: {e}"),
    }
}

/// Message for a fetch strategy that did not work out
pub fn render_attempt(attempt: &FailedAttempt) -> String {
    let scope = match &attempt.strategy {
        FetchStrategy::Languages(langs) if langs.len() == 1 && langs[0] == "en" => "in English".to_string(),
        FetchStrategy::Languages(langs) => format!("in {}", langs.join("/")),
        FetchStrategy::AnyLanguage => "in other languages".to_string(),
    };
    format!("Error getting transcript {scope}: {}", attempt.error)
}
