use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::transcript::{FetchStrategy, TranscriptFetcher};
use crate::{Segment, Transcript, TranscriptError};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// The WEB client no longer hands out caption URLs without a proof-of-origin token.
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("api key pattern"));
static API_KEY_LEGACY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("legacy api key pattern"));

type Result<T> = std::result::Result<T, TranscriptError>;

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches transcripts from YouTube's built-in captions via the InnerTube API
#[derive(Debug, Clone, Default)]
pub struct CaptionClient {
    client: reqwest::Client,
}

impl CaptionClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_captions(&self, video_id: &str, strategy: &FetchStrategy) -> Result<Transcript> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(status) = resp.playability_status.as_ref().filter(|s| s.status != "OK") {
            return Err(TranscriptError::VideoUnavailable {
                video_id: video_id.to_string(),
                reason: status.reason.clone().unwrap_or_else(|| status.status.clone()),
            });
        }

        let title = resp
            .video_details
            .as_ref()
            .and_then(|vd| vd.title.clone())
            .unwrap_or_default();

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        let track = select_track(video_id, &tracks, strategy)?;
        debug!(
            "Using caption track: lang={} generated={}",
            track.language_code,
            track.is_generated()
        );

        // Step 3: Fetch the caption XML
        let caption_xml = self
            .client
            .get(timedtext_url(&track.base_url))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_caption_xml(&caption_xml)?;

        Ok(Transcript {
            video_id: video_id.to_string(),
            title,
            language: track.language_code.clone(),
            generated: track.is_generated(),
            segments,
        })
    }
}

impl TranscriptFetcher for CaptionClient {
    async fn fetch(&self, video_id: &str, strategy: &FetchStrategy) -> Result<Transcript> {
        self.fetch_captions(video_id, strategy).await
    }
}

/// Pick the caption track a strategy asks for.
///
/// Uploaded captions win over auto-generated ones for the same language.
fn select_track<'a>(video_id: &str, tracks: &'a [CaptionTrack], strategy: &FetchStrategy) -> Result<&'a CaptionTrack> {
    if tracks.is_empty() {
        return Err(TranscriptError::CaptionsDisabled {
            video_id: video_id.to_string(),
        });
    }

    let best_for = |lang: &str| {
        let mut candidates = tracks.iter().filter(|t| t.language_code == lang);
        let first = candidates.clone().next();
        candidates.find(|t| !t.is_generated()).or(first)
    };

    match strategy {
        FetchStrategy::Languages(langs) => langs.iter().find_map(|lang| best_for(lang.as_str())).ok_or_else(|| {
            TranscriptError::NoTranscriptFound {
                video_id: video_id.to_string(),
                requested: langs.clone(),
                available: tracks.iter().map(|t| t.language_code.clone()).collect(),
            }
        }),
        FetchStrategy::AnyLanguage => Ok(tracks
            .iter()
            .find(|t| !t.is_generated())
            .unwrap_or(&tracks[0])),
    }
}

/// Caption URLs may ask for the srv3 format; the parser expects the plain timed-text XML
fn timedtext_url(base_url: &str) -> String {
    base_url.replace("&fmt=srv3", "")
}

fn extract_api_key(html: &str) -> Result<String> {
    if let Some(caps) = API_KEY_RE.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the older pattern
    if let Some(caps) = API_KEY_LEGACY_RE.captures(html) {
        return Ok(caps[1].to_string());
    }

    Err(TranscriptError::ApiKeyNotFound)
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                // Some tracks omit dur on the final cue
                current_dur = dur.or(Some(0.0));
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> with no content — skip
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                // Cue closed without content; whitespace after it is not caption text
                current_start = None;
                current_dur = None;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.trim().is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TranscriptError::MalformedCaptions(e.to_string())),
            _ => {}
        }
    }

    Ok(segments)
}
