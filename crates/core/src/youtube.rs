//! Caption track listing and timed text download through YouTube's InnerTube API.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::{
    transcript::{TranscriptApi, TranscriptError, TranscriptList, TranscriptListing, TranscriptTrack},
    types::{Segment, VideoId},
};

pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";
const API_KEY_PATTERN: &str = r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#;

pub struct YoutubeTranscriptClient {
    client: reqwest::Client,
    base_url: String,
}

impl YoutubeTranscriptClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, YOUTUBE_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String, TranscriptError> {
        let response = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id.as_str())])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?;
        check_status(&response, video_id)?;
        Ok(response.text().await?)
    }

    fn extract_api_key(&self, html: &str, video_id: &VideoId) -> Result<String, TranscriptError> {
        if html.contains("g-recaptcha") {
            return Err(TranscriptError::IpBlocked(video_id.to_string()));
        }

        let pattern = Regex::new(API_KEY_PATTERN)
            .map_err(|_| TranscriptError::Unparsable(video_id.to_string()))?;
        pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|key| key.as_str().to_string())
            .ok_or_else(|| TranscriptError::Unparsable(video_id.to_string()))
    }

    async fn fetch_player(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let response = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .json(&serde_json::json!({
                "context": {
                    "client": {
                        "clientName": INNERTUBE_CLIENT_NAME,
                        "clientVersion": INNERTUBE_CLIENT_VERSION,
                    }
                },
                "videoId": video_id.as_str(),
            }))
            .send()
            .await?;
        check_status(&response, video_id)?;
        Ok(response.json::<PlayerResponse>().await?)
    }
}

#[async_trait]
impl TranscriptApi for YoutubeTranscriptClient {
    async fn list(&self, video_id: &VideoId) -> Result<TranscriptListing, TranscriptError> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = self.extract_api_key(&html, video_id)?;
        let player = self.fetch_player(video_id, &api_key).await?;

        player.assert_playable(video_id)?;

        let Some(renderer) = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
        else {
            return Ok(TranscriptListing::Disabled);
        };

        let tracks: Vec<TranscriptTrack> = renderer
            .caption_tracks
            .into_iter()
            .map(CaptionTrack::into_track)
            .collect();
        debug!(%video_id, tracks = tracks.len(), "listed caption tracks");

        if tracks.is_empty() {
            return Ok(TranscriptListing::Disabled);
        }
        Ok(TranscriptListing::Tracks(TranscriptList::new(
            video_id.clone(),
            tracks,
        )))
    }

    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<Segment>, TranscriptError> {
        let response = self
            .client
            .get(format!("{}&fmt=json3", track.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TranscriptError::TrackStatus {
                language_code: track.language_code.clone(),
                status: response.status().as_u16(),
            });
        }
        let timed_text = response.json::<TimedText>().await?;
        Ok(timed_text.into_segments())
    }
}

fn check_status(response: &reqwest::Response, video_id: &VideoId) -> Result<(), TranscriptError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::IpBlocked(video_id.to_string()));
    }
    if !status.is_success() {
        return Err(TranscriptError::Status {
            video_id: video_id.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

impl PlayerResponse {
    fn assert_playable(&self, video_id: &VideoId) -> Result<(), TranscriptError> {
        match &self.playability_status {
            Some(status) if status.status != "OK" => Err(TranscriptError::Unplayable {
                video_id: video_id.to_string(),
                reason: status
                    .reason
                    .clone()
                    .unwrap_or_else(|| status.status.clone()),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: String,
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<Runs>,
    kind: Option<String>,
}

impl CaptionTrack {
    fn into_track(self) -> TranscriptTrack {
        let language = self
            .name
            .and_then(|name| name.runs.into_iter().next())
            .map(|run| run.text)
            .unwrap_or_else(|| self.language_code.clone());

        TranscriptTrack {
            is_generated: self.kind.as_deref() == Some("asr"),
            base_url: self.base_url.replace("&fmt=srv3", ""),
            language_code: self.language_code,
            language,
        }
    }
}

#[derive(Deserialize)]
struct Runs {
    #[serde(default)]
    runs: Vec<Run>,
}

#[derive(Deserialize)]
struct Run {
    text: String,
}

#[derive(Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    segs: Option<Vec<TimedTextSeg>>,
}

#[derive(Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

impl TimedText {
    fn into_segments(self) -> Vec<Segment> {
        self.events
            .into_iter()
            .filter_map(|event| {
                let raw: String = event.segs?.into_iter().map(|seg| seg.utf8).collect();
                let text = raw.replace('\n', " ").trim().to_string();
                (!text.is_empty()).then(|| Segment {
                    start: event.t_start_ms as f64 / 1000.0,
                    duration: event.d_duration_ms as f64 / 1000.0,
                    text,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;
    use crate::extract_video_id;

    const WATCH_HTML: &str =
        r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaTestKey_123"});</script></html>"#;

    fn vid() -> VideoId {
        extract_video_id("https://youtu.be/abc123").unwrap()
    }

    async fn mount_watch_page(server: &MockServer, html: &str) {
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(server)
            .await;
    }

    async fn mount_player(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/player"))
            .and(query_param("key", "AIzaTestKey_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> YoutubeTranscriptClient {
        YoutubeTranscriptClient::with_base_url(reqwest::Client::new(), server.uri())
    }

    #[tokio::test]
    async fn lists_manual_and_generated_tracks() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_HTML).await;
        mount_player(
            &server,
            serde_json::json!({
                "playabilityStatus": {"status": "OK"},
                "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {
                        "baseUrl": format!("{}/api/timedtext?v=abc123&lang=de&fmt=srv3", server.uri()),
                        "languageCode": "de",
                        "name": {"runs": [{"text": "German (auto-generated)"}]},
                        "kind": "asr"
                    },
                    {
                        "baseUrl": format!("{}/api/timedtext?v=abc123&lang=fr", server.uri()),
                        "languageCode": "fr",
                        "name": {"runs": [{"text": "French"}]}
                    }
                ]}}
            }),
        )
        .await;

        let TranscriptListing::Tracks(list) = client(&server).list(&vid()).await.unwrap() else {
            panic!("expected tracks");
        };

        let codes: Vec<_> = list.tracks().iter().map(|t| t.language_code.as_str()).collect();
        assert_eq!(codes, ["fr", "de"]);
        let german = list.find(&["de"]).unwrap();
        assert!(german.is_generated);
        assert_eq!(german.language, "German (auto-generated)");
        assert!(!german.base_url.contains("fmt=srv3"));
    }

    #[tokio::test]
    async fn missing_captions_means_disabled() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_HTML).await;
        mount_player(&server, serde_json::json!({"playabilityStatus": {"status": "OK"}})).await;

        let listing = client(&server).list(&vid()).await.unwrap();
        assert!(matches!(listing, TranscriptListing::Disabled));
    }

    #[tokio::test]
    async fn unplayable_video_is_an_error() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_HTML).await;
        mount_player(
            &server,
            serde_json::json!({"playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}}),
        )
        .await;

        let err = client(&server).list(&vid()).await.err().unwrap();
        assert!(matches!(err, TranscriptError::Unplayable { .. }));
        assert!(err.to_string().contains("Video unavailable"));
    }

    #[tokio::test]
    async fn recaptcha_page_means_ip_blocked() {
        let server = MockServer::start().await;
        mount_watch_page(&server, r#"<div class="g-recaptcha"></div>"#).await;

        let err = client(&server).list(&vid()).await.err().unwrap();
        assert!(matches!(err, TranscriptError::IpBlocked(_)));
    }

    #[tokio::test]
    async fn rate_limited_watch_page_means_ip_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server).list(&vid()).await.err().unwrap();
        assert!(matches!(err, TranscriptError::IpBlocked(_)));
    }

    #[tokio::test]
    async fn missing_api_key_is_unparsable() {
        let server = MockServer::start().await;
        mount_watch_page(&server, "<html></html>").await;

        let err = client(&server).list(&vid()).await.err().unwrap();
        assert!(matches!(err, TranscriptError::Unparsable(_)));
    }

    #[test]
    fn api_key_is_scraped_from_watch_page() {
        let client = YoutubeTranscriptClient::new(reqwest::Client::new());
        assert_eq!(
            client.extract_api_key(WATCH_HTML, &vid()).unwrap(),
            "AIzaTestKey_123"
        );
        assert!(matches!(
            client.extract_api_key(r#"{"INNERTUBE_API_KEY": ""}"#, &vid()),
            Err(TranscriptError::Unparsable(_))
        ));
    }

    #[tokio::test]
    async fn fetches_json3_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .and(query_param("fmt", "json3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "events": [
                    {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello"}, {"utf8": " there"}]},
                    {"tStartMs": 1500, "dDurationMs": 10},
                    {"tStartMs": 1600, "dDurationMs": 2000, "segs": [{"utf8": "\n"}]},
                    {"tStartMs": 2000, "dDurationMs": 2500, "segs": [{"utf8": "general\nKenobi"}]}
                ]
            })))
            .mount(&server)
            .await;

        let track = TranscriptTrack {
            language_code: "en".into(),
            language: "English".into(),
            is_generated: false,
            base_url: format!("{}/api/timedtext?v=abc123&lang=en", server.uri()),
        };

        let segments = client(&server).fetch(&track).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello there");
        assert_eq!(segments[0].duration, 1.5);
        assert_eq!(segments[1].text, "general Kenobi");
        assert_eq!(segments[1].start, 2.0);
    }
}
