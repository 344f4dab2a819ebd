//! HTTP client for the sentiment/emotion analysis service
//!
//! The service scores text, audio clips and video frames and writes its
//! results straight back into the document store; apart from the chat
//! reply, nothing comes back synchronously. Callers therefore treat most
//! of these as fire-and-forget notifications.

use crate::error::from_reqwest;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

/// Default request timeout; the service itself imposes none
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations of the external analysis service
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Notify that a forum message was posted; fire-and-forget
    async fn analyze_post(&self, post_id: &str, room_id: &str) -> Result<()>;

    /// Request text-sentiment analysis of a persisted journal entry
    async fn analyze_note(&self, user_id: &str, note_id: &str) -> Result<()>;

    /// Submit a WAV clip for audio-emotion analysis
    ///
    /// `assessment` distinguishes assessment-flow submissions from
    /// free-form journal audio.
    async fn analyze_audio(&self, user_id: &str, assessment: bool, wav: Vec<u8>) -> Result<()>;

    /// Submit a JPEG frame for video-emotion analysis
    async fn analyze_image(&self, user_id: &str, assessment: bool, jpeg: Vec<u8>) -> Result<()>;

    /// Request a conversational reply from the support assistant
    async fn reflect(&self, prompt: &str, user_id: &str) -> Result<String>;
}

/// reqwest-backed analysis gateway
pub struct HttpAnalysisGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(from_reqwest)?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(HttpAnalysisGateway { client, base_url })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn check(response: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(Error::Network(format!(
            "{} returned {}: {}",
            endpoint, status, snippet
        )))
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    async fn analyze_post(&self, post_id: &str, room_id: &str) -> Result<()> {
        debug!(post_id, room_id, "notifying analysis of forum post");
        let response = self
            .client
            .post(self.url("analyze_post"))
            .query(&[("post_id", post_id), ("room_id", room_id)])
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response, "analyze_post").await?;
        Ok(())
    }

    async fn analyze_note(&self, user_id: &str, note_id: &str) -> Result<()> {
        debug!(user_id, note_id, "requesting note analysis");
        let response = self
            .client
            .post(self.url("analyze_note"))
            .query(&[("user_id", user_id), ("note_id", note_id)])
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response, "analyze_note").await?;
        Ok(())
    }

    async fn analyze_audio(&self, user_id: &str, assessment: bool, wav: Vec<u8>) -> Result<()> {
        debug!(user_id, assessment, bytes = wav.len(), "submitting audio clip");
        let part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(from_reqwest)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("analyze_audio"))
            .query(&[("user_id", user_id), ("q", bool_str(assessment))])
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response, "analyze_audio").await?;
        Ok(())
    }

    async fn analyze_image(&self, user_id: &str, assessment: bool, jpeg: Vec<u8>) -> Result<()> {
        debug!(user_id, assessment, bytes = jpeg.len(), "submitting video frame");
        let part = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(from_reqwest)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("analyze_image"))
            .query(&[("user_id", user_id), ("q", bool_str(assessment))])
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response, "analyze_image").await?;
        Ok(())
    }

    async fn reflect(&self, prompt: &str, user_id: &str) -> Result<String> {
        debug!(user_id, "requesting support-bot reply");
        let response = self
            .client
            .post(self.url("reflect"))
            .query(&[("prompt", prompt), ("user_id", user_id)])
            .send()
            .await
            .map_err(from_reqwest)?;
        let response = Self::check(response, "reflect").await?;
        response.text().await.map_err(from_reqwest)
    }
}

/// Query values match the original wire format ("true"/"false")
fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let gw = HttpAnalysisGateway::new("http://analysis.example:8000///").unwrap();
        assert_eq!(gw.url("reflect"), "http://analysis.example:8000/reflect");
    }

    #[test]
    fn test_bool_str_wire_format() {
        assert_eq!(bool_str(true), "true");
        assert_eq!(bool_str(false), "false");
    }
}
