//! HTTP resolver adapter.
//!
//! Talks to an extraction service that answers `GET <endpoint>?url=<page>` with
//! `{"data": {"title": ..., "high": ..., "low": ..., "audio": ...}}`. A missing or
//! null `data` means nothing downloadable was found.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use subbot_core::{errors::Error, media::ExtractedMedia, ports::MediaExtractor, Result};

#[derive(Clone, Debug)]
pub struct HttpExtractor {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    data: Option<ResolveData>,
}

#[derive(Deserialize)]
struct ResolveData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    high: Option<String>,
    #[serde(default)]
    low: Option<String>,
    #[serde(default)]
    audio: Option<String>,
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl MediaExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("resolver request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Resolution(format!(
                "resolver failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ResolveResponse = resp
            .json()
            .await
            .map_err(|e| Error::Resolution(format!("resolver json error: {e}")))?;

        let media = parsed.data.map(|d| ExtractedMedia {
            title: d.title,
            high: d.high,
            low: d.low,
            audio: d.audio,
        });
        debug!(found = media.is_some(), "http resolver answered");
        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn extractor(server: &MockServer) -> HttpExtractor {
        HttpExtractor::new(format!("{}/resolve", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn maps_data_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resolve"))
            .and(query_param("url", "https://example.com/video123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"title": "Clip", "high": "https://cdn/video.mp4", "low": "https://cdn/low.mp4"}
            })))
            .mount(&server)
            .await;

        let media = extractor(&server)
            .await
            .extract("https://example.com/video123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(media.high.as_deref(), Some("https://cdn/video.mp4"));
        assert_eq!(media.low.as_deref(), Some("https://cdn/low.mp4"));
        assert!(media.audio.is_none());
    }

    #[tokio::test]
    async fn missing_data_is_no_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": false, "data": null})),
            )
            .mount(&server)
            .await;

        let out = extractor(&server).await.extract("https://e.com/x").await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn server_error_is_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = extractor(&server)
            .await
            .extract("https://e.com/x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }
}
