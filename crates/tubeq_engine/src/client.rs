use std::time::Duration;

use url::Url;

use crate::{BackendVariant, EngineError};

/// How a backend accepts a batch of links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitShape {
    /// JSON `{"links": [...]}`, answered with `{"tasks": {id: {"url": ...}}}`.
    JsonTasks,
    /// Form field `links` holding newline-joined links, answered with any 2xx.
    FormAck,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub variant: BackendVariant,
    pub submit_shape: SubmitShape,
    pub submit_path: String,
    /// Shared stream path, or the prefix for `/{task_id}` lookups.
    pub progress_path: String,
    pub download_path: String,
    pub oembed_endpoint: String,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl BackendSettings {
    pub fn for_variant(base_url: impl Into<String>, variant: BackendVariant) -> Self {
        let base_url = base_url.into();
        let common = |submit_shape,
                      submit_path: &str,
                      progress_path: &str,
                      download_path: &str,
                      poll_ms| Self {
            base_url: base_url.clone(),
            variant,
            submit_shape,
            submit_path: submit_path.to_string(),
            progress_path: progress_path.to_string(),
            download_path: download_path.to_string(),
            oembed_endpoint: "https://www.youtube.com/oembed".to_string(),
            poll_interval: Duration::from_millis(poll_ms),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        };
        match variant {
            BackendVariant::EventStream => {
                common(SubmitShape::FormAck, "/start_download", "/progress", "/download", 1000)
            }
            BackendVariant::TaskPoll => {
                common(
                    SubmitShape::JsonTasks,
                    "/api/downloads",
                    "/api/progress",
                    "/downloads",
                    1400,
                )
            }
        }
    }

    /// Absolute URL of `path` on the backend.
    pub fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        let base = Url::parse(&self.base_url)
            .map_err(|err| EngineError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        base.join(path)
            .map_err(|err| EngineError::InvalidUrl(format!("{path}: {err}")))
    }

    /// Per-task progress URL, with the task id escaped as one path segment.
    pub fn task_progress_url(&self, task_id: &str) -> Result<Url, EngineError> {
        let mut url = self.endpoint(&self.progress_path)?;
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(task_id);
        Ok(url)
    }

    /// Link target for a finished file. Not fetched by the client.
    pub fn download_url(&self, filename: &str) -> Result<Url, EngineError> {
        let mut url = self.endpoint(&self.download_path)?;
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(filename);
        Ok(url)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::for_variant("http://127.0.0.1:5000", BackendVariant::EventStream)
    }
}

pub(crate) fn build_client(settings: &BackendSettings) -> Result<reqwest::Client, EngineError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| EngineError::Network(err.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        return EngineError::Timeout;
    }
    if err.is_decode() {
        return EngineError::Decode(err.to_string());
    }
    EngineError::Network(err.to_string())
}

/// Turns a non-success response into an error, using the backend's
/// `{"error": "..."}` body when it sends one.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(EngineError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}
