use serde::Deserialize;

use crate::client::{build_client, ensure_success, map_reqwest_error, BackendSettings};
use crate::EngineError;

#[async_trait::async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String, EngineError>;
}

/// Looks titles up through the public oEmbed endpoint.
#[derive(Debug, Clone)]
pub struct OEmbedTitleResolver {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

impl OEmbedTitleResolver {
    pub fn new(settings: &BackendSettings) -> Result<Self, EngineError> {
        Ok(Self {
            endpoint: settings.oembed_endpoint.clone(),
            client: build_client(settings)?,
        })
    }
}

#[async_trait::async_trait]
impl TitleResolver for OEmbedTitleResolver {
    async fn resolve(&self, url: &str) -> Result<String, EngineError> {
        let params = [("url", url), ("format", "json")];
        let endpoint = url::Url::parse_with_params(&self.endpoint, &params)
            .map_err(|err| EngineError::InvalidUrl(format!("{}: {err}", self.endpoint)))?;
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|err| EngineError::Decode(err.to_string()))?;
        body.title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| EngineError::Decode("oEmbed response has no title".to_string()))
    }
}
