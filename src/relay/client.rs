use super::models::{GenerateRequest, GenerateResponse};
use crate::{
    config::{Config, FailureMode},
    service,
};

/// Talks to the upstream `/api/generate` endpoint.
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    model: Box<str>,
    check_status: bool,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.generate_url(),
            model: config.model.clone(),
            check_status: config.failure_mode == FailureMode::Strict,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn generate(&self, prompt: &str) -> service::Result<GenerateResponse> {
        let request = GenerateRequest::new(&self.model, prompt);

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .inspect_err(|error| tracing::error!("Error sending prompt to {}: {}", self.url, error))?;

        let status = response.status();
        if self.check_status && !status.is_success() {
            tracing::error!("Upstream replied with status {}", status);
            return Err(service::Error::UpstreamStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .inspect_err(|error| tracing::error!("Error reading upstream response body: {}", error))?;

        let reply: GenerateResponse = serde_json::from_slice(&body).map_err(|error| {
            tracing::error!("Error unmarshalling upstream response (status {}): {}", status, error);
            service::Error::InvalidResponse(error.to_string().into())
        })?;

        tracing::debug!(
            "Upstream replied with status {} from model {:?}",
            status,
            reply.model.as_deref().unwrap_or_default()
        );
        Ok(reply)
    }
}
