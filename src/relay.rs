use anyhow::Context;
use axum::body::Bytes;

use crate::{
    config::{Config, FailureMode},
    service,
};

mod client;
pub mod handlers;
pub mod models;

pub use client::UpstreamClient;
pub use handlers::build_router;

/// Everything a request handler needs. Immutable once built.
pub struct Relay {
    client: UpstreamClient,
    failure_mode: FailureMode,
}

impl Relay {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = UpstreamClient::new(config).context("Failed to build upstream client")?;
        Ok(Self {
            client,
            failure_mode: config.failure_mode,
        })
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Turns the raw inbound body into the prompt text.
    pub fn decode_prompt(&self, body: Bytes) -> service::Result<String> {
        match String::from_utf8(body.into()) {
            Ok(prompt) => Ok(prompt),
            Err(error) => match self.failure_mode {
                FailureMode::Strict => {
                    tracing::warn!("Rejecting prompt: {}", error);
                    Err(service::Error::BadRequest("prompt is not valid UTF-8".into()))
                },
                FailureMode::Compat => {
                    tracing::warn!("Prompt is not valid UTF-8, replacing invalid sequences: {}", error);
                    Ok(String::from_utf8_lossy(error.as_bytes()).into_owned())
                },
            },
        }
    }

    /// Relays one prompt and returns the extracted response text, which may be empty.
    pub async fn relay(&self, body: Bytes) -> service::Result<String> {
        let prompt = self.decode_prompt(body)?;
        tracing::debug!("Relaying prompt of {} bytes to {}", prompt.len(), self.client.url());
        let reply = self.client.generate(&prompt).await?;
        Ok(reply.into_text())
    }
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let router = build_router(&config)?;

    let listener = tokio::net::TcpListener::bind(&*config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(
        "Starting server on {}, relaying to {} with model {:?} ({:?} mode)",
        listener.local_addr()?,
        config.generate_url(),
        config.model,
        config.failure_mode,
    );

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")
}
