use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{
    ports::{ChatCompletion, TextStream},
    DomainError, Message,
};
use crate::infrastructure::config::LlmConfig;

const DONE_MARKER: &str = "[DONE]";

/// Streams chat completions from an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DomainError::completion(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

/// Text carried by one SSE payload, `None` for the end-of-stream marker.
fn parse_chunk(data: &str) -> Result<Option<String>, DomainError> {
    if data.trim() == DONE_MARKER {
        return Ok(None);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| DomainError::streaming(format!("invalid completion chunk: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(DomainError::streaming(error.message));
    }

    Ok(Some(
        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .unwrap_or_default(),
    ))
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn stream(&self, messages: Vec<Message>) -> Result<TextStream, DomainError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::completion(format!(
                "chat completion returned {status}: {body}"
            )));
        }

        tracing::debug!("completion stream opened");

        let events = response.bytes_stream().eventsource();
        let stream = async_stream::stream! {
            let mut events = Box::pin(events);
            while let Some(event) = events.next().await {
                let parsed = event
                    .map_err(|e| DomainError::streaming(e.to_string()))
                    .and_then(|event| parse_chunk(&event.data));
                match parsed {
                    Ok(Some(text)) => {
                        yield Ok(text);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
