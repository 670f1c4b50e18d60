use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI text embeddings over a rig client built once at startup.
pub struct TextEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    /// Uses the same key and base URL as the chat completion adapter.
    pub fn from_config(
        config: &EmbeddingConfig,
        api_key: &SecretString,
        base_url: &str,
    ) -> Result<Self, DomainError> {
        let client = openai::Client::builder()
            .api_key(api_key.expose_secret())
            .base_url(base_url.trim_end_matches('/'))
            .build()
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model, len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::embedding("cannot embed empty text"));
        }

        let model = self.client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text)
            .map_err(|e| DomainError::embedding(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(|(_doc, emb)| {
                let vec_f32: Vec<f32> = emb.first().vec.into_iter().map(|x| x as f32).collect();
                Embedding::new(vec_f32)
            })
            .ok_or_else(|| DomainError::embedding("no embedding returned"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
