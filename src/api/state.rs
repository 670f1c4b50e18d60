use std::sync::Arc;
use std::time::Duration;

use crate::application::{RagService, Timeouts};
use crate::domain::DomainError;
use crate::infrastructure::{AppConfig, Config, OpenAiChat, PineconeIndex, TextEmbedding};

#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(rag: Arc<RagService>, config: AppConfig) -> Self {
        Self {
            rag,
            config: Arc::new(config),
        }
    }

    /// Builds the provider adapters once; their HTTP clients are shared across requests.
    pub async fn from_config(mut config: AppConfig) -> Result<Self, DomainError> {
        let openai_key = config.secrets.take_openai_api_key()?;
        let index_key = config.secrets.take_vector_index_api_key()?;
        let cfg = &config.config;

        let embedding = Arc::new(TextEmbedding::from_config(
            &cfg.embedding,
            &openai_key,
            &cfg.llm.base_url,
        )?);
        let index = Arc::new(PineconeIndex::connect(&cfg.vector_index, index_key).await?);
        let completion = Arc::new(OpenAiChat::new(&cfg.llm, openai_key)?);

        let rag = RagService::new(
            embedding,
            index,
            completion,
            config.prompts.agent.system.clone(),
        )
        .with_timeouts(timeouts(cfg));

        Ok(Self::new(Arc::new(rag), config))
    }
}

fn timeouts(cfg: &Config) -> Timeouts {
    Timeouts {
        embedding: Duration::from_secs(cfg.embedding.timeout_seconds),
        retrieval: Duration::from_secs(cfg.vector_index.timeout_seconds),
        completion: Duration::from_secs(cfg.llm.timeout_seconds),
        stream_idle: Duration::from_secs(cfg.llm.stream_idle_timeout_seconds),
    }
}
