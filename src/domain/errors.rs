use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Retrieval provider error: {0}")]
    RetrievalProvider(String),

    #[error("Completion provider error: {0}")]
    CompletionProvider(String),

    /// Failure after the first byte of the response body was sent.
    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingProvider(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::RetrievalProvider(msg.into())
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Self::CompletionProvider(msg.into())
    }

    pub fn streaming(msg: impl Into<String>) -> Self {
        Self::Streaming(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code for API error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::EmbeddingProvider(_) => "EMBEDDING_PROVIDER_ERROR",
            Self::RetrievalProvider(_) => "RETRIEVAL_PROVIDER_ERROR",
            Self::CompletionProvider(_) => "COMPLETION_PROVIDER_ERROR",
            Self::Streaming(_) => "STREAMING_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
