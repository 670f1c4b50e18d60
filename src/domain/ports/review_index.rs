use crate::domain::{errors::DomainError, Embedding, ReviewMatch};
use async_trait::async_trait;

#[async_trait]
pub trait ReviewIndex: Send + Sync {
    /// Returns at most `top_k` matches, most similar first, with metadata.
    async fn query(&self, vector: &Embedding, top_k: usize)
        -> Result<Vec<ReviewMatch>, DomainError>;
}
