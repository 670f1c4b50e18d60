use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::{errors::DomainError, Message};

/// Incremental text fragments in provider order. Fragments may be empty.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send + 'static>>;

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Opens a streamed completion. Resolves once the provider has accepted the request.
    async fn stream(&self, messages: Vec<Message>) -> Result<TextStream, DomainError>;
}
