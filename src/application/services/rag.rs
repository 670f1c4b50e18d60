use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::application::services::relay::relay;
use crate::domain::{
    format_matches,
    ports::{ChatCompletion, EmbeddingService, ReviewIndex, TextStream},
    Conversation, DomainError, Message, ReviewMatch,
};

/// Number of reviews retrieved for every query.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub embedding: Duration,
    pub retrieval: Duration,
    pub completion: Duration,
    pub stream_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            embedding: Duration::from_secs(15),
            retrieval: Duration::from_secs(15),
            completion: Duration::from_secs(30),
            stream_idle: Duration::from_secs(60),
        }
    }
}

/// Embeds the query, retrieves reviews, and opens the streamed answer.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn ReviewIndex>,
    completion: Arc<dyn ChatCompletion>,
    system_prompt: String,
    timeouts: Timeouts,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn ReviewIndex>,
        completion: Arc<dyn ChatCompletion>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            embedding,
            index,
            completion,
            system_prompt: system_prompt.into(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ReviewMatch>, DomainError> {
        let embedding = deadline(
            "embedding",
            self.timeouts.embedding,
            self.embedding.embed(query),
        )
        .await?;

        let expected = self.embedding.dimension();
        if embedding.dimension() != expected {
            warn!(
                got = embedding.dimension(),
                expected, "embedding dimension differs from configured index dimension"
            );
        }

        deadline(
            "retrieval",
            self.timeouts.retrieval,
            self.index.query(&embedding, TOP_K),
        )
        .await
    }

    /// Runs every pre-stream stage. An `Ok` means the provider accepted the completion request.
    #[instrument(skip(self, conversation), fields(history = conversation.history().len()))]
    pub async fn answer(&self, conversation: &Conversation) -> Result<TextStream, DomainError> {
        let matches = self.retrieve(conversation.query()).await?;
        tracing::debug!(matches = matches.len(), "context retrieved");

        let augmented = augment_query(conversation.query(), &matches);
        let messages = build_messages(&self.system_prompt, conversation.history(), augmented);

        let upstream = deadline(
            "completion",
            self.timeouts.completion,
            self.completion.stream(messages),
        )
        .await?;

        Ok(Box::pin(relay(upstream, self.timeouts.stream_idle)))
    }
}

/// The user's query with the formatted reviews appended.
pub fn augment_query(query: &str, matches: &[ReviewMatch]) -> String {
    let mut augmented = String::from(query);
    augmented.push_str(&format_matches(matches));
    augmented
}

/// System instructions, then prior turns unchanged, then the augmented query as a user turn.
pub fn build_messages(system_prompt: &str, history: &[Message], augmented: String) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(Message::user(augmented));
    messages
}

async fn deadline<T>(
    stage: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, DomainError>>,
) -> Result<T, DomainError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DomainError::timeout(format!("{stage} did not finish within {limit:?}")))?
}
