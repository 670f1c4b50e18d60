//! In-process fakes of the provider ports, shared by service and route tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;

use crate::application::RagService;
use crate::domain::{
    ports::{ChatCompletion, EmbeddingService, ReviewIndex, TextStream},
    DomainError, Embedding, Message, ReviewMatch, ReviewMetadata,
};

#[derive(Default)]
pub struct FakeEmbedding {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
    pub delay: Option<Duration>,
    /// Returned instead of the default 3-value vector.
    pub vector: Option<Vec<f32>>,
}

#[async_trait]
impl EmbeddingService for FakeEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DomainError::embedding("invalid api key"));
        }
        Ok(self
            .vector
            .clone()
            .unwrap_or_else(|| vec![0.1, 0.2, 0.3])
            .into())
    }

    fn dimension(&self) -> usize {
        3
    }
}

#[derive(Default)]
pub struct FakeIndex {
    pub calls: Mutex<Vec<usize>>,
    pub vectors: Mutex<Vec<Embedding>>,
    pub matches: Vec<ReviewMatch>,
    pub fail: bool,
}

impl FakeIndex {
    pub fn with_matches(matches: Vec<ReviewMatch>) -> Self {
        Self {
            matches,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ReviewIndex for FakeIndex {
    async fn query(
        &self,
        vector: &Embedding,
        top_k: usize,
    ) -> Result<Vec<ReviewMatch>, DomainError> {
        self.calls.lock().unwrap().push(top_k);
        self.vectors.lock().unwrap().push(vector.clone());
        if self.fail {
            return Err(DomainError::retrieval("index unreachable"));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Replays scripted fragments and records every request it receives.
#[derive(Default)]
pub struct FakeCompletion {
    pub calls: Mutex<Vec<Vec<Message>>>,
    pub fragments: Mutex<Vec<Result<String, DomainError>>>,
    pub reject: bool,
}

impl FakeCompletion {
    pub fn replying(fragments: Vec<Result<&str, DomainError>>) -> Self {
        Self {
            fragments: Mutex::new(
                fragments
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ChatCompletion for FakeCompletion {
    async fn stream(&self, messages: Vec<Message>) -> Result<TextStream, DomainError> {
        self.calls.lock().unwrap().push(messages);
        if self.reject {
            return Err(DomainError::completion("model overloaded"));
        }
        let fragments = std::mem::take(&mut *self.fragments.lock().unwrap());
        Ok(Box::pin(stream::iter(fragments)))
    }
}

pub fn two_matches() -> Vec<ReviewMatch> {
    vec![
        ReviewMatch::new("ProfA", ReviewMetadata::new("Clear lectures", "Calculus", 5.0)),
        ReviewMatch::new("ProfB", ReviewMetadata::new("Fast-paced", "Calculus II", 3.0)),
    ]
}

pub struct Harness {
    pub embedding: Arc<FakeEmbedding>,
    pub index: Arc<FakeIndex>,
    pub completion: Arc<FakeCompletion>,
}

impl Harness {
    pub fn new(embedding: FakeEmbedding, index: FakeIndex, completion: FakeCompletion) -> Self {
        Self {
            embedding: Arc::new(embedding),
            index: Arc::new(index),
            completion: Arc::new(completion),
        }
    }

    pub fn service(&self) -> RagService {
        RagService::new(
            self.embedding.clone(),
            self.index.clone(),
            self.completion.clone(),
            "SYSTEM",
        )
    }

    pub fn completion_calls(&self) -> Vec<Vec<Message>> {
        self.completion.calls.lock().unwrap().clone()
    }
}
