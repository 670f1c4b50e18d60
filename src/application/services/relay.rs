use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::{ports::TextStream, DomainError};

/// Lifecycle of one relayed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Streaming,
    Completed,
    Errored,
}

/// Tracks the relay state. Logs a disconnect if dropped while still streaming.
struct RelayProgress {
    state: StreamState,
    fragments: usize,
    bytes: usize,
}

impl RelayProgress {
    fn new() -> Self {
        Self {
            state: StreamState::NotStarted,
            fragments: 0,
            bytes: 0,
        }
    }

    fn transition(&mut self, next: StreamState) {
        debug!(from = ?self.state, to = ?next, "relay state");
        self.state = next;
    }

    fn record(&mut self, fragment: &str) {
        self.fragments += 1;
        self.bytes += fragment.len();
    }
}

impl Drop for RelayProgress {
    fn drop(&mut self) {
        match self.state {
            StreamState::Completed => {
                info!(fragments = self.fragments, bytes = self.bytes, "response completed")
            }
            StreamState::Errored => {
                warn!(fragments = self.fragments, bytes = self.bytes, "response ended with error")
            }
            StreamState::Streaming => warn!(
                fragments = self.fragments,
                bytes = self.bytes,
                "caller disconnected, upstream generation released"
            ),
            StreamState::NotStarted => debug!("response dropped before streaming"),
        }
    }
}

/// Forwards non-empty fragments from `upstream` as they arrive.
///
/// Ends after the upstream finishes, or after yielding exactly one error. Waiting longer than
/// `idle_timeout` for the next fragment is an error. Nothing is read from upstream until the
/// returned stream is polled, and dropping it drops the upstream.
pub fn relay(
    upstream: TextStream,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<String, DomainError>> + Send + 'static {
    async_stream::stream! {
        let mut upstream = upstream;
        let mut progress = RelayProgress::new();
        progress.transition(StreamState::Streaming);

        loop {
            match tokio::time::timeout(idle_timeout, upstream.next()).await {
                Ok(Some(Ok(fragment))) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    progress.record(&fragment);
                    yield Ok(fragment);
                }
                Ok(Some(Err(e))) => {
                    progress.transition(StreamState::Errored);
                    yield Err(into_streaming(e));
                    break;
                }
                Ok(None) => {
                    progress.transition(StreamState::Completed);
                    break;
                }
                Err(_) => {
                    progress.transition(StreamState::Errored);
                    yield Err(DomainError::streaming(format!(
                        "no fragment received within {idle_timeout:?}"
                    )));
                    break;
                }
            }
        }
    }
}

fn into_streaming(error: DomainError) -> DomainError {
    match error {
        DomainError::Streaming(_) => error,
        other => DomainError::streaming(other.to_string()),
    }
}
