use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use futures::StreamExt;
use tracing::{info_span, Instrument};

use crate::api::error::ApiError;
use crate::api::middleware::logging::RequestId;
use crate::api::state::AppState;
use crate::domain::{Conversation, DomainError, Message};

/// Parses the raw body as an ordered `[{ role, content }, ...]` conversation.
pub fn parse_conversation(body: &[u8]) -> Result<Conversation, DomainError> {
    let messages: Vec<Message> = serde_json::from_slice(body)
        .map_err(|e| DomainError::malformed(format!("expected a list of messages: {e}")))?;
    Conversation::from_messages(messages)
}

/// Streams the recommendation as plain UTF-8 text.
///
/// Every failure before the provider accepts the completion request is returned as a JSON
/// error with a non-200 status. Failures after that abort the chunked body.
pub async fn chat_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let span = info_span!("chat", request_id = %request_id.0);

    async move {
        let conversation = parse_conversation(&body)?;
        tracing::debug!(history = conversation.history().len(), "conversation parsed");

        let fragments = state.rag.answer(&conversation).await?;
        let body = Body::from_stream(fragments.map(|fragment| fragment.map(Bytes::from)));

        Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::api::create_router;
    use crate::application::testing::{
        two_matches, FakeCompletion, FakeEmbedding, FakeIndex, Harness,
    };
    use crate::infrastructure::AppConfig;

    fn router(harness: &Harness) -> Router {
        let state = AppState::new(Arc::new(harness.service()), AppConfig::default());
        create_router(state)
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_streams_plain_text() {
        let harness = Harness::new(
            FakeEmbedding::default(),
            FakeIndex::with_matches(two_matches()),
            FakeCompletion::replying(vec![Ok("Professor: "), Ok(""), Ok("ProfA")]),
        );

        let response = router(&harness)
            .oneshot(post_chat(
                r#"[{"role":"user","content":"Who teaches calculus well?"}]"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert!(response.headers().contains_key("x-request-id"));
        assert!(!response.headers().contains_key(header::CONTENT_LENGTH));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Professor: ProfA");

        let calls = harness.completion_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_rejected() {
        for body in [
            "",
            "{}",
            "[]",
            r#"{"messages":[{"role":"user","content":"hi"}]}"#,
            r#"[{"role":"user"}]"#,
            r#"[{"role":"robot","content":"hi"}]"#,
            r#"[{"role":"user","content":42}]"#,
        ] {
            let harness = Harness::new(
                FakeEmbedding::default(),
                FakeIndex::default(),
                FakeCompletion::default(),
            );

            let response = router(&harness).oneshot(post_chat(body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            let json = json_body(response).await;
            assert_eq!(json["error"]["code"], "MALFORMED_REQUEST");
            assert!(harness.embedding.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_returns_bad_gateway_without_streaming() {
        let harness = Harness::new(
            FakeEmbedding {
                fail: true,
                ..FakeEmbedding::default()
            },
            FakeIndex::default(),
            FakeCompletion::replying(vec![Ok("never sent")]),
        );

        let response = router(&harness)
            .oneshot(post_chat(r#"[{"role":"user","content":"hi"}]"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "EMBEDDING_PROVIDER_ERROR");
        assert!(harness.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_returns_bad_gateway() {
        let harness = Harness::new(
            FakeEmbedding::default(),
            FakeIndex {
                fail: true,
                ..FakeIndex::default()
            },
            FakeCompletion::default(),
        );

        let response = router(&harness)
            .oneshot(post_chat(r#"[{"role":"user","content":"hi"}]"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "RETRIEVAL_PROVIDER_ERROR");
        assert!(harness.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_error_aborts_body_after_delivered_bytes() {
        let harness = Harness::new(
            FakeEmbedding::default(),
            FakeIndex::default(),
            FakeCompletion::replying(vec![
                Ok("Dr. "),
                Ok("Carter"),
                Err(DomainError::streaming("connection reset")),
            ]),
        );

        let response = router(&harness)
            .oneshot(post_chat(r#"[{"role":"user","content":"psychology?"}]"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let frames: Vec<_> = response.into_body().into_data_stream().collect().await;

        let delivered: Vec<u8> = frames
            .iter()
            .take_while(|f| f.is_ok())
            .flat_map(|f| f.as_ref().unwrap().to_vec())
            .collect();
        assert_eq!(delivered, b"Dr. Carter");
        assert!(frames.last().unwrap().is_err());
        assert_eq!(frames.iter().filter(|f| f.is_err()).count(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let harness = Harness::new(
            FakeEmbedding::default(),
            FakeIndex::default(),
            FakeCompletion::default(),
        );

        let response = router(&harness)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[test]
    fn test_parse_conversation_splits_query() {
        let conversation = parse_conversation(
            br#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"},{"role":"user","content":"c"}]"#,
        )
        .unwrap();

        assert_eq!(conversation.query(), "c");
        assert_eq!(conversation.history().len(), 2);
    }
}
