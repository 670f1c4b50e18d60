use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identifier, available to handlers as an extension.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Tags the request with an id and logs when response headers go out.
///
/// For streamed bodies the duration is time to first byte, not time to completion.
pub async fn request_logger(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(request_id);
    let start = Instant::now();

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id.0.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    info!(
        request_id = %request_id.0,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        headers_ms = %duration.as_millis(),
        "Response started"
    );

    response
}
