//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many characters are truncated at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_request(&parts, &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn body_to_text(body: Body) -> Result<String, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&body_bytes).to_string())
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None` if it is short enough
/// to log in full.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!(
                "Received request: {} {}\nheaders: {:#?}\nbody: {truncated}...",
                parts.method,
                parts.uri,
                parts.headers
            );
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!(
            "Received request: {} {}\nheaders: {:#?}\nbody: {body:?}",
            parts.method,
            parts.uri,
            parts.headers
        ),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!(
                "Sending response: {}\nheaders: {:#?}\nbody: {truncated}...",
                parts.status,
                parts.headers
            );
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!(
            "Sending response: {}\nheaders: {:#?}\nbody: {body:?}",
            parts.status,
            parts.headers
        ),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, truncate};

    #[test]
    fn short_bodies_are_not_truncated() {
        assert_eq!(truncate("field=amount&value=12"), None);
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT + 10);

        let truncated = truncate(&body).unwrap();

        assert_eq!(truncated.chars().count(), LOG_BODY_LENGTH_LIMIT);
    }

    #[tokio::test]
    async fn middleware_passes_bodies_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = "x".repeat(LOG_BODY_LENGTH_LIMIT * 2);

        let response = server.post("/echo").text(body.clone()).await;

        response.assert_status_ok();
        assert_eq!(response.text(), body);
    }
}
