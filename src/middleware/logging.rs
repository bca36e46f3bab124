use crate::middleware::Middleware;
use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// A middleware that logs request timing and status
#[derive(Clone, Default)]
pub struct RequestLogging;

#[async_trait]
impl Middleware for RequestLogging {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let start = Instant::now();

        tracing::debug!("--> {} {}", method, uri);

        let response = next.run(request).await;
        let duration = start.elapsed();
        let status = response.status();
        if status.is_server_error() {
            tracing::warn!("<-- {} {} {} {:?}", method, uri, status, duration);
        } else {
            tracing::info!("<-- {} {} {} {:?}", method, uri, status, duration);
        }
        response
    }
}
