//! Per-route middleware.
//!
//! Middlewares are attached to controller methods through the annotation layer and wrap
//! the bound handler when the route is installed. The first middleware attached to a method
//! is the outermost one and sees the request first.

mod logging;

pub use logging::RequestLogging;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, routing::MethodRouter};
use std::future::Future;
use std::sync::Arc;

/// Shared handle to a middleware, as stored in route metadata.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// The Middleware trait
///
/// A middleware can inspect/modify the request before it reaches the handler, and
/// inspect/modify the response after the handler returns. Returning without calling
/// `next.run` short-circuits the chain.
///
/// # Example
/// ```
/// use kindling::middleware::Middleware;
/// use kindling::async_trait;
/// use axum::{extract::Request, middleware::Next, response::Response};
///
/// struct Tagging;
///
/// #[async_trait]
/// impl Middleware for Tagging {
///     async fn handle(&self, request: Request, next: Next) -> Response {
///         let mut response = next.run(request).await;
///         response.headers_mut().insert("x-tag", "kindling".parse().unwrap());
///         response
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    async fn handle(&self, request: Request, next: Next) -> Response {
        (**self).handle(request, next).await
    }
}

/// Adapter turning an async closure into a [`Middleware`].
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, request: Request, next: Next) -> Response {
        (self.f)(request, next).await
    }
}

/// Wrap an async closure as a shared middleware.
pub fn middleware_fn<F, Fut>(f: F) -> SharedMiddleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnMiddleware { f })
}

/// Layer `middlewares` around a method router, first element outermost.
pub(crate) fn apply<S>(router: MethodRouter<S>, middlewares: &[SharedMiddleware]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    middlewares.iter().rev().fold(router, |router, middleware| {
        let middleware = Arc::clone(middleware);
        router.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let middleware = Arc::clone(&middleware);
                async move { middleware.handle(request, next).await }
            },
        ))
    })
}
