use crate::component::Instance;
use crate::error::KindlingError;
use crate::middleware::SharedMiddleware;
use crate::routing::HttpVerb;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A controller method with its receiver erased. Called with the controller instance.
pub type RouteHandler = Arc<dyn Fn(Instance, Request) -> BoxResponseFuture + Send + Sync>;

/// A route declared on a controller method.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub verb: HttpVerb,
    /// Method-level path, before composition with the controller base path.
    pub path: String,
    /// Name of the declaring method.
    pub handler_name: String,
    pub handler: RouteHandler,
    /// Middlewares attached to the method when the route was declared, in order.
    pub middlewares: Vec<SharedMiddleware>,
}

impl RouteDescriptor {
    /// Bind the handler to a live controller instance.
    pub fn bind(&self, instance: Instance) -> BoundHandler {
        BoundHandler {
            handler: Arc::clone(&self.handler),
            instance,
        }
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("handler_name", &self.handler_name)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// A route handler paired with the instance it runs against.
#[derive(Clone)]
pub struct BoundHandler {
    handler: RouteHandler,
    instance: Instance,
}

impl BoundHandler {
    pub fn call(&self, request: Request) -> BoxResponseFuture {
        (self.handler)(Arc::clone(&self.instance), request)
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

/// Erase a typed controller method into a [`RouteHandler`].
pub(crate) fn erase_handler<T, F, Fut, R>(f: F) -> RouteHandler
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    Arc::new(move |instance: Instance, request: Request| -> BoxResponseFuture {
        match instance.downcast::<T>() {
            Ok(this) => {
                let fut = f(this, request);
                Box::pin(async move { fut.await.into_response() })
            }
            Err(_) => {
                let error = KindlingError::DowncastFailed {
                    type_name: std::any::type_name::<T>().to_string(),
                };
                Box::pin(async move { error.into_response() })
            }
        }
    })
}
