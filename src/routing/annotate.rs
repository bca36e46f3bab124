//! Declarative registration of component tags and controller routes.
//!
//! This is the explicit counterpart of class and method decorators: a type describes
//! itself by calling an [`Annotator`] from its [`Annotated`] implementation, which is what
//! the `#[controller]`, `#[service]`, `#[repository]` and `#[routes]` macros generate.
//!
//! ```
//! use kindling::{Annotated, Annotator, Container, Injectable, Result};
//! use kindling::metadata::{keys, MetadataStore, MetadataTarget};
//! use axum::extract::Request;
//! use std::sync::Arc;
//!
//! struct UserController;
//!
//! impl Injectable for UserController {
//!     fn inject(_container: &Container) -> Result<Self> {
//!         Ok(UserController)
//!     }
//! }
//!
//! impl UserController {
//!     async fn ok(&self) -> &'static str {
//!         "<div>USER</div>"
//!     }
//! }
//!
//! impl Annotated for UserController {
//!     fn annotate(a: &Annotator<'_, Self>) {
//!         a.controller("/user");
//!         a.method("ok")
//!             .get("/ok", |this: Arc<Self>, _req: Request| async move { this.ok().await });
//!     }
//! }
//!
//! let store = MetadataStore::new();
//! UserController::annotate(&Annotator::new(&store));
//! let target = MetadataTarget::class::<UserController>();
//! assert!(store.has_attribute(&target, keys::CONTROLLER));
//! assert_eq!(store.routes(&target).len(), 1);
//! ```

use crate::di::Injectable;
use crate::events::{self, EventDescriptor, SocketContext};
use crate::metadata::{MetadataStore, MetadataTarget, MetadataValue, keys};
use crate::middleware::SharedMiddleware;
use crate::routing::descriptor::erase_handler;
use crate::routing::{HttpVerb, RouteDescriptor};
use axum::extract::Request;
use axum::response::IntoResponse;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type that declares its own component metadata.
pub trait Annotated: Injectable {
    fn annotate(annotator: &Annotator<'_, Self>);
}

/// Method-level route declarations of a controller. Generated by `#[routes]`.
pub trait RouteSet: Sized + Send + Sync + 'static {
    fn declare_routes(_annotator: &Annotator<'_, Self>) {}
}

/// Writes class-level metadata for `T`.
pub struct Annotator<'a, T> {
    store: &'a MetadataStore,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> Annotator<'a, T> {
    pub fn new(store: &'a MetadataStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &'a MetadataStore {
        self.store
    }

    /// Tag `T` as a controller whose routes are mounted under `base_path`.
    pub fn controller(&self, base_path: &str) -> &Self {
        let target = MetadataTarget::class::<T>();
        self.store
            .set_attribute(target.clone(), keys::CONTROLLER, MetadataValue::Flag);
        self.store.set_attribute(
            target,
            keys::BASE_PATH,
            MetadataValue::Text(base_path.to_string()),
        );
        self
    }

    pub fn service(&self) -> &Self {
        self.store.set_attribute(
            MetadataTarget::class::<T>(),
            keys::SERVICE,
            MetadataValue::Flag,
        );
        self
    }

    pub fn repository(&self) -> &Self {
        self.store.set_attribute(
            MetadataTarget::class::<T>(),
            keys::REPOSITORY,
            MetadataValue::Flag,
        );
        self
    }

    /// Start declaring metadata for one method of `T`.
    pub fn method(&self, name: &str) -> MethodAnnotator<'a, T> {
        MethodAnnotator {
            store: self.store,
            name: name.to_string(),
            _marker: PhantomData,
        }
    }
}

/// Writes metadata for a single method of `T`.
pub struct MethodAnnotator<'a, T> {
    store: &'a MetadataStore,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> MethodAnnotator<'_, T> {
    /// Attach a middleware to this method. Routes declared afterwards pick it up.
    pub fn middleware(self, middleware: SharedMiddleware) -> Self {
        self.store
            .append_middleware(MetadataTarget::method::<T>(&self.name), middleware);
        self
    }

    /// Append a route to the class route list. An empty `path` is served as `/`.
    pub fn route<F, Fut, R>(self, verb: HttpVerb, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        let middlewares = self
            .store
            .middlewares(&MetadataTarget::method::<T>(&self.name));
        let route = RouteDescriptor {
            verb,
            path: path.to_string(),
            handler_name: self.name.clone(),
            handler: erase_handler::<T, _, _, _>(handler),
            middlewares,
        };
        self.store.append_route(MetadataTarget::class::<T>(), route);
        self
    }

    pub fn get<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Get, path, handler)
    }

    pub fn post<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Post, path, handler)
    }

    pub fn put<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Put, path, handler)
    }

    pub fn delete<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Delete, path, handler)
    }

    pub fn patch<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Patch, path, handler)
    }

    pub fn head<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Head, path, handler)
    }

    pub fn options<F, Fut, R>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(HttpVerb::Options, path, handler)
    }

    /// Handle new socket connections.
    pub fn on_connect<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<T>, SocketContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.event(events::CONNECTION, handler)
    }

    pub fn on_disconnect<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<T>, SocketContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.event(events::DISCONNECT, handler)
    }

    /// Handle messages sent on a named channel.
    pub fn channel<F, Fut>(self, event: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, SocketContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.event(event, handler)
    }

    fn event<F, Fut>(self, event: &str, handler: F) -> Self
    where
        F: Fn(Arc<T>, SocketContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let descriptor = EventDescriptor {
            event: event.to_string(),
            handler_name: self.name.clone(),
            handler: events::erase_event_handler::<T, _, _>(handler),
        };
        self.store
            .append_event(MetadataTarget::class::<T>(), descriptor);
        self
    }
}
