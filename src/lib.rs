//! # Kindling
//!
//! Annotation-driven component discovery, dependency injection and route binding for axum.
//!
//! Application types tag themselves as controllers, services or repositories. At startup
//! Kindling resolves the configured packages on disk, scans their source files for
//! registered components, puts every component into the DI container and mounts each
//! controller's routes on an axum router.
//!
//! ## Features
//!
//! - **Component Scanning**: source files are matched against a static module catalog
//! - **Dependency Injection**: `Arc<T>` fields are resolved from the container
//! - **Controller-based Routing**: `:param` style paths, per-route middleware
//! - **Socket Events**: `#[on_connect]`, `#[on_disconnect]` and `#[channel]` handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kindling::prelude::*;
//! use kindling::ModuleCatalog;
//!
//! #[service]
//! pub struct GreetingService;
//!
//! impl GreetingService {
//!     pub fn greet(&self, name: &str) -> String {
//!         format!("hello {name}")
//!     }
//! }
//!
//! #[controller("/hello")]
//! pub struct HelloController {
//!     greetings: Arc<GreetingService>,
//! }
//!
//! #[routes]
//! impl HelloController {
//!     #[get("/:name")]
//!     async fn hello(&self, #[param] name: String) -> String {
//!         self.greetings.greet(&name)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = ModuleCatalog::new().module(file!(), |exports| {
//!         exports.class::<GreetingService>("GreetingService");
//!         exports.class::<HelloController>("HelloController");
//!         Ok(())
//!     });
//!
//!     let mut app = Application::builder().catalog(catalog).build()?;
//!     app.start()?;
//!     app.serve().await?;
//!     Ok(())
//! }
//! ```

extern crate self as kindling;

pub mod binder;
pub mod component;
pub mod config;
pub mod di;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod metadata;
pub mod middleware;
pub mod resolver;
pub mod routing;
pub mod scanner;

// Re-export core types
pub use binder::{AxumRouteSink, Binder, BindReport, Installation, RouteSink};
pub use component::{ComponentDescriptor, ComponentKind, ComponentRef, Instance};
pub use config::{AppConfig, ConfigService};
pub use di::{Container, ContainerBuilder, Injectable};
pub use error::{KindlingError, Result};
pub use events::{EventHub, SocketContext};
pub use lifecycle::{Application, ApplicationBuilder, BootReport, BootState};
pub use metadata::MetadataStore;
pub use resolver::PathResolver;
pub use routing::{Annotated, Annotator, HttpVerb, MethodAnnotator, RouteSet};
pub use scanner::{ComponentScanner, ModuleCatalog, ScanReport};

// Re-export macros
pub use kindling_macro::{
    Injectable as DeriveInjectable, channel, controller, delete, get, head, middleware,
    on_connect, on_disconnect, options, patch, post, put, repository, routes, service,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;
pub use serde_json;

/// Prelude module for convenient imports
///
/// ```
/// use kindling::prelude::*;
/// ```
pub mod prelude {
    pub use crate::component::{ComponentKind, ComponentRef};
    pub use crate::config::{AppConfig, ConfigService};
    pub use crate::di::{Container, ContainerBuilder, Injectable};
    pub use crate::error::{KindlingError, Result};
    pub use crate::events::{EventHub, SocketContext};
    pub use crate::lifecycle::{Application, ApplicationBuilder, shutdown_signal};
    pub use crate::middleware::{Middleware, RequestLogging, middleware_fn};
    pub use crate::routing::{Annotated, Annotator, HttpVerb, RouteSet};
    pub use crate::{
        DeriveInjectable as Injectable, channel, controller, delete, get, head, middleware,
        on_connect, on_disconnect, options, patch, post, put, repository, routes, service,
    };
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, Request},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
