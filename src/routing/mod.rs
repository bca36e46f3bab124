//! Route metadata: verbs, descriptors and the annotation layer that accumulates them.

pub mod annotate;
mod descriptor;
mod verb;

pub use annotate::{Annotated, Annotator, MethodAnnotator, RouteSet};
pub use descriptor::{BoundHandler, BoxResponseFuture, RouteDescriptor, RouteHandler};
pub use verb::HttpVerb;
