//! Process-wide attribute store written by annotations and read by the scanner and binder.
//!
//! Attributes are keyed by a [`MetadataTarget`] (a type, or a method of a type) and an exact
//! key string from [`keys`].

use crate::events::EventDescriptor;
use crate::middleware::SharedMiddleware;
use crate::routing::RouteDescriptor;
use dashmap::{DashMap, DashSet};
use std::any::TypeId;
use std::fmt;

/// Exact attribute keys understood by the scanner and binder.
pub mod keys {
    pub const CONTROLLER: &str = "an_ctrl";
    pub const SERVICE: &str = "an_svc";
    pub const REPOSITORY: &str = "an_repo";
    pub const BASE_PATH: &str = "base_path";
    pub const ROUTES: &str = "routes";
    pub const MIDDLEWARES: &str = "middlewares";
    pub const EVENTS: &str = "ws_events";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataTarget {
    Class(TypeId),
    Method(TypeId, String),
}

impl MetadataTarget {
    pub fn class<T: 'static>() -> Self {
        MetadataTarget::Class(TypeId::of::<T>())
    }

    pub fn method<T: 'static>(name: impl Into<String>) -> Self {
        MetadataTarget::Method(TypeId::of::<T>(), name.into())
    }
}

#[derive(Clone)]
pub enum MetadataValue {
    Flag,
    Text(String),
    Routes(Vec<RouteDescriptor>),
    Middlewares(Vec<SharedMiddleware>),
    Events(Vec<EventDescriptor>),
}

impl fmt::Debug for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Flag => f.write_str("Flag"),
            MetadataValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            MetadataValue::Routes(routes) => f.debug_tuple("Routes").field(routes).finish(),
            MetadataValue::Middlewares(list) => {
                write!(f, "Middlewares({})", list.len())
            }
            MetadataValue::Events(events) => f.debug_tuple("Events").field(events).finish(),
        }
    }
}

#[derive(Default)]
pub struct MetadataStore {
    entries: DashMap<(MetadataTarget, String), MetadataValue>,
    annotated: DashSet<TypeId>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&self, target: MetadataTarget, key: &str, value: MetadataValue) {
        self.entries.insert((target, key.to_string()), value);
    }

    pub fn get_attribute(&self, target: &MetadataTarget, key: &str) -> Option<MetadataValue> {
        self.entries
            .get(&(target.clone(), key.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn has_attribute(&self, target: &MetadataTarget, key: &str) -> bool {
        self.entries.contains_key(&(target.clone(), key.to_string()))
    }

    /// Text value of an attribute; `None` when absent or not text.
    pub fn text(&self, target: &MetadataTarget, key: &str) -> Option<String> {
        match self.get_attribute(target, key)? {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Accumulated routes of a class, in declaration order.
    pub fn routes(&self, target: &MetadataTarget) -> Vec<RouteDescriptor> {
        match self.get_attribute(target, keys::ROUTES) {
            Some(MetadataValue::Routes(routes)) => routes,
            _ => Vec::new(),
        }
    }

    pub fn middlewares(&self, target: &MetadataTarget) -> Vec<SharedMiddleware> {
        match self.get_attribute(target, keys::MIDDLEWARES) {
            Some(MetadataValue::Middlewares(list)) => list,
            _ => Vec::new(),
        }
    }

    pub fn events(&self, target: &MetadataTarget) -> Vec<EventDescriptor> {
        match self.get_attribute(target, keys::EVENTS) {
            Some(MetadataValue::Events(events)) => events,
            _ => Vec::new(),
        }
    }

    pub fn append_route(&self, target: MetadataTarget, route: RouteDescriptor) {
        let mut entry = self
            .entries
            .entry((target, keys::ROUTES.to_string()))
            .or_insert_with(|| MetadataValue::Routes(Vec::new()));
        match &mut *entry {
            MetadataValue::Routes(routes) => routes.push(route),
            other => *other = MetadataValue::Routes(vec![route]),
        }
    }

    pub fn append_middleware(&self, target: MetadataTarget, middleware: SharedMiddleware) {
        let mut entry = self
            .entries
            .entry((target, keys::MIDDLEWARES.to_string()))
            .or_insert_with(|| MetadataValue::Middlewares(Vec::new()));
        match &mut *entry {
            MetadataValue::Middlewares(list) => list.push(middleware),
            other => *other = MetadataValue::Middlewares(vec![middleware]),
        }
    }

    pub fn append_event(&self, target: MetadataTarget, event: EventDescriptor) {
        let mut entry = self
            .entries
            .entry((target, keys::EVENTS.to_string()))
            .or_insert_with(|| MetadataValue::Events(Vec::new()));
        match &mut *entry {
            MetadataValue::Events(events) => events.push(event),
            other => *other = MetadataValue::Events(vec![event]),
        }
    }

    /// Record that a type's annotations ran. Returns `true` the first time only.
    pub fn mark_annotated(&self, type_id: TypeId) -> bool {
        self.annotated.insert(type_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
