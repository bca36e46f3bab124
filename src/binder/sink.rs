use crate::error::{KindlingError, Result};
use crate::middleware::{self, SharedMiddleware};
use crate::routing::{BoundHandler, HttpVerb};
use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::routing::{MethodFilter, on};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

/// What happened to a route handed to [`RouteSink::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installation {
    /// Served at the requested path.
    Mounted,
    /// Served at the given path, whose captures were renamed to match a route installed
    /// earlier at the same position.
    Renamed(String),
    /// Every method the route names is already taken on its path.
    Taken,
    /// The router refused the path, for the given reason.
    Rejected(String),
}

/// Destination for bound routes.
pub trait RouteSink {
    /// Whether routes declared with `verb` can be installed.
    fn supports(&self, verb: HttpVerb) -> bool;

    /// Install one route. Only an unsupported verb is an error.
    fn install(
        &mut self,
        verb: HttpVerb,
        path: &str,
        middlewares: &[SharedMiddleware],
        handler: BoundHandler,
    ) -> Result<Installation>;
}

/// Installs routes onto an [`axum::Router`].
///
/// The first route installed for a method and path keeps it. `HttpVerb::All` claims every
/// standard method still free on its path.
///
/// axum needs captures at the same position to share a name, so `/user/:userId` installed
/// after `/user/:id` is served as `/user/{id}`. Positional extraction is unaffected;
/// extraction into a struct sees the first route's names.
pub struct AxumRouteSink {
    router: Router,
    taken: HashMap<String, HashSet<HttpVerb>>,
    /// Capture segment chosen for each path prefix, e.g. `"/user/"` -> `"{id}"`.
    captures: HashMap<String, String>,
}

impl AxumRouteSink {
    pub fn new() -> Self {
        Self::with_router(Router::new())
    }

    /// Install into an existing router.
    pub fn with_router(router: Router) -> Self {
        Self {
            router,
            taken: HashMap::new(),
            captures: HashMap::new(),
        }
    }

    /// Finish the router, answering unmatched requests with an empty 404.
    pub fn into_router(self) -> Router {
        self.router.fallback(not_found)
    }
}

impl Default for AxumRouteSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteSink for AxumRouteSink {
    fn supports(&self, verb: HttpVerb) -> bool {
        verb == HttpVerb::All || verb.method().is_some()
    }

    fn install(
        &mut self,
        verb: HttpVerb,
        path: &str,
        middlewares: &[SharedMiddleware],
        handler: BoundHandler,
    ) -> Result<Installation> {
        if !self.supports(verb) {
            return Err(KindlingError::UnsupportedVerb {
                verb: verb.to_string(),
                path: path.to_string(),
            });
        }

        let requested = to_axum_path(path);
        let (axum_path, new_captures) = align_captures(&self.captures, &requested);
        let taken = self.taken.entry(axum_path.clone()).or_default();
        let claimed: Vec<HttpVerb> = match verb {
            HttpVerb::All => HttpVerb::STANDARD
                .into_iter()
                .filter(|v| !taken.contains(v))
                .collect(),
            single if taken.contains(&single) => Vec::new(),
            single => vec![single],
        };
        let Some(filter) = claimed
            .iter()
            .filter_map(|v| method_filter(*v))
            .reduce(MethodFilter::or)
        else {
            return Ok(Installation::Taken);
        };

        let endpoint = on(filter, move |request: Request| {
            let handler = handler.clone();
            async move { handler.call(request).await }
        });
        let endpoint = middleware::apply(endpoint, middlewares);

        // axum rejects malformed or conflicting patterns by panicking.
        let attempt = self.router.clone();
        let route_path = axum_path.clone();
        let router = match panic::catch_unwind(AssertUnwindSafe(move || {
            attempt.route(&route_path, endpoint)
        })) {
            Ok(router) => router,
            Err(payload) => return Ok(Installation::Rejected(panic_message(payload.as_ref()))),
        };

        taken.extend(claimed);
        self.captures.extend(new_captures);
        self.router = router;
        if axum_path == requested {
            Ok(Installation::Mounted)
        } else {
            Ok(Installation::Renamed(axum_path))
        }
    }
}

/// Rename the captures of `path` to the ones already installed at the same prefix.
///
/// Returns the aligned path and the prefix entries it introduces.
fn align_captures(
    captures: &HashMap<String, String>,
    path: &str,
) -> (String, Vec<(String, String)>) {
    let mut prefix = String::new();
    let mut segments = Vec::new();
    let mut introduced = Vec::new();

    for segment in path.split('/') {
        let segment = if is_capture(segment) {
            match captures.get(&prefix) {
                Some(existing) if is_wildcard(existing) == is_wildcard(segment) => {
                    existing.clone()
                }
                Some(_) => segment.to_string(),
                None => {
                    introduced.push((prefix.clone(), segment.to_string()));
                    segment.to_string()
                }
            }
        } else {
            segment.to_string()
        };
        prefix.push_str(&segment);
        prefix.push('/');
        segments.push(segment);
    }
    (segments.join("/"), introduced)
}

fn is_capture(segment: &str) -> bool {
    segment.len() > 2
        && segment.starts_with('{')
        && segment.ends_with('}')
        && !segment.starts_with("{{")
}

fn is_wildcard(segment: &str) -> bool {
    segment.starts_with("{*")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "invalid route".to_string())
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn method_filter(verb: HttpVerb) -> Option<MethodFilter> {
    match verb {
        HttpVerb::Get => Some(MethodFilter::GET),
        HttpVerb::Post => Some(MethodFilter::POST),
        HttpVerb::Put => Some(MethodFilter::PUT),
        HttpVerb::Delete => Some(MethodFilter::DELETE),
        HttpVerb::Patch => Some(MethodFilter::PATCH),
        HttpVerb::Head => Some(MethodFilter::HEAD),
        HttpVerb::Options => Some(MethodFilter::OPTIONS),
        _ => None,
    }
}

/// Translate `:name` and `*name` segments into axum's `{name}` and `{*name}` captures.
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{}}}", name)
            } else if let Some(name) = segment.strip_prefix('*').filter(|n| !n.is_empty()) {
                format!("{{*{}}}", name)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
