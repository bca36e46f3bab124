//! Registers scanned components with the container and mounts controller routes.

mod sink;

pub use sink::{AxumRouteSink, Installation, RouteSink, to_axum_path};

use crate::component::ComponentDescriptor;
use crate::di::Container;
use crate::error::{KindlingError, Result};
use crate::events::EventHub;
use crate::metadata::{MetadataStore, MetadataTarget, keys};
use crate::routing::HttpVerb;
use std::sync::Arc;

/// A route that made it onto the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRoute {
    pub verb: HttpVerb,
    pub path: String,
    pub controller: String,
    pub handler: String,
}

#[derive(Debug, Default)]
pub struct BindReport {
    /// Components newly bound in the container.
    pub bound: usize,
    pub routes: Vec<InstalledRoute>,
    /// Socket event handlers registered on the hub.
    pub events: usize,
    pub warnings: Vec<String>,
}

pub struct Binder<'a> {
    store: &'a MetadataStore,
    events: Option<Arc<EventHub>>,
}

impl<'a> Binder<'a> {
    pub fn new(store: &'a MetadataStore) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Also bind controller socket handlers onto `hub`.
    pub fn with_events(mut self, hub: Arc<EventHub>) -> Self {
        self.events = Some(hub);
        self
    }

    /// Bind every descriptor in the container, then install controller routes in order.
    ///
    /// A controller without routes is skipped with a warning, as is a route the sink refuses
    /// or already serves. A route whose verb the sink cannot serve aborts binding with
    /// [`KindlingError::UnsupportedVerb`].
    pub fn bind<S: RouteSink>(
        &self,
        sink: &mut S,
        container: &Container,
        descriptors: &[ComponentDescriptor],
    ) -> Result<BindReport> {
        let mut report = BindReport::default();

        for descriptor in descriptors {
            if container.bind(&descriptor.reference) {
                tracing::debug!("Bound {} '{}'", descriptor.kind, descriptor.name);
                report.bound += 1;
            }
        }

        for descriptor in descriptors.iter().filter(|d| d.is_controller()) {
            self.bind_controller(sink, container, descriptor, &mut report)?;
        }

        tracing::info!(
            "Mapped {} routes from {} components",
            report.routes.len(),
            descriptors.len()
        );
        Ok(report)
    }

    fn bind_controller<S: RouteSink>(
        &self,
        sink: &mut S,
        container: &Container,
        descriptor: &ComponentDescriptor,
        report: &mut BindReport,
    ) -> Result<()> {
        let target = MetadataTarget::Class(descriptor.reference.type_id());
        let routes = self.store.routes(&target);
        let events = match &self.events {
            Some(_) => self.store.events(&target),
            None => Vec::new(),
        };

        if routes.is_empty() {
            let warning = format!("No routes found for controller {}", descriptor.name);
            tracing::warn!("{}", warning);
            report.warnings.push(warning);
            if events.is_empty() {
                return Ok(());
            }
        }

        let instance = container.get(&descriptor.reference)?;
        let base_path = self
            .store
            .text(&target, keys::BASE_PATH)
            .unwrap_or_default();

        for route in &routes {
            let full_path = compose_path(&base_path, &route.path);
            if !sink.supports(route.verb) {
                return Err(KindlingError::UnsupportedVerb {
                    verb: route.verb.to_string(),
                    path: full_path,
                });
            }

            let installation = sink.install(
                route.verb,
                &full_path,
                &route.middlewares,
                route.bind(instance.clone()),
            )?;
            let verb = route.verb.as_ref().to_uppercase();
            let skipped = match &installation {
                Installation::Mounted => None,
                Installation::Renamed(served) => {
                    let warning = format!(
                        "Route {} {} from {}::{} served as {}",
                        verb, full_path, descriptor.name, route.handler_name, served
                    );
                    tracing::warn!("{}", warning);
                    report.warnings.push(warning);
                    None
                }
                Installation::Taken => Some(format!(
                    "Duplicate route {} {} from {}::{} ignored",
                    verb, full_path, descriptor.name, route.handler_name
                )),
                Installation::Rejected(reason) => Some(format!(
                    "Route {} {} from {}::{} rejected: {}",
                    verb, full_path, descriptor.name, route.handler_name, reason
                )),
            };
            if let Some(warning) = skipped {
                tracing::warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }

            tracing::info!(
                "Mapped {} {} -> {}::{}",
                verb,
                full_path,
                descriptor.name,
                route.handler_name
            );
            report.routes.push(InstalledRoute {
                verb: route.verb,
                path: full_path,
                controller: descriptor.name.clone(),
                handler: route.handler_name.clone(),
            });
        }

        if let Some(hub) = &self.events {
            for event in &events {
                hub.install(event, instance.clone());
                tracing::debug!(
                    "Bound event '{}' -> {}::{}",
                    event.event,
                    descriptor.name,
                    event.handler_name
                );
                report.events += 1;
            }
        }
        Ok(())
    }
}

fn with_leading_slash(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Join a controller base path and a method path into the path a route is served at.
///
/// ```
/// use kindling::binder::compose_path;
///
/// assert_eq!(compose_path("/user", "/ok"), "/user/ok");
/// assert_eq!(compose_path("user", "ok"), "/user/ok");
/// assert_eq!(compose_path("", "/"), "/");
/// assert_eq!(compose_path("/user", "/"), "/user");
/// ```
pub fn compose_path(base: &str, route: &str) -> String {
    let base = with_leading_slash(base.trim_end_matches('/'));
    let route = with_leading_slash(route);

    if !base.is_empty() && route == "/" {
        return base;
    }
    let full = format!("{}{}", base, route);
    if full.is_empty() { "/".to_string() } else { full }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentRef};
    use crate::di::Injectable;
    use crate::events::SocketContext;
    use crate::middleware::{SharedMiddleware, middleware_fn};
    use crate::routing::{Annotated, Annotator, BoundHandler};
    use axum::body::{Body, to_bytes};
    use axum::extract::{FromRequestParts, Path, Request};
    use axum::http::StatusCode;
    use axum::middleware::Next;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingSink {
        installs: Vec<(HttpVerb, String, usize)>,
    }

    impl RouteSink for RecordingSink {
        fn supports(&self, verb: HttpVerb) -> bool {
            verb.method().is_some()
        }

        fn install(
            &mut self,
            verb: HttpVerb,
            path: &str,
            middlewares: &[SharedMiddleware],
            _handler: BoundHandler,
        ) -> Result<Installation> {
            self.installs
                .push((verb, path.to_string(), middlewares.len()));
            Ok(Installation::Mounted)
        }
    }

    #[derive(Default)]
    struct UserController {
        hits: AtomicUsize,
    }

    impl Injectable for UserController {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(UserController::default())
        }
    }

    impl Annotated for UserController {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("/user");
            a.method("ok").get("/ok", |this: Arc<Self>, _req| async move {
                this.hits.fetch_add(1, Ordering::SeqCst);
                "<div>USER</div>"
            });
            a.method("show").get("/:id", |_this, req: Request| async move {
                req.uri().path().to_string()
            });
        }
    }

    struct SilentController;

    impl Injectable for SilentController {
        fn inject(_container: &Container) -> Result<Self> {
            panic!("a controller without routes must not be instantiated");
        }
    }

    impl Annotated for SilentController {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("/silent");
        }
    }

    struct DavController;

    impl Injectable for DavController {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(DavController)
        }
    }

    impl Annotated for DavController {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("/dav");
            a.method("find")
                .route(HttpVerb::Propfind, "/", |_this, _req| async { "props" });
        }
    }

    struct HelperService;

    impl Injectable for HelperService {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(HelperService)
        }
    }

    impl Annotated for HelperService {
        fn annotate(a: &Annotator<'_, Self>) {
            a.service();
        }
    }

    fn annotated<T: Annotated>(store: &MetadataStore, kind: ComponentKind) -> ComponentDescriptor {
        T::annotate(&Annotator::new(store));
        let reference = ComponentRef::of::<T>();
        ComponentDescriptor::new(reference.short_name(), reference, kind)
    }

    async fn get(router: &axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_compose_path() {
        assert_eq!(compose_path("/user", "/ok"), "/user/ok");
        assert_eq!(compose_path("", "/"), "/");
        assert_eq!(compose_path("", ""), "/");
        assert_eq!(compose_path("/user", ""), "/user");
        assert_eq!(compose_path("/user/", "/ok"), "/user/ok");
        assert_eq!(compose_path("/", "/ok"), "/ok");
        assert_eq!(compose_path("", "list"), "/list");
    }

    #[test]
    fn test_every_descriptor_is_bound_once() {
        let store = MetadataStore::new();
        let descriptors = vec![
            annotated::<UserController>(&store, ComponentKind::Controller),
            annotated::<HelperService>(&store, ComponentKind::Service),
        ];
        let container = Container::new();
        let mut sink = RecordingSink::default();
        let binder = Binder::new(&store);

        let report = binder.bind(&mut sink, &container, &descriptors).unwrap();
        assert_eq!(report.bound, 2);
        assert!(container.is_bound(&ComponentRef::of::<HelperService>()));

        let again = binder.bind(&mut sink, &container, &descriptors).unwrap();
        assert_eq!(again.bound, 0);
    }

    #[test]
    fn test_routes_installed_in_declaration_order() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<UserController>(&store, ComponentKind::Controller)];
        let mut sink = RecordingSink::default();

        Binder::new(&store)
            .bind(&mut sink, &Container::new(), &descriptors)
            .unwrap();
        assert_eq!(
            sink.installs,
            vec![
                (HttpVerb::Get, "/user/ok".to_string(), 0),
                (HttpVerb::Get, "/user/:id".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_controller_without_routes_is_skipped_with_one_warning() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<SilentController>(&store, ComponentKind::Controller)];
        let mut sink = RecordingSink::default();

        let report = Binder::new(&store)
            .bind(&mut sink, &Container::new(), &descriptors)
            .unwrap();
        assert!(sink.installs.is_empty());
        assert!(report.routes.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("SilentController"));
    }

    #[test]
    fn test_unsupported_verb_is_fatal() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<DavController>(&store, ComponentKind::Controller)];

        let err = Binder::new(&store)
            .bind(&mut AxumRouteSink::new(), &Container::new(), &descriptors)
            .unwrap_err();
        match err {
            KindlingError::UnsupportedVerb { verb, path } => {
                assert_eq!(verb, "propfind");
                assert_eq!(path, "/dav");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_request_reaches_container_instance() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<UserController>(&store, ComponentKind::Controller)];
        let container = Container::new();
        let mut sink = AxumRouteSink::new();

        let report = Binder::new(&store)
            .bind(&mut sink, &container, &descriptors)
            .unwrap();
        assert_eq!(report.routes[0].path, "/user/ok");
        let router = sink.into_router();

        assert_eq!(
            get(&router, "GET", "/user/ok").await,
            (StatusCode::OK, "<div>USER</div>".to_string())
        );
        assert_eq!(
            get(&router, "GET", "/user/42").await,
            (StatusCode::OK, "/user/42".to_string())
        );

        let reference = ComponentRef::of::<UserController>();
        let first = container.get(&reference).unwrap();
        let second = container.get(&reference).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let controller = container.resolve::<UserController>().unwrap();
        assert_eq!(controller.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmatched_request_is_empty_404() {
        let router = AxumRouteSink::new().into_router();
        assert_eq!(
            get(&router, "GET", "/missing").await,
            (StatusCode::NOT_FOUND, String::new())
        );
    }

    struct Layered;

    impl Injectable for Layered {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(Layered)
        }
    }

    static TRACE: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn tracing_middleware(tag: &'static str) -> SharedMiddleware {
        middleware_fn(move |req: Request, next: Next| async move {
            TRACE.lock().unwrap().push(tag);
            next.run(req).await
        })
    }

    impl Annotated for Layered {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("");
            a.method("index")
                .middleware(tracing_middleware("outer"))
                .middleware(tracing_middleware("inner"))
                .get("/", |_this, _req| async {
                    TRACE.lock().unwrap().push("handler");
                    "index"
                });
            a.method("first").get("/dup", |_this, _req| async { "first" });
            a.method("second").get("/dup", |_this, _req| async { "second" });
            a.method("any").route(HttpVerb::All, "/dup", |_this, _req| async { "any" });
        }
    }

    #[tokio::test]
    async fn test_middleware_order_and_duplicate_routes() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<Layered>(&store, ComponentKind::Controller)];
        let mut sink = AxumRouteSink::new();

        let report = Binder::new(&store)
            .bind(&mut sink, &Container::new(), &descriptors)
            .unwrap();
        let router = sink.into_router();

        assert_eq!(get(&router, "GET", "/").await.1, "index");
        assert_eq!(*TRACE.lock().unwrap(), vec!["outer", "inner", "handler"]);

        assert_eq!(get(&router, "GET", "/dup").await.1, "first");
        assert_eq!(get(&router, "POST", "/dup").await.1, "any");
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("GET /dup"));
        assert_eq!(report.routes.len(), 3);
    }

    #[derive(Default)]
    struct ChatController {
        joined: Mutex<Vec<String>>,
    }

    impl Injectable for ChatController {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(ChatController::default())
        }
    }

    impl Annotated for ChatController {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("/chat");
            a.method("joined")
                .on_connect(|this: Arc<Self>, socket, _payload| async move {
                    this.joined.lock().unwrap().push(socket.id);
                });
        }
    }

    #[tokio::test]
    async fn test_socket_handlers_bind_to_hub() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<ChatController>(&store, ComponentKind::Controller)];
        let container = Container::new();
        let hub = Arc::new(EventHub::new());

        let report = Binder::new(&store)
            .with_events(hub.clone())
            .bind(&mut RecordingSink::default(), &container, &descriptors)
            .unwrap();
        assert_eq!(report.events, 1);
        assert_eq!(report.warnings.len(), 1);

        hub.connect(&SocketContext::new("s1")).await;
        let chat = container.resolve::<ChatController>().unwrap();
        assert_eq!(*chat.joined.lock().unwrap(), vec!["s1".to_string()]);
    }

    struct AccountController;

    impl Injectable for AccountController {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(AccountController)
        }
    }

    async fn captured(request: Request) -> String {
        let (mut parts, _) = request.into_parts();
        match Path::<String>::from_request_parts(&mut parts, &()).await {
            Ok(Path(value)) => value,
            Err(rejection) => rejection.body_text(),
        }
    }

    impl Annotated for AccountController {
        fn annotate(a: &Annotator<'_, Self>) {
            a.controller("/account");
            a.method("show").get("/:id", |_this, req| async move {
                format!("show {}", captured(req).await)
            });
            a.method("remove").delete("/:accountId", |_this, req| async move {
                format!("remove {}", captured(req).await)
            });
            a.method("history")
                .get("/:accountId/history", |_this, req: Request| async move {
                    req.uri().path().to_string()
                });
        }
    }

    #[tokio::test]
    async fn test_sibling_captures_with_different_names_both_serve() {
        let store = MetadataStore::new();
        let descriptors = vec![annotated::<AccountController>(&store, ComponentKind::Controller)];
        let mut sink = AxumRouteSink::new();

        let report = Binder::new(&store)
            .bind(&mut sink, &Container::new(), &descriptors)
            .unwrap();
        let router = sink.into_router();

        let paths: Vec<&str> = report.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/account/:id", "/account/:accountId", "/account/:accountId/history"]
        );
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("DELETE /account/:accountId"));
        assert!(report.warnings[0].contains("/account/{id}"));

        assert_eq!(get(&router, "GET", "/account/7").await.1, "show 7");
        assert_eq!(get(&router, "DELETE", "/account/7").await.1, "remove 7");
        assert_eq!(
            get(&router, "GET", "/account/7/history").await.1,
            "/account/7/history"
        );
    }

    #[test]
    fn test_route_rejected_by_sink_is_a_warning() {
        struct Refusing;

        impl RouteSink for Refusing {
            fn supports(&self, _verb: HttpVerb) -> bool {
                true
            }

            fn install(
                &mut self,
                _verb: HttpVerb,
                _path: &str,
                _middlewares: &[SharedMiddleware],
                _handler: BoundHandler,
            ) -> Result<Installation> {
                Ok(Installation::Rejected("conflict".to_string()))
            }
        }

        let store = MetadataStore::new();
        let descriptors = vec![annotated::<UserController>(&store, ComponentKind::Controller)];
        let report = Binder::new(&store)
            .bind(&mut Refusing, &Container::new(), &descriptors)
            .unwrap();
        assert!(report.routes.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("GET /user/ok"));
        assert!(report.warnings[0].contains("conflict"));
    }
}
