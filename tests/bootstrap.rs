use axum::body::{Body, to_bytes};
use axum::http::Request as HttpRequest;
use kindling::prelude::*;
use kindling::{BootState, ModuleCatalog};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

#[service]
pub struct GreetingService;

impl GreetingService {
    fn greet(&self, name: &str) -> String {
        format!("hello {}", name)
    }
}

#[controller("/home")]
pub struct HomeController {
    greetings: Arc<GreetingService>,
}

#[routes]
impl HomeController {
    #[get("/:name")]
    async fn hello(&self, #[param] name: String) -> String {
        self.greetings.greet(&name)
    }
}

#[controller("/legacy")]
pub struct LegacyController;

#[routes]
impl LegacyController {
    #[get("/")]
    async fn index(&self) -> &'static str {
        "legacy"
    }
}

#[controller("/dav")]
pub struct DavController;

impl RouteSet for DavController {
    fn declare_routes(annotator: &Annotator<'_, Self>) {
        annotator
            .method("props")
            .route(HttpVerb::Propfind, "/", |_this, _req| async { "props" });
    }
}

const FILES: [&str; 6] = [
    "src/main.rs",
    "src/controllers/home.rs",
    "src/services/greeting.rs",
    "src/services/greeting.spec.rs",
    "src/services/legacy/legacy.rs",
    "src/jobs/broken.rs",
];

fn project() -> TempDir {
    let root = TempDir::new().unwrap();
    for file in FILES {
        let path = root.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    root
}

fn catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .module("src/controllers/home.rs", |exports| {
            exports.class::<HomeController>("HomeController");
            Ok(())
        })
        .module("src/services/greeting.rs", |exports| {
            exports.class::<GreetingService>("GreetingService");
            Ok(())
        })
        .module("src/services/greeting.spec.rs", |_| {
            anyhow::bail!("test-only module")
        })
        .module("src/services/legacy/legacy.rs", |exports| {
            exports.class::<LegacyController>("LegacyController");
            Ok(())
        })
        .module("src/jobs/broken.rs", |_| panic!("broken module"))
}

fn application(root: &Path, config: AppConfig, catalog: ModuleCatalog) -> Application {
    Application::builder()
        .project_root(root)
        .entry_file("src/main.rs")
        .config(config)
        .env(ConfigService::default())
        .catalog(catalog)
        .build()
        .unwrap()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_configured_packages_with_exclusions() {
    let root = project();
    let config = AppConfig::from_json(
        r#"{
            "scanBasePackages": ["controllers", "services"],
            "exclude": ["legacy"],
            "excludeName": [".spec.rs"]
        }"#,
    )
    .unwrap();
    let mut app = application(root.path(), config, catalog());

    let report = app.start().unwrap();
    assert_eq!(app.state(), BootState::Bound);
    assert_eq!(
        report.roots,
        vec![
            root.path().join("src/controllers"),
            root.path().join("src/services"),
        ]
    );
    assert!(report.scan.failures.is_empty());
    let names: Vec<&str> = report
        .scan
        .components
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["HomeController", "GreetingService"]);

    let router = app.router().unwrap().clone();
    assert_eq!(
        get(&router, "/home/bob").await,
        (StatusCode::OK, "hello bob".to_string())
    );
    assert_eq!(
        get(&router, "/legacy").await,
        (StatusCode::NOT_FOUND, String::new())
    );
}

#[tokio::test]
async fn test_entry_directory_scan_tolerates_failing_modules() {
    let root = project();
    let mut app = application(root.path(), AppConfig::default(), catalog());

    let report = app.start().unwrap();
    assert_eq!(report.roots, vec![root.path().join("src")]);

    let mut failed: Vec<String> = report
        .scan
        .failures
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["broken.rs", "greeting.spec.rs"]);
    assert!(report.scan.failures.iter().any(|f| f.message.contains("broken module")));

    let kinds: Vec<(String, ComponentKind)> = report
        .scan
        .components
        .iter()
        .map(|c| (c.name.clone(), c.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("HomeController".to_string(), ComponentKind::Controller),
            ("GreetingService".to_string(), ComponentKind::Service),
            ("LegacyController".to_string(), ComponentKind::Controller),
        ]
    );

    let router = app.router().unwrap().clone();
    assert_eq!(get(&router, "/legacy").await.1, "legacy");
    assert_eq!(get(&router, "/home/ann").await.1, "hello ann");
}

#[test]
fn test_unsupported_verb_aborts_start() {
    let root = project();
    let catalog = ModuleCatalog::new().module("src/controllers/home.rs", |exports| {
        exports.class::<DavController>("DavController");
        Ok(())
    });
    let mut app = application(root.path(), AppConfig::default(), catalog);

    let err = app.start().unwrap_err();
    assert!(matches!(
        err,
        KindlingError::UnsupportedVerb { ref path, .. } if path == "/dav"
    ));
    assert!(app.router().is_none());
}
