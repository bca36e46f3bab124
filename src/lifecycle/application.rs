//! Application Bootstrap
//!
//! Drives an application from its entry point to a serving router: locate the entry file,
//! resolve the packages to scan, discover components, bind them, then serve until a
//! shutdown signal arrives.

use super::shutdown_signal;
use crate::binder::{AxumRouteSink, BindReport, Binder};
use crate::config::{AppConfig, ConfigService};
use crate::di::Container;
use crate::error::{KindlingError, Result};
use crate::events::EventHub;
use crate::resolver::PathResolver;
use crate::scanner::{ComponentScanner, ModuleCatalog, ScanOptions, ScanReport};
use axum::Router;
use std::env;
use std::future::Future;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Where an application is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum BootState {
    Uninitialized,
    Scanning,
    Bound,
    Serving,
}

/// What `start` found and wired.
#[derive(Debug)]
pub struct BootReport {
    /// Directories that were scanned, in order.
    pub roots: Vec<PathBuf>,
    pub scan: ScanReport,
    pub bind: BindReport,
}

/// A scanned, bound and servable application.
///
/// # Example
///
/// ```rust,ignore
/// use kindling::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() -> kindling::Result<()> {
///     let mut app = Application::builder().catalog(catalog::modules()).build()?;
///     app.start()?;
///     app.serve().await
/// }
/// ```
pub struct Application {
    state: BootState,
    project_root: PathBuf,
    entry_file: PathBuf,
    config: AppConfig,
    env: ConfigService,
    catalog: Arc<ModuleCatalog>,
    container: Arc<Container>,
    events: Arc<EventHub>,
    base_router: Option<Router>,
    router: Option<Router>,
}

impl Application {
    /// Create a new application builder whose entry point is the calling source file.
    #[track_caller]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new(Location::caller().file())
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get a reference to the container
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    pub fn catalog(&self) -> &Arc<ModuleCatalog> {
        &self.catalog
    }

    /// The bound router, once `start` has succeeded.
    pub fn router(&self) -> Option<&Router> {
        self.router.as_ref()
    }

    /// Transform the bound router, e.g. to add layers that wrap every route.
    pub fn map_router<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(Router) -> Router,
    {
        self.expect_state(BootState::Bound)?;
        if let Some(router) = self.router.take() {
            self.router = Some(f(router));
        }
        Ok(())
    }

    /// Scan for components and bind them.
    ///
    /// Fails without scanning when the entry file cannot be found under the project root or
    /// a configured package cannot be resolved. Missing roots and modules that fail to load
    /// are reported in the returned [`BootReport`] instead.
    pub fn start(&mut self) -> Result<BootReport> {
        self.expect_state(BootState::Uninitialized)?;

        let entry = self.locate_entry()?;
        let roots = self.scan_roots(&entry)?;

        self.state = BootState::Scanning;
        tracing::info!("Scanning {} package(s) for components", roots.len());

        let mut scanner =
            ComponentScanner::new(Arc::clone(&self.catalog)).with_options(self.scan_options());
        let scan = scanner.scan(&roots);

        let base = self.base_router.clone().unwrap_or_default();
        let mut sink = AxumRouteSink::with_router(base);
        let bind = Binder::new(self.catalog.store())
            .with_events(Arc::clone(&self.events))
            .bind(&mut sink, &self.container, &scan.components)?;

        self.base_router = None;
        self.router = Some(sink.into_router());
        self.state = BootState::Bound;
        tracing::info!(
            "Application bound: {} components, {} routes",
            scan.components.len(),
            bind.routes.len()
        );

        Ok(BootReport { roots, scan, bind })
    }

    /// Serve on the configured address until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> Result<()> {
        let port = self.config.resolve_port(env::args().skip(1), &self.env);
        let host = self.config.resolve_host(&self.env);
        let address = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| KindlingError::Internal(format!("Failed to bind {}: {}", address, e)))?;
        self.listen(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` completes.
    pub async fn listen<F>(mut self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.expect_state(BootState::Bound)?;
        let router = self.router.take().ok_or_else(|| KindlingError::InvalidState {
            expected: BootState::Bound.to_string(),
            found: "no router".to_string(),
        })?;

        self.state = BootState::Serving;
        if let Ok(address) = listener.local_addr() {
            tracing::info!("Server listening on http://{}", address);
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| KindlingError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    fn expect_state(&self, expected: BootState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(KindlingError::InvalidState {
                expected: expected.to_string(),
                found: self.state.to_string(),
            })
        }
    }

    /// Find the entry file under the project root.
    ///
    /// A relative entry path may carry leading components the root does not (a workspace
    /// member compiled from the workspace root); they are dropped one at a time.
    fn locate_entry(&self) -> Result<PathBuf> {
        let unknown = || KindlingError::EntryLocationUnknown {
            file: self.entry_file.display().to_string(),
        };

        if self.entry_file.is_absolute() {
            return if self.entry_file.is_file() {
                Ok(self.entry_file.clone())
            } else {
                Err(unknown())
            };
        }

        let mut candidate = self.entry_file.as_path();
        loop {
            let joined = self.project_root.join(candidate);
            if joined.is_file() {
                tracing::debug!("Entry file: {}", joined.display());
                return Ok(joined);
            }
            let mut components = candidate.components();
            components.next();
            candidate = components.as_path();
            if candidate.as_os_str().is_empty() {
                return Err(unknown());
            }
        }
    }

    fn scan_roots(&self, entry: &Path) -> Result<Vec<PathBuf>> {
        if self.config.scan_base_packages.is_empty() {
            let dir = entry.parent().unwrap_or(self.project_root.as_path());
            return Ok(vec![dir.to_path_buf()]);
        }

        let mut resolver = PathResolver::new(&self.project_root);
        self.config
            .scan_base_packages
            .iter()
            .map(|name| {
                resolver
                    .resolve(name, None)
                    .ok_or_else(|| KindlingError::PackageNotFound { name: name.clone() })
            })
            .collect()
    }

    fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        options.exclude_dirs.extend(self.config.exclude.iter().cloned());
        options
            .exclude_suffixes
            .extend(self.config.exclude_name.iter().cloned());
        options
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    entry_file: PathBuf,
    project_root: Option<PathBuf>,
    config: AppConfig,
    env: Option<ConfigService>,
    catalog: Option<ModuleCatalog>,
    container: Option<Container>,
    events: Option<Arc<EventHub>>,
    router: Option<Router>,
}

impl ApplicationBuilder {
    /// Create a builder for an application whose entry point is `entry_file`.
    pub fn new(entry_file: impl Into<PathBuf>) -> Self {
        Self {
            entry_file: entry_file.into(),
            project_root: None,
            config: AppConfig::default(),
            env: None,
            catalog: None,
            container: None,
            events: None,
            router: None,
        }
    }

    pub fn entry_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.entry_file = path.into();
        self
    }

    /// Project root used when the configuration does not name one.
    pub fn project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Environment lookups for `PORT` and `HOST`. Defaults to the process environment.
    pub fn env(mut self, env: ConfigService) -> Self {
        self.env = Some(env);
        self
    }

    pub fn catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the DI container
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn events(mut self, hub: Arc<EventHub>) -> Self {
        self.events = Some(hub);
        self
    }

    /// Routes to serve alongside the discovered controllers.
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn build(self) -> Result<Application> {
        let project_root = match self.config.project_root.clone().or(self.project_root) {
            Some(root) => root,
            None => env::current_dir().map_err(|e| KindlingError::io(".", e))?,
        };

        Ok(Application {
            state: BootState::Uninitialized,
            project_root,
            entry_file: self.entry_file,
            config: self.config,
            env: self.env.unwrap_or_else(ConfigService::from_env),
            catalog: Arc::new(self.catalog.unwrap_or_default()),
            container: Arc::new(self.container.unwrap_or_default()),
            events: self.events.unwrap_or_default(),
            base_router: self.router,
            router: None,
        })
    }
}
