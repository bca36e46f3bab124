//! Component discovery over source directories.
//!
//! The scanner walks each root directory, loads every source file through the
//! [`ModuleCatalog`] and classifies the exported classes by the tags their annotations
//! left in the metadata store.

mod catalog;

pub use catalog::{Export, LoadError, LoadedModule, ModuleCatalog, ModuleExports};

use crate::component::{ComponentDescriptor, ComponentKind, ComponentRef};
use crate::metadata::MetadataTarget;
use indexmap::IndexMap;
use std::any::TypeId;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Which files a scan visits.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File extensions treated as source files, without the dot.
    pub extensions: Vec<String>,
    /// Directory names that are not descended into.
    pub exclude_dirs: Vec<String>,
    /// File name suffixes that are skipped even when the extension matches.
    pub exclude_suffixes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["rs".to_string()],
            exclude_dirs: Vec::new(),
            exclude_suffixes: vec!["build.rs".to_string()],
        }
    }
}

/// A source file whose module failed to load.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Classified components in discovery order.
    pub components: Vec<ComponentDescriptor>,
    /// Files skipped because their module failed to load.
    pub failures: Vec<ScanFailure>,
    /// Non-fatal problems such as missing roots.
    pub warnings: Vec<String>,
}

pub struct ComponentScanner {
    catalog: Arc<ModuleCatalog>,
    options: ScanOptions,
    components: IndexMap<String, ComponentDescriptor>,
    loaded: HashSet<TypeId>,
}

impl ComponentScanner {
    pub fn new(catalog: Arc<ModuleCatalog>) -> Self {
        Self {
            catalog,
            options: ScanOptions::default(),
            components: IndexMap::new(),
            loaded: HashSet::new(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scan `roots` in order and return every classified component.
    ///
    /// State from a previous scan is discarded first. Missing roots and modules that fail to
    /// load are reported and skipped; the rest of the scan continues.
    pub fn scan<P: AsRef<Path>>(&mut self, roots: &[P]) -> ScanReport {
        self.components.clear();
        self.loaded.clear();

        let mut report = ScanReport::default();
        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                let warning = format!("Scan root not found: {}", root.display());
                tracing::warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }
            self.scan_root(root, &mut report);
        }

        report.components = self.components.values().cloned().collect();
        tracing::info!(
            "Scan complete: {} components, {} failed modules",
            report.components.len(),
            report.failures.len()
        );
        report
    }

    fn scan_root(&mut self, root: &Path, report: &mut ScanReport) {
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !self.options.exclude_dirs.iter().any(|dir| *dir == name)
            });

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.is_source_file(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    tracing::warn!("{}", warning);
                    report.warnings.push(warning);
                }
            }
        }

        for file in files {
            self.process_file(&file, report);
        }
    }

    fn is_source_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.options.extensions.iter().any(|ext| ext == extension)
            && !self
                .options
                .exclude_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
    }

    fn process_file(&mut self, path: &Path, report: &mut ScanReport) {
        let module = match self.catalog.load(path) {
            Ok(module) => module,
            Err(e) => {
                tracing::error!("Failed to load module {}: {}", path.display(), e);
                report.failures.push(ScanFailure {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        for (name, export) in &module.exports {
            let Export::Class(reference) = export else {
                continue;
            };
            if self.loaded.contains(&reference.type_id()) {
                continue;
            }
            let Some(kind) = self.classify(reference) else {
                continue;
            };
            tracing::debug!("Found {} '{}' in {}", kind, name, path.display());
            self.components.insert(
                name.clone(),
                ComponentDescriptor::new(name.clone(), reference.clone(), kind),
            );
            self.loaded.insert(reference.type_id());
        }
    }

    /// The first kind, in priority order, whose tag the class carries.
    fn classify(&self, reference: &ComponentRef) -> Option<ComponentKind> {
        let target = MetadataTarget::Class(reference.type_id());
        let store = self.catalog.store();
        ComponentKind::PRIORITY
            .into_iter()
            .find(|kind| store.has_attribute(&target, kind.metadata_key()))
    }

    /// Components found by the last scan, in discovery order.
    pub fn components(&self) -> Vec<ComponentDescriptor> {
        self.components.values().cloned().collect()
    }

    pub fn controllers(&self) -> Vec<ComponentDescriptor> {
        self.of_kind(ComponentKind::Controller)
    }

    pub fn services(&self) -> Vec<ComponentDescriptor> {
        self.of_kind(ComponentKind::Service)
    }

    pub fn repositories(&self) -> Vec<ComponentDescriptor> {
        self.of_kind(ComponentKind::Repository)
    }

    fn of_kind(&self, kind: ComponentKind) -> Vec<ComponentDescriptor> {
        self.components
            .values()
            .filter(|descriptor| descriptor.kind == kind)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Container, Injectable};
    use crate::error::Result;
    use crate::routing::{Annotated, Annotator};
    use std::fs;
    use tempfile::TempDir;

    macro_rules! component {
        ($name:ident, |$a:ident| $body:block) => {
            struct $name;

            impl Injectable for $name {
                fn inject(_container: &Container) -> Result<Self> {
                    Ok($name)
                }
            }

            impl Annotated for $name {
                fn annotate($a: &Annotator<'_, Self>) $body
            }
        };
    }

    component!(UserController, |a| {
        a.controller("/user");
    });
    component!(UserService, |a| {
        a.service();
    });
    component!(UserRepository, |a| {
        a.repository();
    });
    component!(Untagged, |_a| {});
    component!(Everything, |a| {
        a.repository().service().controller("");
    });
    component!(OrderService, |a| {
        a.service();
    });

    fn project(files: &[&str]) -> TempDir {
        let root = TempDir::new().unwrap();
        for file in files {
            let path = root.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "// component module").unwrap();
        }
        root
    }

    fn names(components: &[ComponentDescriptor]) -> Vec<&str> {
        components.iter().map(|c| c.name.as_str()).collect()
    }

    fn app_catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .module("app/controllers/user.rs", |exports| {
                exports.class::<UserController>("UserController");
                Ok(())
            })
            .module("app/services/user.rs", |exports| {
                exports
                    .value("DEFAULT_PAGE_SIZE")
                    .class::<UserService>("UserService")
                    .class::<Untagged>("Untagged");
                Ok(())
            })
            .module("app/repository/user.rs", |exports| {
                exports.class::<UserRepository>("UserRepository");
                Ok(())
            })
    }

    #[test]
    fn test_classifies_by_tag() {
        let root = project(&[
            "app/controllers/user.rs",
            "app/services/user.rs",
            "app/repository/user.rs",
        ]);
        let mut scanner = ComponentScanner::new(Arc::new(app_catalog()));
        let report = scanner.scan(&[root.path().join("app")]);

        let kinds: Vec<(&str, ComponentKind)> = report
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("UserController", ComponentKind::Controller),
                ("UserRepository", ComponentKind::Repository),
                ("UserService", ComponentKind::Service),
            ]
        );
        assert!(report.failures.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_multiple_tags_resolve_by_priority() {
        let root = project(&["all.rs"]);
        let catalog = ModuleCatalog::new().module("all.rs", |exports| {
            exports.class::<Everything>("Everything");
            Ok(())
        });
        let mut scanner = ComponentScanner::new(Arc::new(catalog));
        let report = scanner.scan(&[root.path()]);

        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].kind, ComponentKind::Controller);
    }

    #[test]
    fn test_one_failing_module_does_not_abort_scan() {
        let root = project(&["a.rs", "b.rs", "c.rs"]);
        let catalog = ModuleCatalog::new()
            .module("a.rs", |exports| {
                exports.class::<UserController>("UserController");
                Ok(())
            })
            .module("b.rs", |_exports| anyhow::bail!("unresolved import"))
            .module("c.rs", |exports| {
                exports.class::<UserRepository>("UserRepository");
                Ok(())
            });
        let mut scanner = ComponentScanner::new(Arc::new(catalog));
        let report = scanner.scan(&[root.path()]);

        assert_eq!(names(&report.components), vec!["UserController", "UserRepository"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("b.rs"));
        assert!(report.failures[0].message.contains("unresolved import"));
    }

    #[test]
    fn test_missing_root_warns_and_continues() {
        let root = project(&["app/controllers/user.rs"]);
        let mut scanner = ComponentScanner::new(Arc::new(app_catalog()));
        let missing = root.path().join("nowhere");
        let report = scanner.scan(&[missing, root.path().join("app")]);

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("nowhere"));
        assert_eq!(names(&report.components), vec!["UserController"]);
    }

    #[test]
    fn test_duplicate_export_names_last_writer_wins() {
        let root = project(&["a.rs", "b.rs"]);
        let catalog = ModuleCatalog::new()
            .module("a.rs", |exports| {
                exports.class::<UserService>("Service");
                Ok(())
            })
            .module("b.rs", |exports| {
                exports.class::<OrderService>("Service");
                Ok(())
            });
        let mut scanner = ComponentScanner::new(Arc::new(catalog));
        let report = scanner.scan(&[root.path()]);

        assert_eq!(report.components.len(), 1);
        assert_eq!(
            report.components[0].reference,
            ComponentRef::of::<OrderService>()
        );
    }

    #[test]
    fn test_reexported_class_is_classified_once() {
        let root = project(&["a.rs", "b.rs"]);
        let catalog = ModuleCatalog::new()
            .module("a.rs", |exports| {
                exports.class::<UserService>("UserService");
                Ok(())
            })
            .module("b.rs", |exports| {
                exports.reexport("Users", ComponentRef::of::<UserService>());
                Ok(())
            });
        let mut scanner = ComponentScanner::new(Arc::new(catalog));
        let report = scanner.scan(&[root.path()]);

        assert_eq!(names(&report.components), vec!["UserService"]);
    }

    #[test]
    fn test_rescan_replaces_previous_results() {
        let root = project(&[
            "app/controllers/user.rs",
            "app/services/user.rs",
            "app/repository/user.rs",
        ]);
        let mut scanner = ComponentScanner::new(Arc::new(app_catalog()));

        let first = scanner.scan(&[root.path().join("app")]);
        let second = scanner.scan(&[root.path().join("app")]);
        assert_eq!(first.components, second.components);

        let narrowed = scanner.scan(&[root.path().join("app/services")]);
        assert_eq!(names(&narrowed.components), vec!["UserService"]);
        assert_eq!(names(&scanner.components()), vec!["UserService"]);
    }

    #[test]
    fn test_excluded_directories_and_suffixes_are_skipped() {
        let root = project(&[
            "app/controllers/user.rs",
            "app/services/user.rs",
            "app/repository/user.rs",
            "app/build.rs",
            "app/notes.txt",
        ]);
        let catalog = app_catalog().module("app/build.rs", |_exports| {
            anyhow::bail!("build scripts are not modules")
        });
        let options = ScanOptions {
            exclude_dirs: vec!["repository".to_string()],
            ..ScanOptions::default()
        };
        let mut scanner = ComponentScanner::new(Arc::new(catalog)).with_options(options);
        let report = scanner.scan(&[root.path().join("app")]);

        assert_eq!(names(&report.components), vec!["UserController", "UserService"]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_kind_views() {
        let root = project(&[
            "app/controllers/user.rs",
            "app/services/user.rs",
            "app/repository/user.rs",
        ]);
        let mut scanner = ComponentScanner::new(Arc::new(app_catalog()));
        scanner.scan(&[root.path().join("app")]);

        assert_eq!(names(&scanner.controllers()), vec!["UserController"]);
        assert_eq!(names(&scanner.services()), vec!["UserService"]);
        assert_eq!(names(&scanner.repositories()), vec!["UserRepository"]);
    }
}
