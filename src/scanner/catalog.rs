//! Statically registered source modules.
//!
//! Each source file that defines components registers an initialiser under its own path
//! (normally `file!()`). When the scanner walks a directory and reaches that file, the
//! catalog runs the initialiser, which exports the file's component types and runs their
//! annotations against the catalog's metadata store.
//!
//! ```
//! use kindling::scanner::ModuleCatalog;
//! use kindling::{Annotated, Annotator, Container, Injectable, Result};
//!
//! struct UserRepository;
//!
//! impl Injectable for UserRepository {
//!     fn inject(_container: &Container) -> Result<Self> {
//!         Ok(UserRepository)
//!     }
//! }
//!
//! impl Annotated for UserRepository {
//!     fn annotate(a: &Annotator<'_, Self>) {
//!         a.repository();
//!     }
//! }
//!
//! let catalog = ModuleCatalog::new().module("src/repository/user.rs", |exports| {
//!     exports.class::<UserRepository>("UserRepository");
//!     Ok(())
//! });
//! assert_eq!(catalog.len(), 1);
//! ```

use crate::component::ComponentRef;
use crate::metadata::MetadataStore;
use crate::routing::{Annotated, Annotator};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

type ModuleInit = Arc<dyn Fn(&mut ModuleExports<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module initialiser failed: {0:#}")]
    Init(anyhow::Error),

    #[error("module initialiser panicked: {0}")]
    Panicked(String),
}

/// A symbol exported by a module.
#[derive(Debug, Clone)]
pub enum Export {
    /// A component type that can be classified and instantiated.
    Class(ComponentRef),
    /// Anything else: constants, functions, helpers.
    Value,
}

/// Collects the exports of one module while its initialiser runs.
pub struct ModuleExports<'a> {
    store: &'a MetadataStore,
    entries: Vec<(String, Export)>,
}

impl<'a> ModuleExports<'a> {
    fn new(store: &'a MetadataStore) -> Self {
        Self {
            store,
            entries: Vec::new(),
        }
    }

    /// Export a component type, applying its annotations the first time it is seen.
    pub fn class<T: Annotated>(&mut self, name: &str) -> &mut Self {
        if self.store.mark_annotated(TypeId::of::<T>()) {
            T::annotate(&Annotator::new(self.store));
        }
        self.entries
            .push((name.to_string(), Export::Class(ComponentRef::of::<T>())));
        self
    }

    /// Re-export a class that is defined elsewhere.
    pub fn reexport(&mut self, name: &str, reference: ComponentRef) -> &mut Self {
        self.entries.push((name.to_string(), Export::Class(reference)));
        self
    }

    /// Export a non-class symbol.
    pub fn value(&mut self, name: &str) -> &mut Self {
        self.entries.push((name.to_string(), Export::Value));
        self
    }
}

/// The exports of a loaded module, in declaration order.
#[derive(Debug, Default)]
pub struct LoadedModule {
    pub exports: Vec<(String, Export)>,
}

struct RegisteredModule {
    path: PathBuf,
    init: ModuleInit,
}

pub struct ModuleCatalog {
    modules: Vec<RegisteredModule>,
    store: Arc<MetadataStore>,
    cache: DashMap<usize, Arc<LoadedModule>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MetadataStore::new()))
    }

    pub fn with_store(store: Arc<MetadataStore>) -> Self {
        Self {
            modules: Vec::new(),
            store,
            cache: DashMap::new(),
        }
    }

    /// Register the initialiser of the module at `path`.
    ///
    /// `path` is matched against scanned files by trailing components, so the relative
    /// path produced by `file!()` matches the absolute path the scanner walks to.
    pub fn module<F>(mut self, path: &str, init: F) -> Self
    where
        F: Fn(&mut ModuleExports<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.modules.push(RegisteredModule {
            path: PathBuf::from(path),
            init: Arc::new(init),
        });
        self
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load the module behind `file`.
    ///
    /// A module initialises once; later loads return the cached exports. A failed
    /// initialisation is not cached and runs again on the next load. Files with no
    /// registered module load as modules without exports.
    pub fn load(&self, file: &Path) -> Result<Arc<LoadedModule>, LoadError> {
        let Some(index) = self.lookup(file) else {
            tracing::debug!("No module registered for {}", file.display());
            return Ok(Arc::new(LoadedModule::default()));
        };
        if let Some(cached) = self.cache.get(&index) {
            return Ok(Arc::clone(cached.value()));
        }

        let module = &self.modules[index];
        let mut exports = ModuleExports::new(&self.store);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (module.init)(&mut exports)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(LoadError::Init(e)),
            Err(payload) => return Err(LoadError::Panicked(panic_message(&*payload))),
        }

        let loaded = Arc::new(LoadedModule {
            exports: exports.entries,
        });
        let cached = self.cache.entry(index).or_insert(loaded);
        Ok(Arc::clone(cached.value()))
    }

    fn lookup(&self, file: &Path) -> Option<usize> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, module)| file.ends_with(&module.path))
            .max_by_key(|(_, module)| module.path.components().count())
            .map(|(index, _)| index)
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
