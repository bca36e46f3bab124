use crate::component::{ComponentRef, Instance};
use crate::error::{KindlingError, Result};
use dashmap::DashMap;
use std::any::TypeId;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Components being created on this thread, outermost first, tagged with their container.
    static RESOLVING: RefCell<Vec<(u64, TypeId, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Thread-safe dependency injection container.
///
/// Holds two kinds of entries: instances registered up front with [`Container::register`],
/// and self-bound components registered with [`Container::bind`] that are created on first
/// request and then cached for the lifetime of the container.
///
/// Cycle detection follows one thread's chain of `inject` calls, so threads resolving the
/// same component at once never see each other as a cycle. When they race, each may run
/// the factory but every caller gets the instance that was stored first.
pub struct Container {
    id: u64,
    services: DashMap<TypeId, ServiceEntry>,
    bindings: DashMap<TypeId, ComponentRef>,
}

/// Pops the resolution stack entry pushed by [`Container::enter`], even on unwind.
struct Resolving {
    container: u64,
    type_id: TypeId,
}

impl Drop for Resolving {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack
                .iter()
                .rposition(|(c, id, _)| *c == self.container && *id == self.type_id)
            {
                stack.remove(pos);
            }
        });
    }
}

#[derive(Clone)]
struct ServiceEntry {
    instance: Instance,
}

impl Container {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            services: DashMap::new(),
            bindings: DashMap::new(),
        }
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        let type_id = TypeId::of::<T>();
        let entry = ServiceEntry {
            instance: Arc::new(instance),
        };
        self.services.insert(type_id, entry);
        self
    }

    /// Self-bind a component so the container manages a single instance of it.
    ///
    /// Returns `false` when the reference was already bound; the existing binding is kept.
    pub fn bind(&self, reference: &ComponentRef) -> bool {
        if self.bindings.contains_key(&reference.type_id()) {
            return false;
        }
        self.bindings
            .insert(reference.type_id(), reference.clone())
            .is_none()
    }

    /// Return the singleton for a bound component, creating it on first use.
    pub fn get(&self, reference: &ComponentRef) -> Result<Instance> {
        if let Some(entry) = self.services.get(&reference.type_id()) {
            return Ok(entry.instance.clone());
        }
        if !self.bindings.contains_key(&reference.type_id()) {
            return Err(KindlingError::DependencyNotFound {
                type_name: reference.type_name().to_string(),
            });
        }
        self.create(reference)
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let requested_type_id = TypeId::of::<T>();
        let existing = self
            .services
            .get(&requested_type_id)
            .map(|entry| entry.instance.clone());
        let instance = match existing {
            Some(instance) => instance,
            None => {
                // Clone out of the map so no shard lock is held while the factory runs.
                let binding = self
                    .bindings
                    .get(&requested_type_id)
                    .map(|b| b.value().clone())
                    .ok_or_else(|| KindlingError::DependencyNotFound {
                        type_name: std::any::type_name::<T>().to_string(),
                    })?;
                self.create(&binding)?
            }
        };
        instance
            .downcast::<T>()
            .map_err(|_| KindlingError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    fn create(&self, reference: &ComponentRef) -> Result<Instance> {
        let guard = self.enter(reference)?;
        let created = reference.instantiate(self);
        drop(guard);

        let instance = created?;
        // A concurrent creator may have won; keep whichever instance was stored first.
        let entry = self
            .services
            .entry(reference.type_id())
            .or_insert(ServiceEntry { instance });
        tracing::debug!("Instantiated component: {}", reference.type_name());
        Ok(entry.instance.clone())
    }

    fn enter(&self, reference: &ComponentRef) -> Result<Resolving> {
        let type_id = reference.type_id();
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            let mut cycle: Vec<&str> = stack
                .iter()
                .filter(|(container, _, _)| *container == self.id)
                .skip_while(|(_, id, _)| *id != type_id)
                .map(|(_, _, name)| *name)
                .collect();
            if !cycle.is_empty() {
                cycle.push(reference.type_name());
                return Err(KindlingError::CircularDependency {
                    cycle: cycle.join(" -> "),
                });
            }
            stack.push((self.id, type_id, reference.type_name()));
            Ok(Resolving {
                container: self.id,
                type_id,
            })
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.bindings.contains_key(&type_id)
    }

    pub fn is_bound(&self, reference: &ComponentRef) -> bool {
        self.bindings.contains_key(&reference.type_id())
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
