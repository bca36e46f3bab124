//! Component handles and the descriptors produced by scanning.

use crate::di::{Container, Injectable};
use crate::error::Result;
use crate::metadata::keys;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased, container-managed component instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// The role a component plays in the application.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ComponentKind {
    Controller,
    Service,
    Repository,
}

impl ComponentKind {
    /// Kinds in classification order. A type carrying several tags takes the first.
    pub const PRIORITY: [ComponentKind; 3] = [
        ComponentKind::Controller,
        ComponentKind::Service,
        ComponentKind::Repository,
    ];

    /// The class-level metadata key that marks a type as this kind.
    pub fn metadata_key(self) -> &'static str {
        match self {
            ComponentKind::Controller => keys::CONTROLLER,
            ComponentKind::Service => keys::SERVICE,
            ComponentKind::Repository => keys::REPOSITORY,
        }
    }
}

/// Opaque handle to a component type.
///
/// Identity is the underlying `TypeId`: two handles are equal when they refer to the
/// same Rust type, regardless of the name they were exported under.
#[derive(Clone)]
pub struct ComponentRef {
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
}

impl ComponentRef {
    /// Create a handle for an injectable type.
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            factory: Arc::new(|container: &Container| {
                let instance: Instance = Arc::new(T::inject(container)?);
                Ok(instance)
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    pub(crate) fn instantiate(&self, container: &Container) -> Result<Instance> {
        (self.factory)(container)
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentRef {}

impl Hash for ComponentRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.type_name).finish()
    }
}

/// A classified component discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Export name the component was found under.
    pub name: String,
    pub reference: ComponentRef,
    pub kind: ComponentKind,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, reference: ComponentRef, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            reference,
            kind,
        }
    }

    pub fn is_controller(&self) -> bool {
        self.kind == ComponentKind::Controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::marker::PhantomData;
    use std::str::FromStr;

    struct Plain;

    impl Injectable for Plain {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(Plain)
        }
    }

    struct Other;

    impl Injectable for Other {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(Other)
        }
    }

    struct Wrapper<T>(PhantomData<T>);

    impl<T: Send + Sync + 'static> Injectable for Wrapper<T> {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(Wrapper(PhantomData))
        }
    }

    #[test]
    fn test_short_name_drops_generic_arguments() {
        assert_eq!(ComponentRef::of::<Wrapper<Other>>().short_name(), "Wrapper");
        assert_eq!(
            ComponentRef::of::<Wrapper<Wrapper<Plain>>>().short_name(),
            "Wrapper"
        );
    }

    #[test]
    fn test_reference_identity_is_type() {
        assert_eq!(ComponentRef::of::<Plain>(), ComponentRef::of::<Plain>());
        assert_ne!(ComponentRef::of::<Plain>(), ComponentRef::of::<Other>());
        assert_eq!(ComponentRef::of::<Plain>().short_name(), "Plain");
    }

    #[test]
    fn test_kind_round_trips_through_strings() {
        assert_eq!(ComponentKind::Controller.to_string(), "controller");
        assert_eq!(
            ComponentKind::from_str("repository").unwrap(),
            ComponentKind::Repository
        );
    }

    #[test]
    fn test_kind_priority_order() {
        assert_eq!(
            ComponentKind::PRIORITY,
            [
                ComponentKind::Controller,
                ComponentKind::Service,
                ComponentKind::Repository
            ]
        );
    }
}
