use crate::component::ComponentRef;
use crate::di::{Container, Injectable};

/// Builder for constructing a dependency injection container
///
/// Use this to register infrastructure instances and components before the container is
/// handed to an [`Application`](crate::lifecycle::Application).
///
/// # Example
/// ```
/// use kindling::{Container, ContainerBuilder, Injectable, Result};
///
/// struct Clock;
///
/// impl Injectable for Clock {
///     fn inject(_container: &Container) -> Result<Self> {
///         Ok(Clock)
///     }
/// }
///
/// let container = ContainerBuilder::new()
///     .register(String::from("postgres://localhost/app"))
///     .bind::<Clock>()
///     .build();
/// assert!(container.contains::<Clock>());
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register a ready-made instance
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Self-bind an injectable type; it is created on first resolution
    pub fn bind<T: Injectable>(self) -> Self {
        self.container.bind(&ComponentRef::of::<T>());
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
