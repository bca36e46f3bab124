use crate::di::Container;
use crate::error::Result;

/// Trait for types that can be constructed from the DI container
///
/// This trait is typically implemented automatically via `#[derive(Injectable)]` or by the
/// `#[controller]`, `#[service]` and `#[repository]` attributes.
///
/// # Example
/// ```
/// use kindling::{Container, Injectable, Result};
/// use std::sync::Arc;
///
/// pub struct UserRepository;
///
/// impl Injectable for UserRepository {
///     fn inject(_container: &Container) -> Result<Self> {
///         Ok(UserRepository)
///     }
/// }
///
/// pub struct UserService {
///     repository: Arc<UserRepository>,
/// }
///
/// impl Injectable for UserService {
///     fn inject(container: &Container) -> Result<Self> {
///         Ok(UserService {
///             repository: container.resolve::<UserRepository>()?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the container.
    fn inject(container: &Container) -> Result<Self>;
}
