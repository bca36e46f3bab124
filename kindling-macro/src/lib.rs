use proc_macro::TokenStream;

mod component;
mod injectable;
mod routes;

/// Derive macro for making a struct injectable into the DI container
///
/// Every `Arc<T>` field is resolved from the container. Fields marked `#[inject(default)]`
/// are initialised with `Default::default()` instead.
///
/// # Example
/// ```ignore
/// use kindling::Injectable;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<UserRepository>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for declaring a controller
///
/// The struct becomes injectable and its routes, declared in a `#[routes]` impl block,
/// are mounted under `path`.
///
/// # Example
/// ```ignore
/// #[controller(path = "/users")]
/// pub struct UserController {
///     user_service: Arc<UserService>,
/// }
///
/// #[routes]
/// impl UserController {
///     #[get("/:id")]
///     async fn get_user(&self, #[param] id: String) -> String {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    component::controller_attribute(attr, item)
}

/// Attribute macro for declaring a service component
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    component::component_attribute("service", attr, item)
}

/// Attribute macro for declaring a repository component
#[proc_macro_attribute]
pub fn repository(attr: TokenStream, item: TokenStream) -> TokenStream {
    component::component_attribute("repository", attr, item)
}

/// Attribute macro for declaring the routes and socket handlers of a controller
///
/// Methods tagged with a verb attribute (`#[get]`, `#[post]`, ...) become routes in
/// declaration order; `#[middleware(..)]` wraps the method's routes, and `#[on_connect]`,
/// `#[on_disconnect]` and `#[channel("name")]` register socket handlers.
///
/// # Example
/// ```ignore
/// #[routes]
/// impl UserController {
///     #[get("/:id")]
///     #[middleware(RequestLogging)]
///     async fn get_user(&self, #[param] id: String) -> Json<User> {
///         // ...
///     }
///
///     #[channel("message")]
///     async fn on_message(&self, socket: SocketContext, text: String) {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::routes_attribute(attr, item)
}

/// HTTP GET method attribute for controller methods
#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP POST method attribute for controller methods
#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP PUT method attribute for controller methods
#[proc_macro_attribute]
pub fn put(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP DELETE method attribute for controller methods
#[proc_macro_attribute]
pub fn delete(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP PATCH method attribute for controller methods
#[proc_macro_attribute]
pub fn patch(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP HEAD method attribute for controller methods
#[proc_macro_attribute]
pub fn head(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// HTTP OPTIONS method attribute for controller methods
#[proc_macro_attribute]
pub fn options(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// Middleware attribute for controller methods
#[proc_macro_attribute]
pub fn middleware(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// Socket connection handler
#[proc_macro_attribute]
pub fn on_connect(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// Socket disconnection handler
#[proc_macro_attribute]
pub fn on_disconnect(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}

/// Socket channel handler
#[proc_macro_attribute]
pub fn channel(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::pass_through(attr, item)
}
