use axum::http::Method;

/// HTTP verbs a route can be declared with.
///
/// The string form is lowercase (`"get"`, `"propfind"`, ...). Not every verb can be served:
/// the WebDAV-style verbs exist so that declarations can name them, and binding such a
/// route onto a router that lacks them is a fatal error.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    All,
    Options,
    Head,
    Search,
    Propfind,
    Proppatch,
    Mkcol,
    Copy,
    Move,
    Lock,
    Unlock,
}

impl HttpVerb {
    /// Verbs with a dedicated `http::Method` constant and an axum method filter.
    pub const STANDARD: [HttpVerb; 7] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Delete,
        HttpVerb::Patch,
        HttpVerb::Head,
        HttpVerb::Options,
    ];

    pub fn method(self) -> Option<Method> {
        match self {
            HttpVerb::Get => Some(Method::GET),
            HttpVerb::Post => Some(Method::POST),
            HttpVerb::Put => Some(Method::PUT),
            HttpVerb::Delete => Some(Method::DELETE),
            HttpVerb::Patch => Some(Method::PATCH),
            HttpVerb::Head => Some(Method::HEAD),
            HttpVerb::Options => Some(Method::OPTIONS),
            _ => None,
        }
    }
}
