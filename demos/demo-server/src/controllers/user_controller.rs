use crate::repository::{User, UserRepository};
use axum::response::Html;
use kindling::prelude::*;
use kindling::ModuleCatalog;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Greeting {
    pub text: String,
}

#[controller("/user")]
pub struct UserController {
    users: Arc<UserRepository>,
}

#[routes]
impl UserController {
    #[get("/ok")]
    pub async fn ok(&self) -> Html<&'static str> {
        Html("<div>USER</div>")
    }

    #[get("/")]
    #[middleware(RequestLogging)]
    pub async fn list(&self) -> Json<Vec<User>> {
        Json(self.users.find_all())
    }

    #[get("/:id")]
    #[middleware(RequestLogging)]
    pub async fn find(&self, #[param] id: String) -> Response {
        match self.users.find_by_id(&id) {
            Some(user) => Json(user).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    #[post("/")]
    #[middleware(RequestLogging)]
    pub async fn create(&self, #[body] request: CreateUser) -> (StatusCode, Json<User>) {
        let user = self.users.save(request.name);
        tracing::info!("Created user {}", user.id);
        (StatusCode::CREATED, Json(user))
    }

    #[on_connect]
    pub async fn joined(&self, socket: SocketContext) {
        tracing::info!("Socket {} connected", socket.id);
    }

    #[channel("greet")]
    pub async fn greet(&self, socket: SocketContext, greeting: Greeting) {
        tracing::info!("Socket {} says {}", socket.id, greeting.text);
    }

    #[on_disconnect]
    pub async fn left(&self, socket: SocketContext) {
        tracing::info!("Socket {} disconnected", socket.id);
    }
}

pub fn exports(catalog: ModuleCatalog) -> ModuleCatalog {
    catalog.module(file!(), |exports| {
        exports.class::<UserController>("UserController");
        Ok(())
    })
}
