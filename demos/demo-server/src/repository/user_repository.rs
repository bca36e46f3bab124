use kindling::prelude::*;
use kindling::ModuleCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// In-memory user storage.
#[repository]
pub struct UserRepository {
    #[inject(default)]
    users: RwLock<HashMap<String, User>>,
}

impl UserRepository {
    pub fn find_by_id(&self, id: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.get(id).cloned()
    }

    pub fn find_all(&self) -> Vec<User> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn save(&self, name: String) -> User {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = User {
            id: (users.len() + 1).to_string(),
            name,
        };
        users.insert(user.id.clone(), user.clone());
        user
    }
}

pub fn exports(catalog: ModuleCatalog) -> ModuleCatalog {
    catalog.module(file!(), |exports| {
        exports.class::<UserRepository>("UserRepository");
        Ok(())
    })
}
