//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult, MemorySessionCache, TokenConfig};
use domain::{User, UserStatus};
use user_service_lib::repository::{NewUser, UserRepository};
use user_service_lib::service::{AuthService, Authenticator, UserManager};
use user_service_lib::session::SessionStore;

pub const SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Users held in a map. Enforces the same unique email rule as the table.
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn set_status(&self, id: Uuid, status: UserStatus) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.set_status(status);
        }
    }

    pub fn stored(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.stored(email))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("User"));
        }
        let user = User::new(
            Uuid::new_v4(),
            new_user.email,
            new_user.password_hash,
            new_user.role,
        );
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: Option<String>,
    ) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        user.update_display_name(display_name);
        Ok(user.clone())
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        user.set_status(status);
        Ok(user.clone())
    }

    async fn list(&self, offset: u64, limit: u64) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

pub fn token_config() -> TokenConfig {
    TokenConfig::new(SECRET).unwrap()
}

/// Everything a service-level test needs, sharing one cache and user table.
pub struct Harness {
    pub users: Arc<InMemoryUsers>,
    pub cache: Arc<MemorySessionCache>,
    pub config: TokenConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(token_config())
    }

    pub fn with_config(config: TokenConfig) -> Self {
        Self {
            users: Arc::new(InMemoryUsers::default()),
            cache: Arc::new(MemorySessionCache::new()),
            config,
        }
    }

    /// A fresh service instance over the shared stores, as a second
    /// process would see them.
    pub fn instance(&self) -> Arc<dyn AuthService> {
        Arc::new(Authenticator::new(
            self.users.clone(),
            SessionStore::new(self.cache.clone()),
            common::TokenCodec::from_config(&self.config),
            self.config.clone(),
        ))
    }

    pub fn user_manager(&self) -> UserManager {
        UserManager::new(self.users.clone())
    }
}
