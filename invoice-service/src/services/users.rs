use std::collections::HashMap;

use chrono::Utc;
use service_core::error::AppError;
use tokio::sync::RwLock;

use crate::models::User;
use crate::utils::{hash_password, verify_password, Password};

/// Registered users keyed by lower-cased email.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &Password,
    ) -> Result<User, AppError> {
        let key = normalize(email);

        if self.users.read().await.contains_key(&key) {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }

        let password_hash = hash_password(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }

        let user = User {
            name: name.trim().to_string(),
            email: key.clone(),
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(key, user.clone());

        tracing::info!("User registered");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.get(&normalize(email)).cloned()
    }

    /// The user owning `email`, if `password` matches.
    pub async fn authenticate(&self, email: &str, password: &Password) -> Result<User, AppError> {
        let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"));

        let user = self.find_by_email(email).await.ok_or_else(invalid)?;
        verify_password(password, &user.password_hash).map_err(|_| invalid())?;
        Ok(user)
    }
}
