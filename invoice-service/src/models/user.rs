//! Registered user model.

use chrono::{DateTime, Utc};

use crate::utils::PasswordHashString;

#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHashString,
    pub created_at: DateTime<Utc>,
}
