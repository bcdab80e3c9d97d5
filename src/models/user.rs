use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A credential record as persisted. Never serialized to clients.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Digest of the one refresh token currently accepted for this user.
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The only view of a user that leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Values needed to create a credential record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
