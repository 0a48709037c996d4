//! User model - identities admitted through the access gate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User entity. Created on first successful admission; never deleted here.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    /// Unique when present. Some identity providers do not disclose one.
    pub email: Option<String>,
    /// Subject identifier reported by the identity provider.
    pub provider_subject: Option<String>,
    pub display_name: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user.
    pub fn new(
        email: Option<String>,
        provider_subject: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            provider_subject,
            display_name,
            created_utc: Utc::now(),
        }
    }
}

/// User response for API.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            display_name: u.display_name,
            created_utc: u.created_utc,
        }
    }
}
