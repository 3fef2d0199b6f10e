//! User domain model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user row as stored, password hash included. Never serialized into
/// responses; handlers go through [`PublicUser`] instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub is_active: bool,
}

/// Response projection of a user, safe for clients (no hash material).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_active: user.is_active,
        }
    }
}
