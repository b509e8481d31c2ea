use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user UUID
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Principal resolved from a bearer token: available via Axum extractors
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// An `AuthenticatedUser` whose stored role is `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);
