pub mod auth;
pub mod health;
pub mod menu;
pub mod public;
pub mod users;

use crate::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
