pub mod auth;
pub mod envelope;
pub mod menu;
pub mod user;
