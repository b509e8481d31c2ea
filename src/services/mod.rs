pub mod auth;
pub mod menu;
pub mod sweep;
