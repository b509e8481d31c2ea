//! HTTP client side of the admin dashboard.

pub mod api;
pub mod dashboard;

pub use api::{ApiClient, ClientError};
pub use dashboard::AdminDashboard;
