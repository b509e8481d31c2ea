// Library exports for the server binary, the admin tools and tests
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::{MenuRepository, Stores, UserRepository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub menus: Arc<dyn MenuRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(stores: Stores, config: Arc<Config>) -> Self {
        Self {
            menus: stores.menus,
            users: stores.users,
            config,
        }
    }
}

/// Build the HTTP router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    // Allow the configured frontend origin plus localhost for development.
    let base = state.config.app_base_url.trim_end_matches('/').to_string();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base
    });

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/profile", get(routes::auth::me))
        // Users
        .route("/api/users/profile", get(routes::users::profile))
        .route("/api/users/admin", get(routes::users::admin_check))
        // Daily menus (admin)
        .route(
            "/api/daily-menu",
            get(routes::menu::list_menus).post(routes::menu::create_menu),
        )
        .route("/api/daily-menu/available", get(routes::menu::available_menus))
        .route(
            "/api/daily-menu/{id}",
            get(routes::menu::get_menu)
                .put(routes::menu::update_menu)
                .delete(routes::menu::delete_menu),
        )
        .route("/api/daily-menu/{id}/status", patch(routes::menu::update_status))
        // Public meals
        .route("/api/public/today-meals", get(routes::public::today_meals))
        .route("/api/public/meal-categories", get(routes::public::meal_categories))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
