use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caterhub_api::{app, config::Config, db::Stores, services::sweep, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let stores = Stores::connect(&config.database_url).await?;
    let state = AppState::new(stores, config.clone());

    sweep::start(state.menus.clone(), config.sweep_mode);
    info!("Menu sweep mode: {}", config.sweep_mode);

    let router = app(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("CaterHub API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
