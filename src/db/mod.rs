pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    menu::{DailyMenu, MenuFilter, MenuStatus},
    user::User,
};

/// Store of `DailyMenu` documents. Listings are ordered by date descending, then newest first.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
    async fn list(&self, filter: &MenuFilter) -> anyhow::Result<Vec<DailyMenu>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<DailyMenu>>;
    async fn insert(&self, menu: &DailyMenu) -> anyhow::Result<()>;
    /// Overwrite a stored menu. Returns false when the id is unknown.
    async fn replace(&self, menu: &DailyMenu) -> anyhow::Result<bool>;
    async fn set_status(
        &self,
        id: Uuid,
        status: MenuStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<DailyMenu>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Mark every menu dated before `date` as archived. Returns the number changed.
    async fn archive_before(&self, date: NaiveDate, at: DateTime<Utc>) -> anyhow::Result<u64>;
    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns false, storing nothing, when the email or username is already taken.
    async fn insert(&self, user: &User) -> anyhow::Result<bool>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Look a user up by email (case-insensitive) or username.
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>>;
    async fn exists(&self, email: &str, username: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct Stores {
    pub menus: Arc<dyn MenuRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            menus: Arc::new(memory::MemoryMenuRepository::default()),
            users: Arc::new(memory::MemoryUserRepository::default()),
        }
    }

    /// `memory://` selects the in-process store; anything else is a Postgres URL.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        if database_url.starts_with("memory://") {
            tracing::warn!("Using in-memory store: data is lost on restart");
            return Ok(Self::in_memory());
        }

        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        tracing::info!("Database connected and migrations applied");

        Ok(Self {
            menus: Arc::new(postgres::PgMenuRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool)),
        })
    }
}

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
