use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{MenuRepository, UserRepository};
use crate::models::{
    menu::{CreatedBy, DailyMenu, MenuFilter, MenuItem, MenuStatus, Pricing, SpecialOffer},
    user::User,
};

const MENU_COLUMNS: &str = "id, date, meal_type, menu_items, special_offers, pricing,
    available_quantity, sold_quantity, status, chef, preparation_notes, allergens, tags,
    created_by, auto_delete_at, created_at, updated_at";

/// DB row: enums are stored as TEXT and nested documents as JSONB.
#[derive(Debug, FromRow)]
struct DailyMenuRow {
    id: Uuid,
    date: NaiveDate,
    meal_type: String,
    menu_items: Json<Vec<MenuItem>>,
    special_offers: Json<Vec<SpecialOffer>>,
    pricing: Json<Pricing>,
    available_quantity: i32,
    sold_quantity: i32,
    status: String,
    chef: Option<String>,
    preparation_notes: Option<String>,
    allergens: Vec<String>,
    tags: Vec<String>,
    created_by: Option<Json<CreatedBy>>,
    auto_delete_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DailyMenuRow> for DailyMenu {
    type Error = anyhow::Error;

    fn try_from(row: DailyMenuRow) -> Result<Self, Self::Error> {
        let available_quantity = u32::try_from(row.available_quantity)?;
        let sold_quantity = u32::try_from(row.sold_quantity)?;
        Ok(DailyMenu {
            id: row.id,
            date: row.date,
            meal_type: row.meal_type.parse()?,
            menu_items: row.menu_items.0,
            special_offers: row.special_offers.0,
            pricing: row.pricing.0,
            available_quantity,
            sold_quantity,
            remaining_quantity: available_quantity.saturating_sub(sold_quantity),
            status: row.status.parse()?,
            chef: row.chef,
            preparation_notes: row.preparation_notes,
            allergens: row.allergens,
            tags: row.tags,
            created_by: row.created_by.map(|c| c.0),
            auto_delete_at: row.auto_delete_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_menus(rows: Vec<DailyMenuRow>) -> anyhow::Result<Vec<DailyMenu>> {
    rows.into_iter().map(DailyMenu::try_from).collect()
}

#[derive(Clone)]
pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, filter: &MenuFilter) -> anyhow::Result<Vec<DailyMenu>> {
        let rows = sqlx::query_as::<_, DailyMenuRow>(&format!(
            r#"SELECT {MENU_COLUMNS}
               FROM daily_menus
               WHERE ($1::DATE IS NULL OR date = $1)
                 AND ($2::TEXT IS NULL OR meal_type = $2)
                 AND ($3::TEXT IS NULL OR status = $3)
               ORDER BY date DESC, created_at DESC"#
        ))
        .bind(filter.date)
        .bind(filter.meal_type.map(|m| m.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        into_menus(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<DailyMenu>> {
        let row = sqlx::query_as::<_, DailyMenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM daily_menus WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DailyMenu::try_from).transpose()
    }

    async fn insert(&self, menu: &DailyMenu) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO daily_menus (id, date, meal_type, menu_items, special_offers, pricing,
                   available_quantity, sold_quantity, status, chef, preparation_notes,
                   allergens, tags, created_by, auto_delete_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                       $13, $14, $15, $16, $17)"#,
        )
        .bind(menu.id)
        .bind(menu.date)
        .bind(menu.meal_type.as_str())
        .bind(Json(&menu.menu_items))
        .bind(Json(&menu.special_offers))
        .bind(Json(&menu.pricing))
        .bind(i32::try_from(menu.available_quantity)?)
        .bind(i32::try_from(menu.sold_quantity)?)
        .bind(menu.status.as_str())
        .bind(&menu.chef)
        .bind(&menu.preparation_notes)
        .bind(&menu.allergens)
        .bind(&menu.tags)
        .bind(menu.created_by.as_ref().map(Json))
        .bind(menu.auto_delete_at)
        .bind(menu.created_at)
        .bind(menu.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, menu: &DailyMenu) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"UPDATE daily_menus
               SET date = $2, meal_type = $3, menu_items = $4, special_offers = $5,
                   pricing = $6, available_quantity = $7, sold_quantity = $8, status = $9,
                   chef = $10, preparation_notes = $11, allergens = $12, tags = $13,
                   auto_delete_at = $14, updated_at = $15
               WHERE id = $1"#,
        )
        .bind(menu.id)
        .bind(menu.date)
        .bind(menu.meal_type.as_str())
        .bind(Json(&menu.menu_items))
        .bind(Json(&menu.special_offers))
        .bind(Json(&menu.pricing))
        .bind(i32::try_from(menu.available_quantity)?)
        .bind(i32::try_from(menu.sold_quantity)?)
        .bind(menu.status.as_str())
        .bind(&menu.chef)
        .bind(&menu.preparation_notes)
        .bind(&menu.allergens)
        .bind(&menu.tags)
        .bind(menu.auto_delete_at)
        .bind(menu.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: MenuStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<DailyMenu>> {
        let row = sqlx::query_as::<_, DailyMenuRow>(&format!(
            r#"UPDATE daily_menus SET status = $2, updated_at = $3
               WHERE id = $1
               RETURNING {MENU_COLUMNS}"#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DailyMenu::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM daily_menus WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn archive_before(&self, date: NaiveDate, at: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE daily_menus SET status = 'archived', updated_at = $2
             WHERE date < $1 AND status <> 'archived'",
        )
        .bind(date)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM daily_menus WHERE date < $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, phone, password_hash, role, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, first_name, last_name, email, phone,
                 password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE LOWER(email) = LOWER($1) OR username = $1
             LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn exists(&self, email: &str, username: &str) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
