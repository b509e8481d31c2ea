use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MenuRepository, UserRepository};
use crate::models::{
    menu::{DailyMenu, MenuFilter, MenuStatus},
    user::User,
};

#[derive(Default)]
pub struct MemoryMenuRepository {
    menus: RwLock<HashMap<Uuid, DailyMenu>>,
}

#[async_trait]
impl MenuRepository for MemoryMenuRepository {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list(&self, filter: &MenuFilter) -> anyhow::Result<Vec<DailyMenu>> {
        let menus = self.menus.read().await;
        let mut matching: Vec<DailyMenu> = menus
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matching)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<DailyMenu>> {
        Ok(self.menus.read().await.get(&id).cloned())
    }

    async fn insert(&self, menu: &DailyMenu) -> anyhow::Result<()> {
        let mut menus = self.menus.write().await;
        if menus.contains_key(&menu.id) {
            anyhow::bail!("duplicate menu id {}", menu.id);
        }
        menus.insert(menu.id, menu.clone());
        Ok(())
    }

    async fn replace(&self, menu: &DailyMenu) -> anyhow::Result<bool> {
        let mut menus = self.menus.write().await;
        match menus.get_mut(&menu.id) {
            Some(stored) => {
                let created_by = stored.created_by.take();
                *stored = DailyMenu {
                    created_by,
                    ..menu.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: MenuStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<DailyMenu>> {
        let mut menus = self.menus.write().await;
        Ok(menus.get_mut(&id).map(|menu| {
            menu.status = status;
            menu.updated_at = at;
            menu.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.menus.write().await.remove(&id).is_some())
    }

    async fn archive_before(&self, date: NaiveDate, at: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut menus = self.menus.write().await;
        let mut changed = 0;
        for menu in menus.values_mut() {
            if menu.date < date && menu.status != MenuStatus::Archived {
                menu.status = MenuStatus::Archived;
                menu.updated_at = at;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let mut menus = self.menus.write().await;
        let before = menus.len();
        menus.retain(|_, m| m.date >= date);
        Ok((before - menus.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email) || u.username == user.username)
        {
            return Ok(false);
        }
        users.push(user.clone());
        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(identifier) || u.username == identifier)
            .cloned())
    }

    async fn exists(&self, email: &str, username: &str) -> anyhow::Result<bool> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) || u.username == username))
    }
}
