//! Retirement of past-dated menus.
//!
//! Menus are advertised as available "until midnight". At every local midnight the sweep
//! either archives (default) or hard-deletes every menu dated before the new day.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use tracing::{info, warn};

use crate::db::MenuRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    Off,
    Archive,
    Delete,
}

impl std::str::FromStr for SweepMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" | "none" | "" => Ok(SweepMode::Off),
            "archive" => Ok(SweepMode::Archive),
            "delete" => Ok(SweepMode::Delete),
            other => Err(anyhow::anyhow!("Unknown sweep mode: {other}")),
        }
    }
}

impl std::fmt::Display for SweepMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SweepMode::Off => "off",
            SweepMode::Archive => "archive",
            SweepMode::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// Retire menus dated before `today`. Returns how many were archived or deleted.
pub async fn run_once(
    menus: &dyn MenuRepository,
    mode: SweepMode,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let count = match mode {
        SweepMode::Off => 0,
        SweepMode::Archive => menus.archive_before(today, now).await?,
        SweepMode::Delete => menus.delete_before(today).await?,
    };
    if count > 0 {
        info!("Menu sweep ({mode}): {count} menu(s) dated before {today}");
    }
    Ok(count)
}

/// Seconds from `now` until the next local midnight (a full day when called exactly at 00:00:00).
pub fn secs_until_midnight(now: DateTime<Local>) -> u64 {
    let secs_today = u64::from(now.num_seconds_from_midnight());
    86_400 - secs_today
}

/// Spawn a background task that wakes at every local midnight and sweeps.
pub fn start(menus: Arc<dyn MenuRepository>, mode: SweepMode) {
    if mode == SweepMode::Off {
        info!("Menu sweep disabled");
        return;
    }

    tokio::spawn(async move {
        loop {
            let wait = secs_until_midnight(Local::now());
            tokio::time::sleep(tokio::time::Duration::from_secs(wait)).await;

            let today = Local::now().date_naive();
            if let Err(e) = run_once(menus.as_ref(), mode, today, Utc::now()).await {
                warn!("Menu sweep failed: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{
        db::memory::MemoryMenuRepository,
        models::menu::{MealType, MenuFilter, MenuItem, MenuPayload, MenuStatus, PricingInput},
        services::menu::MenuService,
    };

    async fn seed(repo: &MemoryMenuRepository, date: NaiveDate) {
        let payload = MenuPayload {
            date: Some(date),
            meal_type: Some(MealType::Dinner),
            menu_items: vec![MenuItem {
                name: "Khichdi".into(),
                ..MenuItem::default()
            }],
            pricing: Some(PricingInput {
                full_meal: Some(90.0),
                ..PricingInput::default()
            }),
            status: Some(MenuStatus::Published),
            ..MenuPayload::default()
        };
        MenuService::create(repo, &payload, None, Utc::now()).await.unwrap();
    }

    #[test]
    fn waits_until_the_next_midnight() {
        let at = Local.with_ymd_and_hms(2026, 3, 14, 23, 59, 30).unwrap();
        assert_eq!(secs_until_midnight(at), 30);
        let at = Local.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(secs_until_midnight(at), 86_400);
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Archive".parse::<SweepMode>().unwrap(), SweepMode::Archive);
        assert_eq!("delete".parse::<SweepMode>().unwrap(), SweepMode::Delete);
        assert_eq!("off".parse::<SweepMode>().unwrap(), SweepMode::Off);
        assert!("purge".parse::<SweepMode>().is_err());
    }

    #[tokio::test]
    async fn archive_keeps_todays_menus_published() {
        let repo = MemoryMenuRepository::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        seed(&repo, today - Duration::days(1)).await;
        seed(&repo, today).await;

        let n = run_once(&repo, SweepMode::Archive, today, Utc::now()).await.unwrap();
        assert_eq!(n, 1);

        let menus = repo.list(&MenuFilter::default()).await.unwrap();
        for menu in menus {
            let expected = if menu.date < today {
                MenuStatus::Archived
            } else {
                MenuStatus::Published
            };
            assert_eq!(menu.status, expected);
        }
        // Already archived menus are not counted twice.
        assert_eq!(run_once(&repo, SweepMode::Archive, today, Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_only_past_menus() {
        let repo = MemoryMenuRepository::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        seed(&repo, today - Duration::days(3)).await;
        seed(&repo, today - Duration::days(1)).await;
        seed(&repo, today + Duration::days(1)).await;

        assert_eq!(run_once(&repo, SweepMode::Off, today, Utc::now()).await.unwrap(), 0);
        assert_eq!(run_once(&repo, SweepMode::Delete, today, Utc::now()).await.unwrap(), 2);
        let left = repo.list(&MenuFilter::default()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert!(left[0].date > today);
    }
}
