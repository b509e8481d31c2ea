use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    db::MenuRepository,
    error::AppError,
    models::menu::{
        CategoryCount, CreatedBy, DailyMenu, MealType, MenuFilter, MenuItem, MenuPayload,
        MenuStatus, Pricing, SpecialOffer, TodayMeal, TodaysMeals,
    },
};

pub const DEFAULT_AVAILABLE_QUANTITY: u32 = 50;
/// Quantities are stored as Postgres INTEGER.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// The server's current calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First local instant of the day after `date`.
pub fn next_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.succ_opt().unwrap_or(date).and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Fields of a `MenuPayload` after validation and cleanup.
struct ValidMenu {
    date: NaiveDate,
    meal_type: MealType,
    menu_items: Vec<MenuItem>,
    special_offers: Vec<SpecialOffer>,
    pricing: Pricing,
    chef: Option<String>,
    preparation_notes: Option<String>,
    allergens: Vec<String>,
    tags: Vec<String>,
}

fn validate(payload: &MenuPayload) -> Result<ValidMenu, AppError> {
    let date = payload
        .date
        .ok_or_else(|| AppError::Validation("Date is required".into()))?;
    let meal_type = payload
        .meal_type
        .ok_or_else(|| AppError::Validation("Meal type is required".into()))?;
    if payload.menu_items.is_empty() {
        return Err(AppError::Validation("At least one menu item is required".into()));
    }
    let quantities = [payload.available_quantity, payload.sold_quantity];
    if quantities.into_iter().flatten().any(|q| q > MAX_QUANTITY) {
        return Err(AppError::Validation(format!("Quantities cannot exceed {MAX_QUANTITY}")));
    }

    let pricing = payload.pricing.clone().unwrap_or_default();
    let full_meal = pricing
        .full_meal
        .ok_or_else(|| AppError::Validation("Full meal price is required".into()))?;
    let prices = std::iter::once(full_meal)
        .chain(pricing.half_meal)
        .chain(pricing.individual_items.iter().map(|p| p.price));
    for price in prices {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::Validation("Prices must be non-negative numbers".into()));
        }
    }

    let mut menu_items = Vec::with_capacity(payload.menu_items.len());
    for (idx, item) in payload.menu_items.iter().enumerate() {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(format!("Menu item {} needs a name", idx + 1)));
        }
        menu_items.push(MenuItem {
            name: name.to_string(),
            category: item.category.trim().to_string(),
            ingredients: clean_lines(&item.ingredients),
            ..item.clone()
        });
    }

    Ok(ValidMenu {
        date,
        meal_type,
        menu_items,
        special_offers: payload.special_offers.clone(),
        pricing: Pricing {
            full_meal,
            half_meal: pricing.half_meal,
            individual_items: pricing.individual_items,
        },
        chef: non_blank(payload.chef.as_deref()),
        preparation_notes: non_blank(payload.preparation_notes.as_deref()),
        allergens: clean_set(&payload.allergens),
        tags: clean_set(&payload.tags),
    })
}

/// Trimmed, non-empty lines in their original order.
fn clean_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Like `clean_lines`, without duplicates.
fn clean_set(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in clean_lines(values) {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn not_found() -> AppError {
    AppError::NotFound("Menu not found".into())
}

pub struct MenuService;

impl MenuService {
    pub async fn list(
        menus: &dyn MenuRepository,
        filter: &MenuFilter,
    ) -> Result<Vec<DailyMenu>, AppError> {
        Ok(menus.list(filter).await?)
    }

    pub async fn get(menus: &dyn MenuRepository, id: Uuid) -> Result<DailyMenu, AppError> {
        menus.find(id).await?.ok_or_else(not_found)
    }

    /// Persist a new menu. The server owns `id`, `soldQuantity` (always 0) and the derived
    /// `remainingQuantity`.
    pub async fn create(
        menus: &dyn MenuRepository,
        payload: &MenuPayload,
        created_by: Option<CreatedBy>,
        now: DateTime<Utc>,
    ) -> Result<DailyMenu, AppError> {
        let valid = validate(payload)?;

        let mut menu = DailyMenu {
            id: Uuid::new_v4(),
            date: valid.date,
            meal_type: valid.meal_type,
            menu_items: valid.menu_items,
            special_offers: valid.special_offers,
            pricing: valid.pricing,
            available_quantity: payload.available_quantity.unwrap_or(DEFAULT_AVAILABLE_QUANTITY),
            sold_quantity: 0,
            remaining_quantity: 0,
            status: payload.status.unwrap_or(MenuStatus::Draft),
            chef: valid.chef,
            preparation_notes: valid.preparation_notes,
            allergens: valid.allergens,
            tags: valid.tags,
            created_by,
            auto_delete_at: Some(
                payload
                    .auto_delete_at
                    .unwrap_or_else(|| next_midnight(valid.date)),
            ),
            created_at: now,
            updated_at: now,
        };
        menu.refresh_inventory();

        menus.insert(&menu).await?;
        tracing::info!(
            menu_id = %menu.id,
            date = %menu.date,
            meal_type = %menu.meal_type,
            status = %menu.status,
            items = menu.menu_items.len(),
            "menu created"
        );
        Ok(menu)
    }

    /// Replace the editable fields of an existing menu.
    pub async fn update(
        menus: &dyn MenuRepository,
        id: Uuid,
        payload: &MenuPayload,
        now: DateTime<Utc>,
    ) -> Result<DailyMenu, AppError> {
        let existing = menus.find(id).await?.ok_or_else(not_found)?;
        let valid = validate(payload)?;

        let available_quantity = payload.available_quantity.unwrap_or(existing.available_quantity);
        let sold_quantity = payload.sold_quantity.unwrap_or(existing.sold_quantity);
        if sold_quantity > available_quantity {
            return Err(AppError::Validation(
                "Sold quantity cannot exceed available quantity".into(),
            ));
        }

        let auto_delete_at = match payload.auto_delete_at {
            Some(at) => Some(at),
            None if valid.date == existing.date => existing.auto_delete_at,
            None => Some(next_midnight(valid.date)),
        };

        let mut menu = DailyMenu {
            id: existing.id,
            date: valid.date,
            meal_type: valid.meal_type,
            menu_items: valid.menu_items,
            special_offers: valid.special_offers,
            pricing: valid.pricing,
            available_quantity,
            sold_quantity,
            remaining_quantity: 0,
            status: payload.status.unwrap_or(existing.status),
            chef: valid.chef,
            preparation_notes: valid.preparation_notes,
            allergens: valid.allergens,
            tags: valid.tags,
            created_by: existing.created_by,
            auto_delete_at,
            created_at: existing.created_at,
            updated_at: now,
        };
        menu.refresh_inventory();

        if !menus.replace(&menu).await? {
            return Err(not_found());
        }
        tracing::info!(menu_id = %menu.id, status = %menu.status, "menu updated");
        Ok(menu)
    }

    /// Overwrite the status label. No transition is refused.
    pub async fn update_status(
        menus: &dyn MenuRepository,
        id: Uuid,
        status: MenuStatus,
        now: DateTime<Utc>,
    ) -> Result<DailyMenu, AppError> {
        let menu = menus
            .set_status(id, status, now)
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(menu_id = %id, status = %status, "menu status changed");
        Ok(menu)
    }

    pub async fn delete(menus: &dyn MenuRepository, id: Uuid) -> Result<(), AppError> {
        if !menus.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(menu_id = %id, "menu deleted");
        Ok(())
    }

    /// Published menus dated `today` or later that still have portions left, soonest first.
    pub async fn available(
        menus: &dyn MenuRepository,
        today: NaiveDate,
    ) -> Result<Vec<DailyMenu>, AppError> {
        let filter = MenuFilter {
            status: Some(MenuStatus::Published),
            ..MenuFilter::default()
        };
        let mut available: Vec<DailyMenu> = menus
            .list(&filter)
            .await?
            .into_iter()
            .filter(|m| m.date >= today && m.remaining_quantity > 0)
            .collect();
        available.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(available)
    }

    async fn published_on(
        menus: &dyn MenuRepository,
        date: NaiveDate,
    ) -> Result<Vec<DailyMenu>, AppError> {
        let filter = MenuFilter {
            date: Some(date),
            status: Some(MenuStatus::Published),
            ..MenuFilter::default()
        };
        Ok(menus.list(&filter).await?)
    }

    /// Every item of every menu published for `today`, flattened for the public meals page.
    pub async fn todays_meals(
        menus: &dyn MenuRepository,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TodaysMeals, AppError> {
        let published = Self::published_on(menus, today).await?;
        let meals: Vec<TodayMeal> = published.iter().flat_map(flatten_menu).collect();

        Ok(TodaysMeals {
            total_meals: meals.len(),
            meals,
            date: today,
            last_updated: now,
        })
    }

    /// Item counts per category over the same set `todays_meals` returns.
    pub async fn categories(
        menus: &dyn MenuRepository,
        today: NaiveDate,
    ) -> Result<Vec<CategoryCount>, AppError> {
        let published = Self::published_on(menus, today).await?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in published.iter().flat_map(|m| m.menu_items.iter()) {
            *counts.entry(item.category.as_str()).or_default() += 1;
        }

        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(categories)
    }
}

fn flatten_menu(menu: &DailyMenu) -> impl Iterator<Item = TodayMeal> + '_ {
    let available_until = menu
        .auto_delete_at
        .unwrap_or_else(|| next_midnight(menu.date));
    menu.menu_items
        .iter()
        .enumerate()
        .map(move |(idx, item)| TodayMeal {
            id: format!("{}-{}", menu.id, idx),
            menu_id: menu.id,
            title: item.name.clone(),
            description: item.description.clone(),
            price: menu.pricing.price_of(&item.name),
            category: item.category.clone(),
            ingredients: item.ingredients.clone(),
            is_vegan: item.is_vegan,
            is_vegetarian: item.is_vegetarian,
            spice_level: item.spice_level,
            preparation_time: item.preparation_time,
            allergens: menu.allergens.clone(),
            tags: menu.tags.clone(),
            available_until,
            meal_type: menu.meal_type,
        })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{db::memory::MemoryMenuRepository, models::menu::PricingInput};

    fn item(name: &str, category: &str) -> MenuItem {
        MenuItem {
            name: name.into(),
            category: category.into(),
            ingredients: vec!["  onion ".into(), "".into(), "tomato".into()],
            ..MenuItem::default()
        }
    }

    fn payload(date: NaiveDate, status: MenuStatus) -> MenuPayload {
        MenuPayload {
            date: Some(date),
            meal_type: Some(MealType::Lunch),
            menu_items: vec![item("Rajma", "main_course"), item("Jeera rice", "rice")],
            pricing: Some(PricingInput {
                full_meal: Some(140.0),
                half_meal: Some(98.0),
                individual_items: vec![],
            }),
            available_quantity: Some(30),
            status: Some(status),
            tags: vec!["fresh".into(), " fresh".into(), "".into()],
            ..MenuPayload::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_inventory_and_cleans_lines() {
        let repo = MemoryMenuRepository::default();
        let draft = payload(today(), MenuStatus::Draft);
        let menu = MenuService::create(&repo, &draft, None, Utc::now()).await.unwrap();

        assert_eq!(menu.sold_quantity, 0);
        assert_eq!(menu.remaining_quantity, menu.available_quantity - menu.sold_quantity);
        assert_eq!(menu.menu_items[0].ingredients, vec!["onion", "tomato"]);
        assert_eq!(menu.tags, vec!["fresh"]);
        assert_eq!(menu.auto_delete_at, Some(next_midnight(menu.date)));
        assert_eq!(MenuService::get(&repo, menu.id).await.unwrap(), menu);
    }

    #[tokio::test]
    async fn create_rejects_missing_required_fields() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();

        let mut no_date = payload(today(), MenuStatus::Draft);
        no_date.date = None;
        let mut no_items = payload(today(), MenuStatus::Draft);
        no_items.menu_items.clear();
        let mut no_price = payload(today(), MenuStatus::Draft);
        no_price.pricing = Some(PricingInput::default());
        let mut no_meal_type = payload(today(), MenuStatus::Draft);
        no_meal_type.meal_type = None;
        let mut blank_name = payload(today(), MenuStatus::Draft);
        blank_name.menu_items[1].name = "   ".into();

        for bad in [no_date, no_items, no_price, no_meal_type, blank_name] {
            let err = MenuService::create(&repo, &bad, None, now).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{err:?}");
        }
        assert!(repo.list(&MenuFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quantities_must_fit_the_store() {
        let repo = MemoryMenuRepository::default();
        let mut huge = payload(today(), MenuStatus::Draft);
        huge.available_quantity = Some(4_000_000_000);
        let err = MenuService::create(&repo, &huge, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        huge.available_quantity = Some(MAX_QUANTITY);
        let menu = MenuService::create(&repo, &huge, None, Utc::now()).await.unwrap();
        assert_eq!(menu.remaining_quantity, MAX_QUANTITY);

        let mut oversold = huge.clone();
        oversold.sold_quantity = Some(MAX_QUANTITY + 1);
        let err = MenuService::update(&repo, menu.id, &oversold, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn status_round_trips_without_restriction() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let menu = MenuService::create(&repo, &payload(today(), MenuStatus::Published), None, now)
            .await
            .unwrap();

        for status in [MenuStatus::Draft, MenuStatus::Archived, MenuStatus::Published] {
            let updated = MenuService::update_status(&repo, menu.id, status, now).await.unwrap();
            assert_eq!(updated.status, status);
        }
        let listed = MenuService::list(&repo, &MenuFilter::default()).await.unwrap();
        assert_eq!(listed[0].status, MenuStatus::Published);

        let missing =
            MenuService::update_status(&repo, Uuid::new_v4(), MenuStatus::Draft, now).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_applies_sold_out_rule_and_guards_quantities() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let menu = MenuService::create(&repo, &payload(today(), MenuStatus::Published), None, now)
            .await
            .unwrap();

        let mut oversold = payload(today(), MenuStatus::Published);
        oversold.sold_quantity = Some(31);
        let err = MenuService::update(&repo, menu.id, &oversold, now).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut sold_out = payload(today(), MenuStatus::Published);
        sold_out.sold_quantity = Some(30);
        let updated = MenuService::update(&repo, menu.id, &sold_out, now).await.unwrap();
        assert_eq!(updated.remaining_quantity, 0);
        assert_eq!(updated.status, MenuStatus::SoldOut);
        assert_eq!(updated.created_at, menu.created_at);
    }

    #[tokio::test]
    async fn deleted_menus_do_not_come_back() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let menu = MenuService::create(&repo, &payload(today(), MenuStatus::Draft), None, now)
            .await
            .unwrap();

        MenuService::delete(&repo, menu.id).await.unwrap();
        let listed = MenuService::list(&repo, &MenuFilter::default()).await.unwrap();
        assert!(listed.iter().all(|m| m.id != menu.id));
        assert!(matches!(
            MenuService::delete(&repo, menu.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_date_first_and_filters_by_status() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let day = today();
        let seeds = [
            (0, MenuStatus::Published),
            (-1, MenuStatus::Draft),
            (1, MenuStatus::Archived),
        ];
        for (offset, status) in seeds {
            MenuService::create(&repo, &payload(day + Duration::days(offset), status), None, now)
                .await
                .unwrap();
        }

        let all = MenuService::list(&repo, &MenuFilter::default()).await.unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![day + Duration::days(1), day, day - Duration::days(1)]);

        let published = MenuFilter {
            status: Some(MenuStatus::Published),
            ..MenuFilter::default()
        };
        let listed = MenuService::list(&repo, &published).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|m| m.status == MenuStatus::Published));
    }

    #[tokio::test]
    async fn todays_meals_only_include_todays_published_items() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let day = today();

        let todays = MenuService::create(&repo, &payload(day, MenuStatus::Published), None, now)
            .await
            .unwrap();
        MenuService::create(&repo, &payload(day, MenuStatus::Draft), None, now).await.unwrap();
        let yesterday = payload(day - Duration::days(1), MenuStatus::Published);
        MenuService::create(&repo, &yesterday, None, now).await.unwrap();
        let tomorrow = payload(day + Duration::days(1), MenuStatus::Published);
        MenuService::create(&repo, &tomorrow, None, now).await.unwrap();

        let meals = MenuService::todays_meals(&repo, day, now).await.unwrap();
        assert_eq!(meals.total_meals, 2);
        assert!(meals.meals.iter().all(|m| m.menu_id == todays.id));
        assert_eq!(meals.meals[0].price, 140.0);
        assert_eq!(meals.meals[0].id, format!("{}-0", todays.id));

        let categories = MenuService::categories(&repo, day).await.unwrap();
        let total: usize = categories.iter().map(|c| c.count).sum();
        assert_eq!(total, meals.total_meals);
    }

    #[tokio::test]
    async fn available_skips_past_and_exhausted_menus() {
        let repo = MemoryMenuRepository::default();
        let now = Utc::now();
        let day = today();

        let later = payload(day + Duration::days(2), MenuStatus::Published);
        let upcoming = MenuService::create(&repo, &later, None, now).await.unwrap();
        let current = MenuService::create(&repo, &payload(day, MenuStatus::Published), None, now)
            .await
            .unwrap();
        let yesterday = payload(day - Duration::days(1), MenuStatus::Published);
        MenuService::create(&repo, &yesterday, None, now).await.unwrap();
        let mut empty = payload(day, MenuStatus::Published);
        empty.available_quantity = Some(0);
        MenuService::create(&repo, &empty, None, now).await.unwrap();

        let available = MenuService::available(&repo, day).await.unwrap();
        let ids: Vec<Uuid> = available.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![current.id, upcoming.id]);
    }
}
