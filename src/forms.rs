//! Builders for the two admin menu forms. Both produce a `MenuPayload` for
//! `POST /api/daily-menu`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::menu::{
    ItemPrice, MealType, MenuItem, MenuPayload, MenuStatus, PricingInput, SpecialOffer,
    SpiceLevel,
};

/// Half-meal price as a fraction of the most expensive dish.
pub const HALF_MEAL_RATIO: f64 = 0.7;
pub const DAILY_MEALS_QUANTITY: u32 = 100;
pub const DAILY_MEALS_PREPARATION_MINUTES: u32 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Please add at least one dish")]
    NoDishes,
    #[error("Please choose a date")]
    MissingDate,
}

/// State of the full "Create Menu" form.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateMenuForm {
    pub date: Option<NaiveDate>,
    pub meal_type: MealType,
    pub menu_items: Vec<MenuItem>,
    pub special_offers: Vec<SpecialOffer>,
    pub full_meal: f64,
    pub half_meal: f64,
    pub individual_items: Vec<ItemPrice>,
    pub available_quantity: u32,
    pub chef: String,
    pub preparation_notes: String,
    pub allergens: Vec<String>,
    pub tags: Vec<String>,
    pub status: MenuStatus,
}

impl Default for CreateMenuForm {
    fn default() -> Self {
        Self {
            date: None,
            meal_type: MealType::Lunch,
            menu_items: Vec::new(),
            special_offers: Vec::new(),
            full_meal: 0.0,
            half_meal: 0.0,
            individual_items: Vec::new(),
            available_quantity: 50,
            chef: String::new(),
            preparation_notes: String::new(),
            allergens: Vec::new(),
            tags: Vec::new(),
            status: MenuStatus::Draft,
        }
    }
}

impl CreateMenuForm {
    /// Append a blank item (one empty ingredient line) and return it for editing.
    pub fn add_item(&mut self) -> &mut MenuItem {
        self.menu_items.push(MenuItem::default());
        let last = self.menu_items.len() - 1;
        &mut self.menu_items[last]
    }

    pub fn remove_item(&mut self, index: usize) {
        if index < self.menu_items.len() {
            self.menu_items.remove(index);
        }
    }

    /// Append an ingredient line to item `index`. Returns false for an unknown item.
    pub fn add_ingredient(&mut self, index: usize, ingredient: impl Into<String>) -> bool {
        match self.menu_items.get_mut(index) {
            Some(item) => {
                item.ingredients.push(ingredient.into());
                true
            }
            None => false,
        }
    }

    pub fn toggle_allergen(&mut self, allergen: &str) {
        if let Some(pos) = self.allergens.iter().position(|a| a == allergen) {
            self.allergens.remove(pos);
        } else {
            self.allergens.push(allergen.to_string());
        }
    }

    /// Payload as submitted: blank ingredient lines and blank tags are dropped.
    pub fn build(&self) -> Result<MenuPayload, FormError> {
        let date = self.date.ok_or(FormError::MissingDate)?;
        let menu_items = self
            .menu_items
            .iter()
            .map(|item| MenuItem {
                ingredients: item
                    .ingredients
                    .iter()
                    .filter(|i| !i.trim().is_empty())
                    .cloned()
                    .collect(),
                ..item.clone()
            })
            .collect();

        Ok(MenuPayload {
            date: Some(date),
            meal_type: Some(self.meal_type),
            menu_items,
            special_offers: self.special_offers.clone(),
            pricing: Some(PricingInput {
                full_meal: Some(self.full_meal),
                half_meal: Some(self.half_meal),
                individual_items: self.individual_items.clone(),
            }),
            available_quantity: Some(self.available_quantity),
            sold_quantity: None,
            status: Some(self.status),
            chef: Some(self.chef.clone()),
            preparation_notes: Some(self.preparation_notes.clone()),
            allergens: self.allergens.clone(),
            tags: self
                .tags
                .iter()
                .filter(|t| !t.trim().is_empty())
                .cloned()
                .collect(),
            auto_delete_at: None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DishCategory {
    #[default]
    Basic,
    Premium,
    Special,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DishItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub title: String,
    pub cost: f64,
    #[serde(default)]
    pub category: DishCategory,
    #[serde(default)]
    pub items: Vec<DishItem>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// State of the simplified "Set Daily Meals" form: dishes for a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMealsForm {
    pub date: NaiveDate,
    pub dishes: Vec<Dish>,
}

impl DailyMealsForm {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            dishes: Vec::new(),
        }
    }

    pub fn add_dish(&mut self, title: impl Into<String>, cost: f64) -> &mut Dish {
        self.dishes.push(Dish {
            title: title.into(),
            cost,
            items: vec![DishItem::default()],
            ..Dish::default()
        });
        let last = self.dishes.len() - 1;
        &mut self.dishes[last]
    }

    pub fn remove_dish(&mut self, index: usize) {
        if index < self.dishes.len() {
            self.dishes.remove(index);
        }
    }

    /// Translate the dishes into a published all-day menu.
    ///
    /// `fullMeal` is the most expensive dish and `halfMeal` is 70% of it; every dish is also
    /// priced individually at its own cost.
    pub fn build(&self) -> Result<MenuPayload, FormError> {
        if self.dishes.is_empty() {
            return Err(FormError::NoDishes);
        }

        let max_cost = self
            .dishes
            .iter()
            .map(|d| d.cost)
            .fold(f64::NEG_INFINITY, f64::max);

        let menu_items = self
            .dishes
            .iter()
            .map(|dish| MenuItem {
                name: dish.title.clone(),
                category: "main_course".to_string(),
                description: dish.description.clone(),
                ingredients: dish
                    .items
                    .iter()
                    .map(|i| i.name.clone())
                    .filter(|n| !n.trim().is_empty())
                    .collect(),
                spice_level: SpiceLevel::Medium,
                is_vegan: false,
                is_vegetarian: true,
                preparation_time: DAILY_MEALS_PREPARATION_MINUTES,
            })
            .collect();

        Ok(MenuPayload {
            date: Some(self.date),
            meal_type: Some(MealType::AllDay),
            menu_items,
            special_offers: Vec::new(),
            pricing: Some(PricingInput {
                full_meal: Some(max_cost),
                half_meal: Some(max_cost * HALF_MEAL_RATIO),
                individual_items: self
                    .dishes
                    .iter()
                    .map(|d| ItemPrice {
                        item_name: d.title.clone(),
                        price: d.cost,
                    })
                    .collect(),
            }),
            available_quantity: Some(DAILY_MEALS_QUANTITY),
            sold_quantity: None,
            status: Some(MenuStatus::Published),
            chef: Some("Kitchen Staff".to_string()),
            preparation_notes: Some(format!("Meal added for {}", self.date)),
            allergens: Vec::new(),
            tags: vec!["daily-special".to_string(), "fresh".to_string()],
            auto_delete_at: Some(day_after_utc(self.date)),
        })
    }
}

/// 00:00 UTC of the day after `date`.
fn day_after_utc(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt()
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn daily_meals_price_from_the_most_expensive_dish() {
        let mut form = DailyMealsForm::new(date());
        form.add_dish("Special thali", 100.0);
        form.add_dish("Mini thali", 80.0);
        form.add_dish("Khichdi bowl", 60.0);

        let payload = form.build().unwrap();
        let pricing = payload.pricing.unwrap();
        assert_eq!(pricing.full_meal, Some(100.0));
        assert!((pricing.half_meal.unwrap() - 70.0).abs() < 1e-9);
        assert_eq!(pricing.individual_items.len(), 3);
        assert_eq!(pricing.individual_items[1].price, 80.0);
    }

    #[test]
    fn daily_meals_fixed_fields() {
        let mut form = DailyMealsForm::new(date());
        let dish = form.add_dish("Rajma chawal", 120.0);
        dish.description = "Kidney beans with rice".into();
        dish.items = vec![
            DishItem {
                name: "Rajma".into(),
                description: None,
            },
            DishItem {
                name: "  ".into(),
                description: None,
            },
            DishItem {
                name: "Rice".into(),
                description: Some("Basmati".into()),
            },
        ];

        let payload = form.build().unwrap();
        assert_eq!(payload.meal_type, Some(MealType::AllDay));
        assert_eq!(payload.status, Some(MenuStatus::Published));
        assert_eq!(payload.available_quantity, Some(100));
        assert_eq!(payload.chef.as_deref(), Some("Kitchen Staff"));
        assert_eq!(payload.preparation_notes.as_deref(), Some("Meal added for 2026-10-19"));
        assert_eq!(payload.tags, vec!["daily-special", "fresh"]);
        assert_eq!(
            payload.auto_delete_at.unwrap().to_rfc3339(),
            "2026-10-20T00:00:00+00:00"
        );

        let item = &payload.menu_items[0];
        assert_eq!(item.name, "Rajma chawal");
        assert_eq!(item.category, "main_course");
        assert_eq!(item.ingredients, vec!["Rajma", "Rice"]);
        assert!(item.is_vegetarian && !item.is_vegan);
        assert_eq!(item.spice_level, SpiceLevel::Medium);
        assert_eq!(item.preparation_time, 30);
    }

    #[test]
    fn daily_meals_need_a_dish() {
        let mut form = DailyMealsForm::new(date());
        assert_eq!(form.build(), Err(FormError::NoDishes));
        form.add_dish("Poha", 40.0);
        form.remove_dish(0);
        assert_eq!(form.build().unwrap_err().to_string(), "Please add at least one dish");
    }

    #[test]
    fn create_form_drops_blank_lines() {
        let mut form = CreateMenuForm {
            date: Some(date()),
            full_meal: 150.0,
            tags: vec!["homestyle".into(), " ".into()],
            ..CreateMenuForm::default()
        };
        let item = form.add_item();
        item.name = "Aloo paratha".into();
        assert!(form.add_ingredient(0, "potato"));
        assert!(!form.add_ingredient(3, "ghee"));
        form.toggle_allergen("gluten");
        form.toggle_allergen("dairy");
        form.toggle_allergen("dairy");

        let payload = form.build().unwrap();
        assert_eq!(payload.meal_type, Some(MealType::Lunch));
        assert_eq!(payload.status, Some(MenuStatus::Draft));
        assert_eq!(payload.available_quantity, Some(50));
        assert_eq!(payload.menu_items[0].ingredients, vec!["potato"]);
        assert_eq!(payload.tags, vec!["homestyle"]);
        assert_eq!(payload.allergens, vec!["gluten"]);
    }

    #[test]
    fn create_form_requires_a_date() {
        assert_eq!(CreateMenuForm::default().build(), Err(FormError::MissingDate));
    }
}
