use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    AllDay,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::AllDay => "all_day",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "all_day" => Ok(MealType::AllDay),
            _ => Err(anyhow::anyhow!("Unknown meal type: {s}")),
        }
    }
}

/// Status label of a menu. Any value may be set from any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MenuStatus {
    Draft,
    Published,
    SoldOut,
    Archived,
}

impl MenuStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuStatus::Draft => "draft",
            MenuStatus::Published => "published",
            MenuStatus::SoldOut => "sold_out",
            MenuStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for MenuStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MenuStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(MenuStatus::Draft),
            "published" => Ok(MenuStatus::Published),
            "sold_out" => Ok(MenuStatus::SoldOut),
            "archived" => Ok(MenuStatus::Archived),
            _ => Err(anyhow::anyhow!("Unknown menu status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    #[default]
    Medium,
    Hot,
    VeryHot,
}

/// Categories offered by the admin menu form. The field itself is free text.
pub const MENU_ITEM_CATEGORIES: &[&str] = &[
    "main_course",
    "bread",
    "vegetable",
    "salad",
    "rice",
    "dal",
    "dessert",
    "beverage",
    "snack",
    "other",
];

pub const ALLERGEN_OPTIONS: &[&str] = &[
    "nuts", "dairy", "gluten", "soy", "eggs", "shellfish", "fish", "sesame",
];

fn default_category() -> String {
    "main_course".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub spice_level: SpiceLevel,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
    /// Minutes.
    #[serde(default)]
    pub preparation_time: u32,
}

impl Default for MenuItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: default_category(),
            description: String::new(),
            ingredients: vec![String::new()],
            spice_level: SpiceLevel::Medium,
            is_vegan: false,
            is_vegetarian: true,
            preparation_time: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialOffer {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemPrice {
    pub item_name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub full_meal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_meal: Option<f64>,
    #[serde(default)]
    pub individual_items: Vec<ItemPrice>,
}

impl Pricing {
    /// Price of a single item: its `individualItems` entry if one matches, else the full meal.
    pub fn price_of(&self, item_name: &str) -> f64 {
        self.individual_items
            .iter()
            .find(|p| p.item_name == item_name)
            .map(|p| p.price)
            .unwrap_or(self.full_meal)
    }
}

/// Pricing as submitted; `fullMeal` is checked for presence by the menu service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_meal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_meal: Option<f64>,
    #[serde(default)]
    pub individual_items: Vec<ItemPrice>,
}

/// Display reference to the admin who created a menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBy {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyMenu {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub special_offers: Vec<SpecialOffer>,
    pub pricing: Pricing,
    pub available_quantity: u32,
    pub sold_quantity: u32,
    pub remaining_quantity: u32,
    pub status: MenuStatus,
    pub chef: Option<String>,
    pub preparation_notes: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: Option<CreatedBy>,
    pub auto_delete_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyMenu {
    /// Recompute `remainingQuantity`; a published menu with nothing left becomes sold out.
    pub fn refresh_inventory(&mut self) {
        self.remaining_quantity = self.available_quantity.saturating_sub(self.sold_quantity);
        if self.remaining_quantity == 0 && self.status == MenuStatus::Published {
            self.status = MenuStatus::SoldOut;
        }
    }
}

/// Body for POST /api/daily-menu and PUT /api/daily-menu/{id}.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub special_offers: Vec<SpecialOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
    /// Only honoured on update; creation always starts at zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MenuStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_notes: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete_at: Option<DateTime<Utc>>,
}

/// Query params for GET /api/daily-menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuFilter {
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub meal_type: Option<MealType>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<MenuStatus>,
}

/// `?date=&status=` means "no filter" rather than a parse error.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

impl MenuFilter {
    pub fn matches(&self, menu: &DailyMenu) -> bool {
        self.date.map_or(true, |d| menu.date == d)
            && self.meal_type.map_or(true, |m| menu.meal_type == m)
            && self.status.map_or(true, |s| menu.status == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: MenuStatus,
}

/// One dish of a published menu as shown on the public meals page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayMeal {
    pub id: String,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub ingredients: Vec<String>,
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub spice_level: SpiceLevel,
    pub preparation_time: u32,
    pub allergens: Vec<String>,
    pub tags: Vec<String>,
    pub available_until: DateTime<Utc>,
    pub meal_type: MealType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaysMeals {
    pub meals: Vec<TodayMeal>,
    pub date: NaiveDate,
    pub total_meals: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}
