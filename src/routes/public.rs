use axum::extract::State;
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        envelope::Envelope,
        menu::{CategoryCount, TodaysMeals},
    },
    services::menu::{today, MenuService},
    AppState,
};

/// GET /api/public/today-meals (no authentication)
pub async fn today_meals(State(state): State<AppState>) -> Result<Envelope<TodaysMeals>, AppError> {
    let meals = MenuService::todays_meals(state.menus.as_ref(), today(), Utc::now()).await?;
    Ok(Envelope::data(meals))
}

/// GET /api/public/meal-categories (no authentication)
pub async fn meal_categories(
    State(state): State<AppState>,
) -> Result<Envelope<Vec<CategoryCount>>, AppError> {
    let categories = MenuService::categories(state.menus.as_ref(), today()).await?;
    Ok(Envelope::list(categories))
}
