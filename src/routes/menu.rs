use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        auth::{AdminUser, AuthenticatedUser},
        envelope::Envelope,
        menu::{CreatedBy, DailyMenu, MenuFilter, MenuPayload, UpdateStatusRequest},
    },
    services::menu::{today, MenuService},
    AppState,
};

/// GET /api/daily-menu?date=&mealType=&status= (admins only)
pub async fn list_menus(
    State(state): State<AppState>,
    _admin: AdminUser,
    filter: Result<Query<MenuFilter>, QueryRejection>,
) -> Result<Envelope<Vec<DailyMenu>>, AppError> {
    let Query(filter) = filter?;
    let menus = MenuService::list(state.menus.as_ref(), &filter).await?;
    Ok(Envelope::list(menus))
}

/// GET /api/daily-menu/available (any signed-in user)
pub async fn available_menus(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Envelope<Vec<DailyMenu>>, AppError> {
    let menus = MenuService::available(state.menus.as_ref(), today()).await?;
    Ok(Envelope::list(menus))
}

/// GET /api/daily-menu/{id}
pub async fn get_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<DailyMenu>, AppError> {
    let Path(id) = id?;
    let menu = MenuService::get(state.menus.as_ref(), id).await?;
    Ok(Envelope::data(menu))
}

/// POST /api/daily-menu
pub async fn create_menu(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Result<Json<MenuPayload>, JsonRejection>,
) -> Result<(StatusCode, Envelope<DailyMenu>), AppError> {
    let Json(body) = body?;
    let created_by = state
        .users
        .find_by_id(admin.user_id)
        .await?
        .map(|u| CreatedBy {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
        });

    let menu = MenuService::create(state.menus.as_ref(), &body, created_by, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_message("Menu created successfully", menu),
    ))
}

/// PUT /api/daily-menu/{id}
pub async fn update_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MenuPayload>, JsonRejection>,
) -> Result<Envelope<DailyMenu>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let menu = MenuService::update(state.menus.as_ref(), id, &body, Utc::now()).await?;
    Ok(Envelope::with_message("Menu updated successfully", menu))
}

/// PATCH /api/daily-menu/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Envelope<DailyMenu>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let menu = MenuService::update_status(state.menus.as_ref(), id, body.status, Utc::now()).await?;
    Ok(Envelope::with_message("Menu status updated", menu))
}

/// DELETE /api/daily-menu/{id}
pub async fn delete_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<()>, AppError> {
    let Path(id) = id?;
    MenuService::delete(state.menus.as_ref(), id).await?;
    Ok(Envelope::message("Menu deleted successfully"))
}
