use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        envelope::Envelope,
        user::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest},
    },
    services::auth::AuthService,
    AppState,
};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Envelope<AuthResponse>), AppError> {
    let Json(body) = body?;
    let res = AuthService::register(state.users.as_ref(), &state.config, &body).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_message("User registered successfully", res),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Envelope<AuthResponse>, AppError> {
    let Json(body) = body?;
    let res = AuthService::login(state.users.as_ref(), &state.config, &body).await?;
    tracing::info!(user_id = %res.user.id, "user logged in");
    Ok(Envelope::with_message("Login successful", res))
}

/// GET /api/auth/me and GET /api/auth/profile
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Envelope<ProfileResponse>, AppError> {
    let profile = AuthService::profile(state.users.as_ref(), user.user_id).await?;
    Ok(Envelope::data(ProfileResponse { user: profile }))
}

/// POST /api/auth/logout: tokens are stateless; the client forgets its copy.
pub async fn logout(user: AuthenticatedUser) -> Envelope<()> {
    tracing::info!(user_id = %user.user_id, "user logged out");
    Envelope::message("Logged out successfully")
}
