use axum::extract::State;

use crate::{
    error::AppError,
    models::{
        auth::{AdminUser, AuthenticatedUser},
        envelope::Envelope,
        user::ProfileResponse,
    },
    services::auth::AuthService,
    AppState,
};

/// GET /api/users/profile (any signed-in user)
pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Envelope<ProfileResponse>, AppError> {
    let profile = AuthService::profile(state.users.as_ref(), user.user_id).await?;
    Ok(Envelope::with_message(
        "User profile access",
        ProfileResponse { user: profile },
    ))
}

/// GET /api/users/admin (admins only)
pub async fn admin_check(AdminUser(_admin): AdminUser) -> Envelope<()> {
    Envelope::message("Admin access granted")
}
