use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

use crate::{
    config::Config,
    db::UserRepository,
    error::AppError,
    models::{
        auth::Claims,
        user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile, UserRole},
    },
};

const MIN_PASSWORD_LEN: usize = 6;

pub struct AuthService;

impl AuthService {
    /// Create a customer account (admin when the email is listed in `ADMIN_EMAILS`) and sign it in.
    pub async fn register(
        users: &dyn UserRepository,
        config: &Config,
        req: &RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        let email = req.email.trim().to_lowercase();
        let username = req.username.trim().to_string();
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();

        if username.is_empty() || first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::Validation(
                "Username, first name and last name are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".into()));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if users.exists(&email, &username).await? {
            return Err(taken());
        }

        let role = if config.is_admin_email(&email) {
            UserRole::Admin
        } else {
            UserRole::Customer
        };
        let password_hash = bcrypt::hash(&req.password, config.bcrypt_cost)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;

        let user = User {
            id: Uuid::new_v4(),
            username,
            first_name,
            last_name,
            email,
            phone: req
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
            password_hash,
            role: role.to_string(),
            created_at: Utc::now(),
        };
        // A concurrent registration can claim the email between `exists` and here.
        if !users.insert(&user).await? {
            return Err(taken());
        }
        tracing::info!(user_id = %user.id, role = %role, "user registered");

        let token = Self::generate_access_token(
            &user,
            role,
            &config.jwt_secret,
            config.jwt_expiry_seconds,
        )?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn login(
        users: &dyn UserRepository,
        config: &Config,
        req: &LoginRequest,
    ) -> Result<AuthResponse, AppError> {
        let identifier = req
            .identifier
            .as_deref()
            .or(req.email.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("Email or username is required".into()))?;
        if req.password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }

        let user = users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

        let valid = bcrypt::verify(&req.password, &user.password_hash)
            .map_err(|_| AppError::Unauthorized("Invalid credentials".into()))?;
        if !valid {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        let token = Self::generate_access_token(
            &user,
            user.role(),
            &config.jwt_secret,
            config.jwt_expiry_seconds,
        )?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn profile(
        users: &dyn UserRepository,
        user_id: Uuid,
    ) -> Result<UserProfile, AppError> {
        users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub fn generate_access_token(
        user: &User,
        role: UserRole,
        secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            role,
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }
}

fn taken() -> AppError {
    AppError::Validation("User with this email or username already exists".into())
}
