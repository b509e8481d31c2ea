use std::env;

use crate::services::sweep::SweepMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string, or `memory://` for the in-process store.
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    /// Registrations with one of these emails receive the admin role.
    pub admin_emails: Vec<String>,
    pub sweep_mode: SweepMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "604800".into())
                .parse()?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            admin_emails: parse_list(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            sweep_mode: env::var("MENU_SWEEP_MODE")
                .unwrap_or_else(|_| "archive".into())
                .parse()?,
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
