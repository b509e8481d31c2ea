use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    forms::FormError,
    models::{
        envelope::Envelope,
        menu::{
            CategoryCount, DailyMenu, MenuFilter, MenuPayload, MenuStatus, TodaysMeals,
            UpdateStatusRequest,
        },
        user::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UserProfile},
    },
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response carried no data")]
    MissingData,

    #[error("{0}")]
    Form(#[from] FormError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Typed client for the REST API. The bearer token lives only in this value, so every new
/// client starts signed out.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Attach the token, send, and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Envelope<T>, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let response = req.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) if status.is_success() && envelope.success => Ok(envelope),
            Ok(envelope) => Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| status.to_string()),
            }),
            Err(e) if status.is_success() => Err(ClientError::Decode(e)),
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        self.send(req).await?.data.ok_or(ClientError::MissingData)
    }

    // Auth

    /// Register, keep the issued token, then load the profile it belongs to.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<UserProfile, ClientError> {
        let auth: AuthResponse = self
            .fetch(self.http.post(self.url("/auth/register")).json(req))
            .await?;
        self.token = Some(auth.token);
        self.profile().await
    }

    pub async fn login(
        &mut self,
        identifier: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let req = LoginRequest {
            identifier: Some(identifier.to_string()),
            email: None,
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .fetch(self.http.post(self.url("/auth/login")).json(&req))
            .await?;
        self.token = Some(auth.token);
        self.profile().await
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let res: ProfileResponse = self.fetch(self.http.get(self.url("/auth/profile"))).await?;
        Ok(res.user)
    }

    // Daily menus

    pub async fn list_menus(&self, filter: &MenuFilter) -> Result<Vec<DailyMenu>, ClientError> {
        self.fetch(self.http.get(self.url("/daily-menu")).query(filter))
            .await
    }

    pub async fn get_menu(&self, id: Uuid) -> Result<DailyMenu, ClientError> {
        self.fetch(self.http.get(self.url(&format!("/daily-menu/{id}"))))
            .await
    }

    pub async fn create_menu(&self, payload: &MenuPayload) -> Result<DailyMenu, ClientError> {
        self.fetch(self.http.post(self.url("/daily-menu")).json(payload))
            .await
    }

    pub async fn update_menu(
        &self,
        id: Uuid,
        payload: &MenuPayload,
    ) -> Result<DailyMenu, ClientError> {
        self.fetch(
            self.http
                .put(self.url(&format!("/daily-menu/{id}")))
                .json(payload),
        )
        .await
    }

    pub async fn update_menu_status(
        &self,
        id: Uuid,
        status: MenuStatus,
    ) -> Result<DailyMenu, ClientError> {
        let body = UpdateStatusRequest { status };
        self.fetch(
            self.http
                .patch(self.url(&format!("/daily-menu/{id}/status")))
                .json(&body),
        )
        .await
    }

    pub async fn delete_menu(&self, id: Uuid) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(self.http.delete(self.url(&format!("/daily-menu/{id}"))))
            .await?;
        Ok(())
    }

    pub async fn available_menus(&self) -> Result<Vec<DailyMenu>, ClientError> {
        self.fetch(self.http.get(self.url("/daily-menu/available")))
            .await
    }

    // Public meals

    pub async fn todays_meals(&self) -> Result<TodaysMeals, ClientError> {
        self.fetch(self.http.get(self.url("/public/today-meals")))
            .await
    }

    pub async fn meal_categories(&self) -> Result<Vec<CategoryCount>, ClientError> {
        self.fetch(self.http.get(self.url("/public/meal-categories")))
            .await
    }
}
