use uuid::Uuid;

use super::api::{ApiClient, ClientError};
use crate::{
    forms::{CreateMenuForm, DailyMealsForm},
    models::menu::{DailyMenu, MenuFilter, MenuStatus},
};

/// Admin view over the daily menus.
///
/// Holds the active filter and the last fetched list. Every mutating call refreshes the list
/// afterwards; any failure is kept in `error` until dismissed.
#[derive(Debug)]
pub struct AdminDashboard {
    client: ApiClient,
    filter: MenuFilter,
    menus: Vec<DailyMenu>,
    error: Option<String>,
}

impl AdminDashboard {
    /// `client` must already be signed in as an admin.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            filter: MenuFilter::default(),
            menus: Vec::new(),
            error: None,
        }
    }

    pub fn menus(&self) -> &[DailyMenu] {
        &self.menus
    }

    pub fn filter(&self) -> &MenuFilter {
        &self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn into_client(self) -> ApiClient {
        self.client
    }

    /// Record a failure in the banner and hand it back to the caller.
    fn record<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "dashboard action failed");
            self.error = Some(e.to_string());
        }
        result
    }

    /// Reload the list with the current filter.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let result = self.client.list_menus(&self.filter).await;
        let menus = self.record(result)?;
        self.menus = menus;
        Ok(())
    }

    /// Repeat the last read after a failure.
    pub async fn retry(&mut self) -> Result<(), ClientError> {
        self.dismiss_error();
        self.refresh().await
    }

    pub async fn set_filter(&mut self, filter: MenuFilter) -> Result<(), ClientError> {
        self.filter = filter;
        self.refresh().await
    }

    pub async fn update_status(
        &mut self,
        id: Uuid,
        status: MenuStatus,
    ) -> Result<DailyMenu, ClientError> {
        let result = self.client.update_menu_status(id, status).await;
        let menu = self.record(result)?;
        self.refresh().await?;
        Ok(menu)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
        let result = self.client.delete_menu(id).await;
        self.record(result)?;
        self.refresh().await
    }

    pub async fn create(&mut self, form: &CreateMenuForm) -> Result<DailyMenu, ClientError> {
        let payload = form.build().map_err(ClientError::from);
        let payload = self.record(payload)?;
        let result = self.client.create_menu(&payload).await;
        let menu = self.record(result)?;
        self.refresh().await?;
        Ok(menu)
    }

    pub async fn set_daily_meals(
        &mut self,
        form: &DailyMealsForm,
    ) -> Result<DailyMenu, ClientError> {
        let payload = form.build().map_err(ClientError::from);
        let payload = self.record(payload)?;
        let result = self.client.create_menu(&payload).await;
        let menu = self.record(result)?;
        self.refresh().await?;
        Ok(menu)
    }
}
