mod common;

use chrono::Duration;
use uuid::Uuid;

use caterhub_api::{
    app,
    client::{AdminDashboard, ApiClient, ClientError},
    forms::{CreateMenuForm, DailyMealsForm, DishItem, FormError},
    models::{
        menu::{MenuFilter, MenuItem, MenuStatus},
        user::{RegisterRequest, UserRole},
    },
    services::menu::today,
};
use common::{test_state, ADMIN_EMAIL, PASSWORD};

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(test_state())).await.unwrap();
    });
    format!("http://{addr}")
}

fn registration(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.into(),
        first_name: "Meera".into(),
        last_name: "Iyer".into(),
        email: email.into(),
        password: PASSWORD.into(),
        phone: None,
    }
}

async fn admin_client(base_url: &str) -> ApiClient {
    let mut client = ApiClient::new(base_url);
    let me = client
        .register(&registration("owner", ADMIN_EMAIL))
        .await
        .unwrap();
    assert_eq!(me.role, UserRole::Admin);
    client
}

#[tokio::test]
async fn login_keeps_the_token_in_memory_only() {
    let base = spawn_server().await;
    let mut client = ApiClient::new(&base);
    client
        .register(&registration("diner", "diner@example.com"))
        .await
        .unwrap();
    assert!(client.is_authenticated());

    let mut fresh = ApiClient::new(&base);
    assert!(!fresh.is_authenticated());
    let me = fresh.login("diner@example.com", PASSWORD).await.unwrap();
    assert_eq!(me.username, "diner");
    assert_eq!(me.role, UserRole::Customer);

    fresh.logout();
    let err = fresh.profile().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let err = ApiClient::new(&base)
        .login("diner", "not-the-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }));
}

#[tokio::test]
async fn dashboard_refreshes_after_each_change() {
    let base = spawn_server().await;
    let mut dashboard = AdminDashboard::new(admin_client(&base).await);

    let mut form = CreateMenuForm::default();
    form.date = Some(today());
    form.full_meal = 150.0;
    form.menu_items = vec![MenuItem {
        name: "Paneer butter masala".into(),
        ..MenuItem::default()
    }];
    let created = dashboard.create(&form).await.unwrap();
    assert_eq!(created.status, MenuStatus::Draft);
    assert_eq!(dashboard.menus().len(), 1);

    let published = dashboard
        .update_status(created.id, MenuStatus::Published)
        .await
        .unwrap();
    assert_eq!(published.status, MenuStatus::Published);
    assert_eq!(dashboard.menus()[0].status, MenuStatus::Published);

    dashboard
        .set_filter(MenuFilter {
            status: Some(MenuStatus::Draft),
            ..MenuFilter::default()
        })
        .await
        .unwrap();
    assert!(dashboard.menus().is_empty());

    dashboard.set_filter(MenuFilter::default()).await.unwrap();
    dashboard.delete(created.id).await.unwrap();
    assert!(dashboard.menus().is_empty());
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn failures_land_in_the_error_banner() {
    let base = spawn_server().await;
    let mut dashboard = AdminDashboard::new(admin_client(&base).await);

    let err = dashboard.delete(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(dashboard.error(), Some("Menu not found"));

    dashboard.retry().await.unwrap();
    assert!(dashboard.error().is_none());

    let empty = DailyMealsForm::new(today());
    let err = dashboard.set_daily_meals(&empty).await.unwrap_err();
    assert!(matches!(err, ClientError::Form(FormError::NoDishes)));
    assert_eq!(dashboard.error(), Some("Please add at least one dish"));
    dashboard.dismiss_error();
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn daily_meals_show_up_on_the_public_page() {
    let base = spawn_server().await;
    let mut dashboard = AdminDashboard::new(admin_client(&base).await);

    let mut form = DailyMealsForm::new(today());
    let thali = form.add_dish("Special thali", 100.0);
    thali.items = vec![
        DishItem {
            name: "Dal".into(),
            description: None,
        },
        DishItem {
            name: "Rice".into(),
            description: None,
        },
    ];
    form.add_dish("Poha", 60.0);
    let menu = dashboard.set_daily_meals(&form).await.unwrap();
    assert_eq!(menu.status, MenuStatus::Published);
    assert_eq!(menu.pricing.full_meal, 100.0);
    assert_eq!(menu.pricing.half_meal, Some(70.0));

    // Tomorrow's menu stays off today's page.
    let tomorrow = DailyMealsForm {
        date: today() + Duration::days(1),
        ..form.clone()
    };
    dashboard.set_daily_meals(&tomorrow).await.unwrap();
    assert_eq!(dashboard.menus().len(), 2);

    let public = ApiClient::new(&base);
    let meals = public.todays_meals().await.unwrap();
    assert_eq!(meals.date, today());
    assert_eq!(meals.total_meals, 2);
    let titles: Vec<&str> = meals.meals.iter().map(|m| m.title.as_str()).collect();
    assert!(titles.contains(&"Special thali"));
    assert!(titles.contains(&"Poha"));

    let categories = public.meal_categories().await.unwrap();
    let total: usize = categories.iter().map(|c| c.count).sum();
    assert_eq!(total, meals.total_meals);

    let available = dashboard.client().available_menus().await.unwrap();
    assert_eq!(available.len(), 2);
    assert_eq!(available[0].date, today());
}
