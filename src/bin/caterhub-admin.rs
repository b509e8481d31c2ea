/// Command-line admin dashboard.
///
/// Signs in with the given admin credentials on every run (tokens are never stored), then
/// performs one dashboard action against the API at `--api-url` / `API_URL`.
///
/// Examples:
///   caterhub-admin list --status published
///   caterhub-admin daily-meals --dish "Special thali:100:Dal,Rice,Roti" --dish "Poha:60"
///   caterhub-admin set-status <menu-id> archived
///
/// Logging is quiet by default; set RUST_LOG=info to see the sign-in and request logs.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use caterhub_api::{
    client::{AdminDashboard, ApiClient},
    forms::{DailyMealsForm, DishItem},
    models::menu::{DailyMenu, MealType, MenuFilter, MenuStatus},
};

#[derive(Parser)]
#[command(name = "caterhub-admin", about = "Manage daily menus from the terminal")]
struct Args {
    #[arg(long, env = "API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Admin email or username
    #[arg(long, env = "CATERHUB_ADMIN")]
    identifier: String,

    #[arg(long, env = "CATERHUB_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List menus, newest date first
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        meal_type: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Overwrite a menu's status (draft, published, sold_out, archived)
    SetStatus { id: Uuid, status: String },
    /// Delete a menu permanently
    Delete { id: Uuid },
    /// Publish today's dishes; each --dish is "title:cost[:item,item,...]"
    DailyMeals {
        #[arg(long = "dish", required = true)]
        dishes: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Parse "title:cost[:item,item]" into a dish on `form`.
fn add_dish(form: &mut DailyMealsForm, raw: &str) -> anyhow::Result<()> {
    let mut parts = raw.splitn(3, ':');
    let title = parts.next().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        anyhow::bail!("dish \"{raw}\" has no title");
    }
    let cost: f64 = parts
        .next()
        .map(str::trim)
        .with_context(|| format!("dish \"{raw}\" has no cost"))?
        .parse()
        .with_context(|| format!("dish \"{raw}\" has an invalid cost"))?;
    let items: Vec<DishItem> = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| DishItem {
            name: name.to_string(),
            description: None,
        })
        .collect();

    let dish = form.add_dish(title, cost);
    dish.items = items;
    Ok(())
}

fn print_menus(menus: &[DailyMenu]) {
    if menus.is_empty() {
        println!("No menus found");
        return;
    }
    for m in menus {
        let dishes: Vec<&str> = m.menu_items.iter().map(|i| i.name.as_str()).collect();
        println!(
            "{}  {}  {:<9} {:<9}  {:>3}/{:<3} left  {:>8.2}  {}",
            m.id,
            m.date,
            m.meal_type,
            m.status,
            m.remaining_quantity,
            m.available_quantity,
            m.pricing.full_meal,
            dishes.join(", ")
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();

    let mut client = ApiClient::new(&args.api_url);
    let me = client.login(&args.identifier, &args.password).await?;
    tracing::info!(user = %me.username, "signed in");
    let mut dashboard = AdminDashboard::new(client);

    match args.command {
        Command::List {
            date,
            meal_type,
            status,
        } => {
            let filter = MenuFilter {
                date,
                meal_type: meal_type.as_deref().map(str::parse::<MealType>).transpose()?,
                status: status.as_deref().map(str::parse::<MenuStatus>).transpose()?,
            };
            dashboard.set_filter(filter).await?;
            print_menus(dashboard.menus());
        }
        Command::SetStatus { id, status } => {
            let menu = dashboard.update_status(id, status.parse()?).await?;
            println!("{} is now {}", menu.id, menu.status);
        }
        Command::Delete { id } => {
            dashboard.delete(id).await?;
            println!("Deleted {id}");
        }
        Command::DailyMeals { dishes, date } => {
            let mut form = DailyMealsForm::new(date.unwrap_or_else(|| Local::now().date_naive()));
            for raw in &dishes {
                add_dish(&mut form, raw)?;
            }
            let menu = dashboard.set_daily_meals(&form).await?;
            println!(
                "Published {} dish(es) for {} as {} (full {:.2}, half {:.2})",
                menu.menu_items.len(),
                menu.date,
                menu.id,
                menu.pricing.full_meal,
                menu.pricing.half_meal.unwrap_or_default()
            );
        }
    }

    Ok(())
}
