/// Retire past-dated menus once and exit.
/// Run from an external scheduler when the API's built-in midnight sweep is disabled
/// (e.g. cron: 5 0 * * * /app/sweep-menus --mode archive)
///
/// Usage: sweep-menus [--mode archive|delete] [--before YYYY-MM-DD]

use chrono::{Local, NaiveDate, Utc};
use clap::Parser;

use caterhub_api::{db::Stores, services::sweep};

#[derive(Parser)]
#[command(name = "sweep-menus", about = "Archive or delete menus dated before today")]
struct Args {
    /// archive (keep, but hide from public pages) or delete
    #[arg(long, default_value = "archive")]
    mode: String,

    /// Cut-off date; defaults to today's local date
    #[arg(long)]
    before: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let mode: sweep::SweepMode = args.mode.parse()?;
    let cutoff = args.before.unwrap_or_else(|| Local::now().date_naive());

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let stores = Stores::connect(&database_url).await?;

    tracing::info!("Starting menu sweep ({mode}) for menus before {cutoff}...");
    let count = sweep::run_once(stores.menus.as_ref(), mode, cutoff, Utc::now()).await?;
    tracing::info!("Menu sweep completed: {count} menu(s) affected");

    Ok(())
}
