use anyhow::Context;
use tour_booking_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    let pool = create_pool(url).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
