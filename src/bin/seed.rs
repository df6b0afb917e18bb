//! Uploads the package catalog. Pass `--yes` to add it even when packages exist.

use tour_booking_api::{
    config::AppConfig, db::connect_store, error::AppError, services::package_service,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let confirmed = std::env::args().skip(1).any(|arg| arg == "--yes" || arg == "-y");
    let config = AppConfig::from_env()?;
    let store = connect_store(&config).await?;

    match package_service::seed_packages(store.as_ref(), confirmed).await {
        Ok(report) => {
            println!(
                "Seed completed: {} packages added ({} existed before)",
                report.inserted, report.existing
            );
            Ok(())
        }
        Err(AppError::ConfirmationRequired(message)) => {
            println!("{message} Re-run with --yes to add them anyway.");
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(err.to_string())),
    }
}
