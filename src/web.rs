#![cfg(not(tarpaulin_include))]

use personnel_dashboard::app;
use personnel_dashboard::config::AppConfig;

/// Main entry point for the dashboard web server
///
/// Reads the configuration from `DASHBOARD_*` environment variables and
/// serves the dashboard until the process is stopped. `RUST_LOG` controls
/// log output and defaults to `info`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    log::info!(
        "Serving sheet '{}' from {} (division filter: {:?})",
        config.sheet,
        config.endpoint,
        config.division_filter
    );

    app::run(config).await
}
