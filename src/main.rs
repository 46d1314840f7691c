use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use report_core::config::font_size_bounds_from_env_values;
use report_core::constants::DEFAULT_REPORT_DATA_DIR;
use report_core::{CoreConfig, ReportService};

/// Main entry point for the report engine service
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`) on port 3000 by default.
///
/// # Environment Variables
/// - `REPORT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `REPORT_DATA_DIR`: Directory for template and result storage (default: "report_data")
/// - `REPORT_FONT_SIZE_MIN` / `REPORT_FONT_SIZE_MAX`: Editor font-size bounds in px
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("report_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("REPORT_DATA_DIR").unwrap_or_else(|_| DEFAULT_REPORT_DATA_DIR.into());
    let font_sizes = font_size_bounds_from_env_values(
        std::env::var("REPORT_FONT_SIZE_MIN").ok(),
        std::env::var("REPORT_FONT_SIZE_MAX").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir), font_sizes)?);

    tracing::info!("++ Report data directory: {}", cfg.data_dir().display());
    tracing::info!("++ Starting report REST on {}", rest_addr);

    let app = api_rest::router(AppState {
        service: ReportService::with_fs_store(cfg),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
