use anyhow::Result;
use dotenv::dotenv;
use tokio::net::TcpListener;

use api::config::AppConfig;
use api::state::AppState;
use api::{observability, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = AppConfig::from_env()?;
    observability::init(config.log_format)?;

    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set, falling back to the development secret");
    }

    let state = AppState::new(&config);
    let app = routes::build_router(&state)?;

    tracing::info!("API server listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
