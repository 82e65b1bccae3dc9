mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;
#[cfg(test)]
mod test_support;

use infrastructure::config::AppConfig;
use infrastructure::logging::init_logging;
use server::{AppState, start_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config).await?;

    start_server(&config, state).await
}
