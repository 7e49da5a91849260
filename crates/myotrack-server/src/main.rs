//! Myotrack Server - Main entry point

use anyhow::Result;
use myotrack_common::logging::{init_logging, LogConfig};
use tracing::info;

use myotrack_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::default()
        .with_file_prefix("myotrack-server")
        .with_filter("tower_http=info,sqlx=warn")
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    info!("Starting Myotrack Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    api::serve(config).await
}
