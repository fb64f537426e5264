use tokio_util::sync::CancellationToken;

use catalog_server::{init_logging, run, sdk_key_from_env, shutdown_signal, LOG_CONFIG_FILE};
use catalog_utils::config;

#[tokio::main]
async fn main() {
    init_logging(LOG_CONFIG_FILE);
    log::info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // load the configuration
    let config = config::load();
    let sdk_key = sdk_key_from_env();

    // hook for graceful shutdown
    let server_shutdown = CancellationToken::new();
    let server_shutdown_cloned = server_shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Initializing the graceful shutdown process...");
        server_shutdown_cloned.cancel();
    });

    run(config, sdk_key, server_shutdown).await;
    log::info!("Item catalog server shutdown successfully.");
}
