//! **Item Catalog Server**
//!
//! Process bootstrap shared by the server binaries: logging, the SDK key,
//! the flag client and the service lifecycle.

use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Instant;

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use tokio_util::sync::CancellationToken;

use catalog_flags::{FlagEvaluator, OfflineFlagClient, RelayFlagClient};
use catalog_http::{AppState, HttpService};
use catalog_storage::ItemStore;
use catalog_utils::Config;

pub const SDK_KEY_ENV: &str = "LAUNCHDARKLY_SDK_KEY";

/// Credential used when no SDK key is supplied; the relay will reject it
pub const PLACEHOLDER_SDK_KEY: &str = "sdk-placeholder-key";

pub const LOG_CONFIG_FILE: &str = "log.yaml";

/// SDK key resolved at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkKey {
    pub value: String,
    pub configured: bool,
}

/// Initializes log4rs from `config_path`, falling back to a console logger
pub fn init_logging(config_path: &str) {
    let init_error = match log4rs::init_file(config_path, Default::default()) {
        Ok(()) => return,
        Err(err) => err,
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {t} - {m}{n}",
        )))
        .build();

    let log_config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));

    match log_config {
        Ok(log_config) => {
            if let Err(err) = log4rs::init_config(log_config) {
                eprintln!("could not initialize logging: {}", err);
                return;
            }
            log::warn!(
                "could not load {}: {}; logging to stdout",
                config_path,
                init_error
            );
        }
        Err(err) => eprintln!("could not initialize logging: {}", err),
    }
}

/// Resolves the SDK key from the environment
pub fn sdk_key_from_env() -> SdkKey {
    resolve_sdk_key(std::env::var(SDK_KEY_ENV).ok())
}

/// Uses the given key, or warns and falls back to the placeholder
pub fn resolve_sdk_key(value: Option<String>) -> SdkKey {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => SdkKey {
            value,
            configured: true,
        },
        _ => {
            log::warn!(
                "{} is not set, flag evaluations will use a placeholder key and serve defaults",
                SDK_KEY_ENV
            );
            SdkKey {
                value: PLACEHOLDER_SDK_KEY.to_string(),
                configured: false,
            }
        }
    }
}

/// Acquires the flag client for the process lifetime.
///
/// Never fails: a relay client that cannot be built is replaced by an
/// unavailable client, so every flag serves its default.
pub async fn open_flag_client(sdk_key: &SdkKey, config: &Config) -> Arc<dyn FlagEvaluator> {
    let flags_config = &config.flags;
    if flags_config.offline {
        return Arc::new(OfflineFlagClient::with_values(
            flags_config.offline_values.clone(),
        ));
    }

    match RelayFlagClient::connect(&sdk_key.value, flags_config).await {
        Ok(client) => Arc::new(client),
        Err(err) => {
            log::error!("could not create the flag client: {}", err);
            Arc::new(OfflineFlagClient::unavailable())
        }
    }
}

/// Acquires the flag client and serves HTTP until `shutdown` is cancelled
pub async fn run(config: Arc<Config>, sdk_key: SdkKey, shutdown: CancellationToken) {
    let flags = open_flag_client(&sdk_key, &config).await;
    serve(config, flags, sdk_key.configured, shutdown).await;
}

/// Runs the HTTP service, then releases the flag client exactly once.
///
/// Returns when `shutdown` is cancelled or the service could not start.
pub async fn serve(
    config: Arc<Config>,
    flags: Arc<dyn FlagEvaluator>,
    sdk_key_configured: bool,
    shutdown: CancellationToken,
) {
    let state = Arc::new(AppState::new(
        ItemStore::new(),
        flags.clone(),
        sdk_key_configured,
    ));

    let launch_start = Instant::now();
    let (http_service_ready_sender, http_service_ready_receiver) = channel();
    let http_service = HttpService::with_config(state, config);
    let http_service_handler = http_service.start(http_service_ready_sender, shutdown);

    // wait for the readiness of http service
    match tokio::task::spawn_blocking(move || http_service_ready_receiver.recv()).await {
        Ok(Ok(local_addr)) => {
            let launch_elapsed = Instant::elapsed(&launch_start);
            log::info!(
                "Item catalog HTTP service started on {} in {:?}",
                local_addr,
                launch_elapsed
            );
        }
        Ok(Err(err)) => log::error!("HTTP service did not start: {}", err),
        Err(err) => log::error!("{}", err),
    }

    match tokio::task::spawn_blocking(move || http_service_handler.join()).await {
        Ok(Ok(())) => log::info!("Item catalog HTTP service closed."),
        Ok(Err(_)) => log::error!("HTTP service thread panicked"),
        Err(err) => log::error!("{}", err),
    }

    flags.close();
}

/// Completes on SIGINT or SIGTERM
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("could not install signal handlers: {}", err);
                if let Err(err) = tokio::signal::ctrl_c().await {
                    log::error!("{}", err);
                }
                return;
            }
        };

    tokio::select! {
        _ = sigint.recv() => {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("Received SIGINT");
            }
        }
        _ = sigterm.recv() => {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("Received SIGTERM");
            }
        }
    }
}

/// Completes on Ctrl-C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("{}", err);
    }
}
