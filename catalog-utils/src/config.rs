use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::envsubst;

const DEFAULT_CONFIG_FILENAME_RELEASE: &str = "catalog-config.yaml";
const DEFAULT_CONFIG_FILENAME_DEBUG: &str = "catalog-config.debug";
const DEFAULT_CONFIG_FILENAME_TEST: &str = "catalog-config.test";

const DEFAULT_HTTP_SERVICE_LISTEN_ADDRESS: &str = "127.0.0.1";
const DEFAULT_HTTP_SERVICE_LISTEN_PORT: u16 = 8000;

const DEFAULT_FLAGS_RELAY_URL: &str = "http://127.0.0.1:8030";
const DEFAULT_FLAGS_TIMEOUT_MILLIS: u64 = 500;
const DEFAULT_FLAGS_OFFLINE: bool = false;

type ConfigNode = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value `{value}` for `{section}.{key}`")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub http: HttpConfig,
    pub flags: FlagsConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen_on: Vec<SocketAddr>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let ip_address: IpAddr = [127, 0, 0, 1].into();
        HttpConfig {
            listen_on: vec![SocketAddr::new(
                ip_address,
                DEFAULT_HTTP_SERVICE_LISTEN_PORT,
            )],
        }
    }
}

/// Settings of the feature flag client
#[derive(Debug, Clone)]
pub struct FlagsConfig {
    /// base url of the flag evaluation relay
    pub relay_url: String,
    /// upper bound for a single flag evaluation
    pub timeout: Duration,
    /// serve `offline_values` instead of calling the relay
    pub offline: bool,
    pub offline_values: HashMap<String, bool>,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        FlagsConfig {
            relay_url: DEFAULT_FLAGS_RELAY_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_FLAGS_TIMEOUT_MILLIS),
            offline: DEFAULT_FLAGS_OFFLINE,
            offline_values: HashMap::new(),
        }
    }
}

/// Loads the configuration file of the current build profile.
///
/// Never fails: a missing or malformed file is logged and the defaults are used.
pub fn load() -> Arc<Config> {
    let config_filename = config_filename();
    let config = match load_from(config_filename) {
        Ok(config) => config,
        Err(ConfigError::Read { path, source }) if source.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found, using the default configuration", path);
            Config::default()
        }
        Err(err) => {
            log::error!("{}, using the default configuration", err);
            Config::default()
        }
    };

    if log::log_enabled!(log::Level::Debug) {
        log::debug!("parsed config:\n{:#?}", config);
    }

    Arc::new(config)
}

/// Loads the configuration from the given file
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let config_content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    parse(&config_content)
}

/// Parses the configuration content, substituting environment variables first
pub fn parse(config_content: &str) -> Result<Config, ConfigError> {
    let config_substituted = envsubst::substitute(config_content);

    let config_map: HashMap<String, ConfigNode> = if config_substituted.trim().is_empty() {
        HashMap::new()
    } else {
        serde_yaml::from_str(&config_substituted)?
    };

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("loaded config:\n{:#?}", config_map);
    }

    let mut config = Config::default();

    if let Some(config_node) = config_map.get("http") {
        config.http.listen_on = parse_listen_on(
            config_node,
            DEFAULT_HTTP_SERVICE_LISTEN_ADDRESS,
            DEFAULT_HTTP_SERVICE_LISTEN_PORT,
        )?;
    }

    if let Some(config_node) = config_map.get("flags") {
        config.flags = parse_flags(config_node)?;
    }

    Ok(config)
}

/// Returns a node value, skipping values left unresolved by substitution
fn node_value<'a>(node: &'a ConfigNode, node_key: &str) -> Option<&'a str> {
    node.get(node_key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty() && !envsubst::is_unresolved(value))
}

fn parse_listen_on(
    node: &ConfigNode,
    default_listen_address: &str,
    default_listen_port: u16,
) -> Result<Vec<SocketAddr>, ConfigError> {
    let listen_addresses = match node_value(node, "listen_addresses") {
        Some(value) => value.split(',').map(|s| s.trim()).collect::<Vec<_>>(),
        None => vec![default_listen_address],
    };

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("config: listen_addresses: {:?}", listen_addresses);
    }

    let port = match node_value(node, "listen_port") {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            section: "http",
            key: "listen_port",
            value: value.to_string(),
        })?,
        None => default_listen_port,
    };

    let mut listen_on = Vec::<SocketAddr>::with_capacity(listen_addresses.len());
    for listen_address in listen_addresses {
        let ip_address: IpAddr =
            listen_address
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    section: "http",
                    key: "listen_addresses",
                    value: listen_address.to_string(),
                })?;
        listen_on.push(SocketAddr::new(ip_address, port));
    }

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("parsed: listen_on: {:?}", listen_on);
    }

    Ok(listen_on)
}

fn parse_flags(node: &ConfigNode) -> Result<FlagsConfig, ConfigError> {
    let mut flags = FlagsConfig::default();

    if let Some(value) = node_value(node, "relay_url") {
        flags.relay_url = value.trim_end_matches('/').to_string();
    }

    if let Some(value) = node_value(node, "timeout_millis") {
        let millis: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
            section: "flags",
            key: "timeout_millis",
            value: value.to_string(),
        })?;
        flags.timeout = Duration::from_millis(millis);
    }

    if let Some(value) = node_value(node, "offline") {
        flags.offline = parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
            section: "flags",
            key: "offline",
            value: value.to_string(),
        })?;
    }

    if let Some(value) = node_value(node, "offline_values") {
        flags.offline_values = parse_offline_values(value)?;
    }

    Ok(flags)
}

/// Parses `key=bool` pairs separated by commas
fn parse_offline_values(value: &str) -> Result<HashMap<String, bool>, ConfigError> {
    let mut values = HashMap::new();
    for pair in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let parsed = pair
            .split_once('=')
            .and_then(|(key, flag)| parse_bool(flag.trim()).map(|flag| (key.trim(), flag)));
        match parsed {
            Some((key, flag)) if !key.is_empty() => {
                values.insert(key.to_string(), flag);
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    section: "flags",
                    key: "offline_values",
                    value: pair.to_string(),
                })
            }
        }
    }
    Ok(values)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn config_filename() -> &'static str {
    if cfg!(test) {
        DEFAULT_CONFIG_FILENAME_TEST
    } else if cfg!(debug_assertions) {
        DEFAULT_CONFIG_FILENAME_DEBUG
    } else {
        DEFAULT_CONFIG_FILENAME_RELEASE
    }
}
