use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpStream;

use catalog_utils::FlagsConfig;

use crate::evaluator::{Context, FlagError, FlagEvaluator, FlagResult};

pub const EVALUATION_PATH: &str = "/sdk/evalx/context";
pub const STATUS_PATH: &str = "/status";

/// Flag evaluation result as returned by the relay, only `value` is used
#[derive(Debug, Deserialize)]
struct EvaluatedFlag {
    value: serde_json::Value,
}

/// Evaluates flags through a LaunchDarkly Relay Proxy compatible endpoint.
///
/// Every evaluation opens its own HTTP/1.1 connection and is bounded by the
/// configured timeout. Only plain `http://` relays are supported.
pub struct RelayFlagClient {
    host: String,
    port: u16,
    base_path: String,
    sdk_key: String,
    timeout: Duration,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl Drop for RelayFlagClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl RelayFlagClient {
    /// Creates a client without contacting the relay
    pub fn with_config(sdk_key: &str, config: &FlagsConfig) -> FlagResult<Self> {
        let relay_uri = config
            .relay_url
            .parse::<Uri>()
            .map_err(|err| FlagError::InvalidUrl(format!("{}: {}", config.relay_url, err)))?;

        match relay_uri.scheme_str() {
            Some("http") => {}
            _ => {
                return Err(FlagError::InvalidUrl(format!(
                    "{}: only http relays are supported",
                    config.relay_url
                )))
            }
        }

        let host = relay_uri
            .host()
            .ok_or_else(|| FlagError::InvalidUrl(format!("{}: missing host", config.relay_url)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = relay_uri.port_u16().unwrap_or(80);
        let base_path = relay_uri.path().trim_end_matches('/').to_string();

        Ok(RelayFlagClient {
            host,
            port,
            base_path,
            sdk_key: sdk_key.to_string(),
            timeout: config.timeout,
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    /// Creates a client and probes the relay status endpoint.
    ///
    /// An unreachable relay is logged, the client is still returned and
    /// reports itself as not initialized.
    pub async fn connect(sdk_key: &str, config: &FlagsConfig) -> FlagResult<Self> {
        let client = Self::with_config(sdk_key, config)?;

        match client.send(Method::GET, STATUS_PATH, Bytes::new()).await {
            Ok((status, _)) if status.is_success() => {
                client.initialized.store(true, Ordering::SeqCst);
                log::info!(
                    "flag relay at {}:{} is ready",
                    client.host,
                    client.port
                );
            }
            Ok((status, _)) => {
                log::warn!("flag relay status check responded with {}", status);
            }
            Err(err) => {
                log::warn!("flag relay is not reachable yet: {}", err);
            }
        }

        Ok(client)
    }

    /// Sends a single request to the relay within the configured timeout
    async fn send(&self, method: Method, path: &str, body: Bytes) -> FlagResult<(StatusCode, Bytes)> {
        match tokio::time::timeout(self.timeout, self.request(method, path, body)).await {
            Ok(result) => result,
            Err(_) => Err(FlagError::Timeout(self.timeout.as_millis())),
        }
    }

    async fn request(&self, method: Method, path: &str, body: Bytes) -> FlagResult<(StatusCode, Bytes)> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|err| FlagError::Connection(err.to_string()))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|err| FlagError::Connection(err.to_string()))?;
        tokio::task::spawn(async move {
            if let Err(err) = conn.await {
                log::debug!("flag relay connection closed: {:?}", err);
            }
        });

        let req = Request::builder()
            .uri(format!("{}{}", self.base_path, path))
            .method(method)
            .header(hyper::header::HOST, format!("{}:{}", self.host, self.port))
            .header(hyper::header::AUTHORIZATION, self.sdk_key.as_str())
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(Full::new(body))
            .map_err(|err| FlagError::Request(err.to_string()))?;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("flag relay request: {} {}", req.method(), req.uri());
        }

        let res = sender
            .send_request(req)
            .await
            .map_err(|err| FlagError::Connection(err.to_string()))?;
        let status = res.status();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(|err| FlagError::Connection(err.to_string()))?
            .to_bytes();

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("flag relay response status: {}", status);
        }

        Ok((status, body))
    }
}

#[async_trait]
impl FlagEvaluator for RelayFlagClient {
    async fn evaluate_bool(&self, flag_key: &str, context: &Context) -> FlagResult<bool> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FlagError::Closed);
        }

        let body = serde_json::to_vec(context).map_err(|err| FlagError::Request(err.to_string()))?;
        let report = Method::from_bytes(b"REPORT").map_err(|err| FlagError::Request(err.to_string()))?;

        let (status, body) = self.send(report, EVALUATION_PATH, Bytes::from(body)).await?;
        if !status.is_success() {
            return Err(FlagError::Status(status.as_u16()));
        }
        self.initialized.store(true, Ordering::SeqCst);

        parse_flag_value(&body, flag_key)
    }

    fn initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("flag relay client closed");
        }
    }
}

/// Picks a boolean flag out of a relay evaluation response
pub fn parse_flag_value(body: &[u8], flag_key: &str) -> FlagResult<bool> {
    let flags: HashMap<String, EvaluatedFlag> =
        serde_json::from_slice(body).map_err(|err| FlagError::InvalidResponse(err.to_string()))?;

    match flags.get(flag_key) {
        Some(flag) => flag
            .value
            .as_bool()
            .ok_or_else(|| FlagError::WrongType(flag_key.to_string())),
        None => Err(FlagError::UnknownFlag(flag_key.to_string())),
    }
}
