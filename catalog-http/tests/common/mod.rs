//! Shared helpers for the HTTP integration tests.
//!
//! Each test file is its own crate, so helpers unused by one of them are expected.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use catalog_flags::{Context, FlagError, FlagEvaluator, FlagResult};
use catalog_http::{http_service, AppState};
use catalog_storage::ItemStore;

/// Always answers with the same value, counting evaluations
pub struct FixedFlag {
    pub value: bool,
    pub evaluations: AtomicUsize,
}

impl FixedFlag {
    pub fn new(value: bool) -> Self {
        FixedFlag {
            value,
            evaluations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FlagEvaluator for FixedFlag {
    async fn evaluate_bool(&self, _flag_key: &str, _context: &Context) -> FlagResult<bool> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        Ok(self.value)
    }

    fn initialized(&self) -> bool {
        true
    }

    fn close(&self) {}
}

/// Enables the flag only for the listed user keys
pub struct PerUserFlag {
    pub enabled_for: Vec<String>,
}

#[async_trait]
impl FlagEvaluator for PerUserFlag {
    async fn evaluate_bool(&self, _flag_key: &str, context: &Context) -> FlagResult<bool> {
        Ok(self.enabled_for.contains(&context.key))
    }

    fn initialized(&self) -> bool {
        true
    }

    fn close(&self) {}
}

/// Fails every evaluation like an unreachable flag service
pub struct UnreachableFlags;

#[async_trait]
impl FlagEvaluator for UnreachableFlags {
    async fn evaluate_bool(&self, _flag_key: &str, _context: &Context) -> FlagResult<bool> {
        Err(FlagError::Connection("connection refused".to_string()))
    }

    fn initialized(&self) -> bool {
        false
    }

    fn close(&self) {}
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap();
    }
}

/// Starts the HTTP service on an ephemeral port
pub async fn start_server(flags: Arc<dyn FlagEvaluator>, sdk_key_configured: bool) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(ItemStore::new(), flags, sdk_key_configured));
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(http_service::serve(
        listener,
        state.clone(),
        shutdown.clone(),
    ));

    TestServer {
        addr,
        state,
        shutdown,
        handle,
    }
}
