mod common;

use std::net::SocketAddr;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use hyper::StatusCode;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use catalog_http::{http_client, AppState, HttpService};
use catalog_storage::ItemStore;
use catalog_utils::{Config, HttpConfig};

use common::FixedFlag;

#[test]
fn start_and_shutdown_test() {
    let config = Arc::new(Config {
        http: HttpConfig {
            listen_on: vec!["127.0.0.1:0".parse::<SocketAddr>().unwrap()],
        },
        ..Config::default()
    });
    let state = Arc::new(AppState::new(
        ItemStore::new(),
        Arc::new(FixedFlag::new(false)),
        true,
    ));

    let shutdown = CancellationToken::new();
    let (ready_sender, ready_receiver) = channel();
    let service = HttpService::with_config(state.clone(), config);
    let handle = service.start(ready_sender, shutdown.clone());

    let addr = ready_receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("HTTP service did not start");
    assert_ne!(addr.port(), 0);

    // talk to the service from a separate runtime
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let response = runtime
        .block_on(http_client::post_json(
            &format!("http://{addr}/items"),
            &json!({"nombre": "Lamp", "precio": 12.0}),
        ))
        .unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(state.store.len(), 1);

    shutdown.cancel();
    handle.join().unwrap();
}
