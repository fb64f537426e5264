//! Walks a running server through create, read, price and delete.
//!
//! Usage: `smoke [base_url]`, defaults to `http://127.0.0.1:8000`.

use serde_json::json;

use catalog_http::http_client::{self, HttpClientResult, HttpResponse};
use catalog_server::{init_logging, LOG_CONFIG_FILE};
use catalog_storage::Item;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[tokio::main]
async fn main() {
    init_logging(LOG_CONFIG_FILE);
    log::info!("item catalog smoke test");

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = base_url.trim_end_matches('/');

    if let Err(err) = run(base_url).await {
        log::error!("smoke test failed: {}", err);
        std::process::exit(1);
    }
    log::info!("smoke test passed");
}

async fn run(base_url: &str) -> HttpClientResult<()> {
    let response = http_client::get(&format!("{base_url}/")).await?;
    report("status", &response);

    let response = http_client::post_json(
        &format!("{base_url}/items"),
        &json!({"nombre": "Smoke lamp", "descripcion": "created by the smoke test", "precio": 100.0}),
    )
    .await?;
    report("create", &response);
    let item: Item = response.json()?;

    let item_url = format!("{base_url}/items/{}", item.id);

    let response = http_client::get(&item_url).await?;
    report("get", &response);

    let response = http_client::get(&format!("{item_url}/precio")).await?;
    report("price (anonymous)", &response);

    let response =
        http_client::get_as_user(&format!("{item_url}/precio"), "smoke-tester").await?;
    report("price (smoke-tester)", &response);

    let response =
        http_client::get_as_user(&format!("{base_url}/debug/launchdarkly"), "smoke-tester")
            .await?;
    report("flag debug", &response);

    let response = http_client::delete(&item_url).await?;
    report("delete", &response);

    let response = http_client::get(&item_url).await?;
    report("get after delete", &response);
    if response.status.as_u16() != 404 {
        return Err(format!("item {} still exists after delete", item.id).into());
    }

    Ok(())
}

fn report(step: &str, response: &HttpResponse) {
    log::info!(
        "{}: {} {}",
        step,
        response.status,
        String::from_utf8_lossy(&response.body)
    );
}
