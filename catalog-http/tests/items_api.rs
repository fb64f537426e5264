mod common;

use std::sync::Arc;

use hyper::StatusCode;
use serde_json::{json, Value};

use catalog_http::http_client;
use catalog_storage::Item;

use common::{start_server, FixedFlag};

#[tokio::test]
async fn root_status_test() {
    let server = start_server(Arc::new(FixedFlag::new(false)), true).await;

    let response = http_client::get(&server.url("/")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    let body: Value = response.json().unwrap();
    assert_eq!(body["status"], "ok");

    server.stop().await;
}

#[tokio::test]
async fn item_crud_test() {
    let server = start_server(Arc::new(FixedFlag::new(false)), true).await;

    // empty catalog
    let response = http_client::get(&server.url("/items")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<Value>().unwrap(), json!([]));

    // create
    let response = http_client::post_json(
        &server.url("/items"),
        &json!({"nombre": "Lamp", "descripcion": "desk lamp", "precio": 25.5}),
    )
    .await
    .unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.headers[hyper::header::CONTENT_TYPE],
        "application/json"
    );
    let created: Item = response.json().unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.name, "Lamp");

    // create without description
    let response = http_client::post_json(&server.url("/items"), &json!({"nombre": "Chair", "precio": 40}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
    let body: Value = response.json().unwrap();
    assert_eq!(
        body,
        json!({"id": 2, "nombre": "Chair", "descripcion": null, "precio": 40.0})
    );

    // read
    let response = http_client::get(&server.url("/items/1")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<Item>().unwrap(), created);

    // replace keeps the id and overwrites everything else
    let response = http_client::put_json(
        &server.url("/items/1"),
        &json!({"id": 77, "nombre": "Floor lamp", "precio": 30.0}),
    )
    .await
    .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    let replaced: Item = response.json().unwrap();
    assert_eq!(replaced.id, 1);
    assert_eq!(replaced.name, "Floor lamp");
    assert_eq!(replaced.description, None);
    assert_eq!(replaced.price, 30.0);

    // delete
    let response = http_client::delete(&server.url("/items/1")).await.unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    let response = http_client::get(&server.url("/items")).await.unwrap();
    let items: Vec<Item> = response.json().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 2);

    // ids are not reused
    let response = http_client::post_json(&server.url("/items"), &json!({"nombre": "Desk", "precio": 99.0}))
        .await
        .unwrap();
    assert_eq!(response.json::<Item>().unwrap().id, 3);

    server.stop().await;
}

#[tokio::test]
async fn unknown_item_test() {
    let server = start_server(Arc::new(FixedFlag::new(false)), true).await;

    let body = json!({"nombre": "Ghost", "precio": 1.0});
    let responses = vec![
        http_client::get(&server.url("/items/5")).await.unwrap(),
        http_client::put_json(&server.url("/items/5"), &body).await.unwrap(),
        http_client::delete(&server.url("/items/5")).await.unwrap(),
        http_client::get(&server.url("/items/5/precio")).await.unwrap(),
        http_client::get(&server.url("/items/-5")).await.unwrap(),
        http_client::get(&server.url("/items/9223372036854775808")).await.unwrap(),
        http_client::get(&server.url("/items/99999999999999999999999/precio"))
            .await
            .unwrap(),
    ];

    for response in responses {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>().unwrap(),
            json!({"detail": "Item no encontrado"})
        );
    }

    server.stop().await;
}

#[tokio::test]
async fn invalid_body_test() {
    let server = start_server(Arc::new(FixedFlag::new(false)), true).await;

    let invalid_bodies = vec![
        json!({"nombre": "No price"}),
        json!({"precio": 10.0}),
        json!({"nombre": "Bad price", "precio": "ten"}),
        json!({"nombre": 12, "precio": 10.0}),
        json!("just a string"),
    ];

    for body in &invalid_bodies {
        let response = http_client::post_json(&server.url("/items"), body).await.unwrap();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        let detail: Value = response.json().unwrap();
        assert!(detail["detail"].is_string());
    }

    // nothing was stored
    assert!(server.state.store.is_empty());

    // invalid body on update is rejected before the id lookup
    let created = server
        .state
        .store
        .create(catalog_storage::ItemFields::new("Lamp", 10.0));
    let response = http_client::put_json(&server.url(&format!("/items/{}", created.id)), &invalid_bodies[0])
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(server.state.store.get(created.id).unwrap(), created);

    server.stop().await;
}

#[tokio::test]
async fn invalid_path_test() {
    let server = start_server(Arc::new(FixedFlag::new(false)), true).await;

    let response = http_client::get(&server.url("/items/abc")).await.unwrap();
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = http_client::get(&server.url("/nowhere")).await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>().unwrap(), json!({"detail": "Not Found"}));

    let response = http_client::delete(&server.url("/items")).await.unwrap();
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers[hyper::header::ALLOW], "GET, POST");

    server.stop().await;
}
