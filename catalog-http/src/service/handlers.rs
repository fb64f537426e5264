use hyper::StatusCode;
use serde::Serialize;

use catalog_flags::Context;
use catalog_storage::{ItemFields, ItemId};

use super::app_state::AppState;
use super::pricing::{self, NEW_PRICING_FLAG};
use super::response::{blank_response, json_response, ApiError, HttpResponse};

/// User key evaluated when a request carries no `X-User-Id` header
pub const ANONYMOUS_USER_KEY: &str = "anonimo";

pub type HandlerResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Serialize)]
struct StatusMessage {
    status: &'static str,
    message: &'static str,
}

/// State of the flag client as seen by one evaluation
#[derive(Debug, Serialize)]
pub struct FlagDebugReport {
    pub sdk_key_configured: bool,
    pub client_initialized: bool,
    pub flag_key: &'static str,
    pub user_key: String,
    pub flag_value: Option<bool>,
    pub error: Option<String>,
}

/// Parses an item id path segment.
///
/// Non-integers are a validation error. Integers outside the id range,
/// negative or too large, can never match an item.
fn parse_item_id(raw_id: &str) -> Result<ItemId, ApiError> {
    if let Ok(id) = raw_id.parse::<ItemId>() {
        return Ok(id);
    }

    let digits = raw_id
        .strip_prefix('-')
        .or_else(|| raw_id.strip_prefix('+'))
        .unwrap_or(raw_id);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::ItemNotFound);
    }

    Err(ApiError::Validation(format!(
        "path parameter `item_id` must be an integer, got `{}`",
        raw_id
    )))
}

fn parse_item_fields(body: &[u8]) -> Result<ItemFields, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Validation(err.to_string()))
}

pub fn root() -> HandlerResult {
    Ok(json_response(
        StatusCode::OK,
        &StatusMessage {
            status: "ok",
            message: "Item catalog API is running",
        },
    ))
}

pub fn list_items(state: &AppState) -> HandlerResult {
    Ok(json_response(StatusCode::OK, &state.store.list()))
}

pub fn create_item(state: &AppState, body: &[u8]) -> HandlerResult {
    let fields = parse_item_fields(body)?;
    let item = state.store.create(fields);
    log::info!("item {} created", item.id);
    Ok(json_response(StatusCode::CREATED, &item))
}

pub fn get_item(state: &AppState, raw_id: &str) -> HandlerResult {
    let id = parse_item_id(raw_id)?;
    let item = state.store.get(id)?;
    Ok(json_response(StatusCode::OK, &item))
}

pub fn replace_item(state: &AppState, raw_id: &str, body: &[u8]) -> HandlerResult {
    let id = parse_item_id(raw_id)?;
    let fields = parse_item_fields(body)?;
    let item = state.store.replace(id, fields)?;
    log::info!("item {} replaced", item.id);
    Ok(json_response(StatusCode::OK, &item))
}

pub fn delete_item(state: &AppState, raw_id: &str) -> HandlerResult {
    let id = parse_item_id(raw_id)?;
    state.store.delete(id)?;
    log::info!("item {} deleted", id);
    Ok(blank_response(StatusCode::NO_CONTENT))
}

/// Quotes the item price, discounted while `new-pricing-strategy` is on for the user
pub async fn item_price(state: &AppState, raw_id: &str, user_key: &str) -> HandlerResult {
    let id = parse_item_id(raw_id)?;
    let item = state.store.get(id)?;

    let context = Context::user(user_key);
    let new_pricing = state
        .flags
        .bool_variation(NEW_PRICING_FLAG, &context, false)
        .await;

    let price = pricing::quoted_price(item.price, new_pricing);
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "item {} for `{}`: base price {}, new pricing {}, quoted {}",
            id,
            user_key,
            item.price,
            new_pricing,
            price
        );
    }
    Ok(json_response(StatusCode::OK, &price))
}

/// Reports the flag client state; evaluation failures end up in `error`
pub async fn flag_debug(state: &AppState, user_key: &str) -> HandlerResult {
    let context = Context::user(user_key);
    let (flag_value, error) = match state.flags.evaluate_bool(NEW_PRICING_FLAG, &context).await {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err.to_string())),
    };

    let report = FlagDebugReport {
        sdk_key_configured: state.sdk_key_configured,
        client_initialized: state.flags.initialized(),
        flag_key: NEW_PRICING_FLAG,
        user_key: user_key.to_string(),
        flag_value,
        error,
    };
    Ok(json_response(StatusCode::OK, &report))
}
