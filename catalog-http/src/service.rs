pub mod app_state;
pub mod handlers;
pub mod http_service;
pub mod pricing;
pub mod response;
pub mod router;
