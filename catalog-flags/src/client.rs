pub mod offline_client;
pub mod relay_client;
