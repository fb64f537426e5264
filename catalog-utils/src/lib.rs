//! **Item Catalog Common Utilities**
//!
//! Configuration loading shared by the catalog crates.

pub mod config;
pub mod envsubst;

pub use config::{Config, ConfigError, FlagsConfig, HttpConfig};
