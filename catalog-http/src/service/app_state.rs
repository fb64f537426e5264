use std::sync::Arc;

use catalog_flags::FlagEvaluator;
use catalog_storage::ItemStore;

/// Shared state handed to every request handler
pub struct AppState {
    pub store: ItemStore,
    pub flags: Arc<dyn FlagEvaluator>,

    /// whether a real SDK key was supplied rather than the placeholder
    pub sdk_key_configured: bool,
}

impl AppState {
    pub fn new(store: ItemStore, flags: Arc<dyn FlagEvaluator>, sdk_key_configured: bool) -> Self {
        AppState {
            store,
            flags,
            sdk_key_configured,
        }
    }
}
