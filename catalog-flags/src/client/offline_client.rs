use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::evaluator::{Context, FlagError, FlagEvaluator, FlagResult};

/// Serves fixed flag values without contacting any flag service.
/// Every context sees the same value.
pub struct OfflineFlagClient {
    values: HashMap<String, bool>,
    initialized: bool,
    closed: AtomicBool,
}

impl OfflineFlagClient {
    pub fn with_values(values: HashMap<String, bool>) -> Self {
        log::info!("flag client running offline with {} flag(s)", values.len());
        OfflineFlagClient {
            values,
            initialized: true,
            closed: AtomicBool::new(false),
        }
    }

    /// Stands in for a flag client that could not be created.
    /// Reports itself as not initialized and every evaluation fails.
    pub fn unavailable() -> Self {
        log::warn!("flag client unavailable, every flag serves its default");
        OfflineFlagClient {
            values: HashMap::new(),
            initialized: false,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl FlagEvaluator for OfflineFlagClient {
    async fn evaluate_bool(&self, flag_key: &str, _context: &Context) -> FlagResult<bool> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FlagError::Closed);
        }
        self.values
            .get(flag_key)
            .copied()
            .ok_or_else(|| FlagError::UnknownFlag(flag_key.to_string()))
    }

    fn initialized(&self) -> bool {
        self.initialized
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("offline flag client closed");
        }
    }
}
