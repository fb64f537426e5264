//! Feature flag evaluation for the item catalog.
//!
//! [`FlagEvaluator`] is the seam to the remote flag service. The relay client
//! evaluates flags through a LaunchDarkly Relay Proxy compatible endpoint; the
//! offline client serves fixed values.

pub mod client;
pub mod evaluator;

pub use client::offline_client::OfflineFlagClient;
pub use client::relay_client::RelayFlagClient;
pub use evaluator::{Context, FlagError, FlagEvaluator, FlagResult};
