use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub type FlagResult<T> = std::result::Result<T, FlagError>;

/// Reasons a flag could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag client is closed")]
    Closed,

    #[error("flag evaluation timed out after {0}ms")]
    Timeout(u128),

    #[error("flag relay connection failed: {0}")]
    Connection(String),

    #[error("flag relay responded with status {0}")]
    Status(u16),

    #[error("invalid flag relay response: {0}")]
    InvalidResponse(String),

    #[error("could not build flag request: {0}")]
    Request(String),

    #[error("invalid flag relay url: {0}")]
    InvalidUrl(String),

    #[error("unknown flag `{0}`")]
    UnknownFlag(String),

    #[error("flag `{0}` is not a boolean")]
    WrongType(String),
}

/// Evaluation context, serialized in the LaunchDarkly context format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    pub kind: String,
    pub key: String,
}

impl Context {
    /// A context of kind `user`
    pub fn user(key: &str) -> Self {
        Context {
            kind: "user".to_string(),
            key: key.to_string(),
        }
    }
}

/// A remote boolean oracle keyed by flag name and evaluated per context.
#[async_trait]
pub trait FlagEvaluator: Send + Sync {
    /// Evaluates a boolean flag, surfacing every failure
    async fn evaluate_bool(&self, flag_key: &str, context: &Context) -> FlagResult<bool>;

    /// Evaluates a boolean flag, serving `default` on any failure
    async fn bool_variation(&self, flag_key: &str, context: &Context, default: bool) -> bool {
        match self.evaluate_bool(flag_key, context).await {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "flag `{}` evaluation for `{}` failed, serving default {}: {}",
                    flag_key,
                    context.key,
                    default,
                    err
                );
                default
            }
        }
    }

    /// Returns whether the client got a valid answer from the flag service
    fn initialized(&self) -> bool;

    /// Releases the client, later evaluations fail with [`FlagError::Closed`]
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingEvaluator;

    #[async_trait]
    impl FlagEvaluator for FailingEvaluator {
        async fn evaluate_bool(&self, _flag_key: &str, _context: &Context) -> FlagResult<bool> {
            Err(FlagError::Connection("connection refused".to_string()))
        }

        fn initialized(&self) -> bool {
            false
        }

        fn close(&self) {}
    }

    #[test]
    fn context_json_test() {
        let json = serde_json::to_value(Context::user("ana")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "user", "key": "ana"}));
    }

    #[tokio::test]
    async fn bool_variation_default_test() {
        let evaluator = FailingEvaluator;
        let context = Context::user("ana");
        assert!(!evaluator.bool_variation("some-flag", &context, false).await);
        assert!(evaluator.bool_variation("some-flag", &context, true).await);
    }
}
