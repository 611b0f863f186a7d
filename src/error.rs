// ============================================================
// Configuration Errors
// ============================================================
// Every mistake a caller can make in a config surfaces here,
// before any tensor is allocated. Data problems never use
// this type: oversized inputs degrade with a warning instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown optimizer '{0}' (expected one of: adadelta, adam, adamw, sgd)")]
    UnknownOptimizer(String),

    #[error("unknown scheduler '{0}' (expected one of: none, reduceonplateau, warmupinvsqrt)")]
    UnknownScheduler(String),

    #[error("unknown encoder '{0}' (expected one of: bert-tiny, bert-mini, bert-small, bert-medium, bert-base)")]
    UnknownEncoder(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        name:   &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { name, reason: reason.into() }
    }
}
