//! Autoscaler error types.

use thiserror::Error;

/// Errors that can occur while configuring or running the autoscaler.
#[derive(Debug, Error)]
pub enum AutoscaleError {
    #[error("invalid autoscaling config: {0}")]
    InvalidConfig(String),

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("failed to read config: {0}")]
    ConfigRead(String),

    #[error("failed to list cluster instances: {0:#}")]
    Membership(anyhow::Error),

    #[error("failed to sample demand ({context}): {source:#}")]
    Sampling {
        context: String,
        source: anyhow::Error,
    },

    #[error("resource controller rejected request: {0:#}")]
    Controller(anyhow::Error),
}

impl AutoscaleError {
    /// Short name of the tick phase that produced this error.
    pub fn phase(&self) -> &'static str {
        match self {
            AutoscaleError::InvalidConfig(_)
            | AutoscaleError::InvalidDuration(_)
            | AutoscaleError::ConfigRead(_) => "config",
            AutoscaleError::Membership(_) => "membership",
            AutoscaleError::Sampling { .. } => "sampling",
            AutoscaleError::Controller(_) => "controller",
        }
    }

    pub(crate) fn sampling(context: impl Into<String>, source: anyhow::Error) -> Self {
        AutoscaleError::Sampling {
            context: context.into(),
            source,
        }
    }
}

pub type AutoscaleResult<T> = Result<T, AutoscaleError>;
