use thiserror::Error;

use crate::model::Domain;

/// Why a single provider produced no usable data.
///
/// Never fatal to a request: it is logged, kept for accounting, and the
/// remaining providers carry the answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider}: {credential} not configured")]
    MissingCredential { provider: String, credential: String },

    #[error("{provider} HTTP {status}: {body}")]
    HttpStatus { provider: String, status: u16, body: String },

    #[error("{provider} returned a malformed response: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("{provider} fetch failed: {reason}")]
    Transport { provider: String, reason: String },

    #[error("{provider}: no data for {key}")]
    NoData { provider: String, key: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::MissingCredential { provider, .. }
            | ProviderError::HttpStatus { provider, .. }
            | ProviderError::Malformed { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::NoData { provider, .. } => provider,
        }
    }

    pub(crate) fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::Malformed { provider: provider.to_string(), reason: reason.into() }
    }

    pub(crate) fn no_data(provider: &str, key: &str) -> Self {
        ProviderError::NoData { provider: provider.to_string(), key: key.to_string() }
    }
}

/// Outcome of one adapter call.
pub type Outcome<T> = Result<T, ProviderError>;

/// Request-level failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    /// Caller input rejected before any provider was contacted.
    #[error("{0}")]
    Validation(String),

    /// Every provider failed for the requested key.
    #[error("Failed to fetch {}: {key}", .domain.subject())]
    AggregateUnavailable { domain: Domain, key: String, failures: Vec<ProviderError> },

    /// Rates were aggregated but the target currency is not among them.
    #[error("Rate not available for {from} to {to}")]
    ConversionUnavailable { domain: Domain, from: String, to: String },
}

impl AggregateError {
    pub fn validation(message: impl Into<String>) -> Self {
        AggregateError::Validation(message.into())
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            AggregateError::Validation(_) => "INVALID_INPUT",
            AggregateError::AggregateUnavailable { .. } => "AGGREGATE_UNAVAILABLE",
            AggregateError::ConversionUnavailable { .. } => "CONVERSION_UNAVAILABLE",
        }
    }
}
