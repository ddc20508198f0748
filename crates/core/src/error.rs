use crate::domain::snapshot::Section;
use crate::llm::Provider;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignalError>;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{section} data unavailable for {ticker}: {detail}")]
    DataUnavailable {
        ticker: String,
        section: Section,
        detail: String,
    },

    #[error("insufficient price history for {ticker}: {points} valid point(s), need at least 2")]
    InsufficientHistory { ticker: String, points: usize },

    #[error("upstream {provider:?} unavailable (stage={stage}): {detail}")]
    UpstreamUnavailable {
        provider: Provider,
        stage: &'static str,
        detail: String,
    },

    /// The raw model output is kept verbatim so callers can surface or retry it.
    #[error("model response is not valid JSON: {detail}")]
    MalformedResponse { detail: String, raw: String },

    #[error("model response violates schema at `{field}`: {detail}")]
    SchemaViolation { field: String, detail: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SignalError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidTicker(_) => "invalid_ticker",
            Self::InvalidInput(_) => "invalid_input",
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::Serialization(_) => "serialization_error",
        }
    }

    pub(crate) fn schema(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn data_unavailable(
        ticker: &crate::domain::ticker::TickerSymbol,
        section: Section,
        provider: &dyn crate::ingest::MarketDataProvider,
        err: &anyhow::Error,
    ) -> Self {
        Self::DataUnavailable {
            ticker: ticker.to_string(),
            section,
            detail: format!("{}: {err:#}", provider.provider_name()),
        }
    }
}
