use crate::domain::snapshot::{Section, StockProfile};
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::extract::{require_provider, ExtractorKind, MetricExtractor};
use crate::ingest::MarketDataProvider;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileExtractor;

#[async_trait::async_trait]
impl MetricExtractor for ProfileExtractor {
    type Output = StockProfile;

    fn section(&self) -> Section {
        Section::Profile
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Live
    }

    async fn extract(
        &self,
        ticker: &TickerSymbol,
        provider: Option<&dyn MarketDataProvider>,
    ) -> Result<StockProfile, SignalError> {
        let provider = require_provider(provider, ticker, Section::Profile)?;
        provider
            .fetch_profile(ticker)
            .await
            .map_err(|err| SignalError::data_unavailable(ticker, Section::Profile, provider, &err))
    }
}
