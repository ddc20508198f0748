use crate::domain::snapshot::StockProfile;
use crate::domain::ticker::TickerSymbol;
use crate::ingest::types::{
    EarningsCalendar, Financials, HistoryPeriod, Interval, PriceBar, PriceHistory,
};
use anyhow::Result;

/// Read-only market data source. Implementations must not retry or cache;
/// failures are reported to the extractor that asked.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name carried in error details and logs.
    fn provider_name(&self) -> &'static str;

    async fn fetch_profile(&self, ticker: &TickerSymbol) -> Result<StockProfile>;

    async fn fetch_financials(&self, ticker: &TickerSymbol) -> Result<Financials>;

    /// Bars in ascending date order. Missing closes stay `None`.
    async fn fetch_price_history(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<PriceBar>>;

    /// Daily bars and dividend events from one upstream request.
    async fn fetch_history_with_dividends(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
    ) -> Result<PriceHistory>;

    async fn fetch_earnings_calendar(&self, ticker: &TickerSymbol) -> Result<EarningsCalendar>;
}
