use crate::domain::snapshot::StockProfile;
use crate::domain::ticker::TickerSymbol;
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::{
    DividendEvent, EarningsCalendar, Financials, HistoryPeriod, Interval, PriceBar, PriceHistory,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Fixture-backed provider. Period and interval arguments are ignored: the
/// stored series is returned as-is. A ticker with no stored entry fails the
/// same way an unreachable provider would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    profiles: BTreeMap<TickerSymbol, StockProfile>,
    financials: BTreeMap<TickerSymbol, Financials>,
    prices: BTreeMap<TickerSymbol, Vec<PriceBar>>,
    dividends: BTreeMap<TickerSymbol, Vec<DividendEvent>>,
    calendars: BTreeMap<TickerSymbol, EarningsCalendar>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, ticker: &TickerSymbol, profile: StockProfile) -> Self {
        self.profiles.insert(ticker.clone(), profile);
        self
    }

    pub fn with_financials(mut self, ticker: &TickerSymbol, financials: Financials) -> Self {
        self.financials.insert(ticker.clone(), financials);
        self
    }

    pub fn with_prices(mut self, ticker: &TickerSymbol, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(ticker.clone(), bars);
        self
    }

    pub fn with_dividends(mut self, ticker: &TickerSymbol, events: Vec<DividendEvent>) -> Self {
        self.dividends.insert(ticker.clone(), events);
        self
    }

    pub fn with_calendar(mut self, ticker: &TickerSymbol, calendar: EarningsCalendar) -> Self {
        self.calendars.insert(ticker.clone(), calendar);
        self
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for InMemoryProvider {
    fn provider_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_profile(&self, ticker: &TickerSymbol) -> Result<StockProfile> {
        self.profiles
            .get(ticker)
            .cloned()
            .with_context(|| format!("no profile stored for {ticker}"))
    }

    async fn fetch_financials(&self, ticker: &TickerSymbol) -> Result<Financials> {
        self.financials
            .get(ticker)
            .cloned()
            .with_context(|| format!("no financials stored for {ticker}"))
    }

    async fn fetch_price_history(
        &self,
        ticker: &TickerSymbol,
        _period: HistoryPeriod,
        _interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        self.prices
            .get(ticker)
            .cloned()
            .with_context(|| format!("no price history stored for {ticker}"))
    }

    async fn fetch_history_with_dividends(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
    ) -> Result<PriceHistory> {
        let bars = self
            .fetch_price_history(ticker, period, Interval::Daily)
            .await?;
        let dividends = self.dividends.get(ticker).cloned().unwrap_or_default();
        Ok(PriceHistory { bars, dividends })
    }

    async fn fetch_earnings_calendar(&self, ticker: &TickerSymbol) -> Result<EarningsCalendar> {
        self.calendars
            .get(ticker)
            .cloned()
            .with_context(|| format!("no earnings calendar stored for {ticker}"))
    }
}
