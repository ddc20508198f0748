//! Metric extractors: one per snapshot section.
//!
//! Every section sits behind [`MetricExtractor`], whether its value comes from
//! the market data provider (`Live`) or is a fixed stand-in (`Stub`). Swapping
//! one for the other changes nothing for the aggregator or the prompt.

pub mod earnings;
pub mod fundamentals;
pub mod placeholders;
pub mod profile;
pub mod risk;

use crate::config::Settings;
use crate::domain::snapshot::{
    EarningsForecast, FundamentalsSnapshot, PeerComparison, RiskSnapshot, Section,
    SentimentSnapshot, StockProfile, TechnicalsSnapshot,
};
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::ingest::MarketDataProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Stub,
    Live,
}

#[async_trait::async_trait]
pub trait MetricExtractor: Send + Sync {
    type Output: Send;

    fn section(&self) -> Section;

    fn kind(&self) -> ExtractorKind;

    /// Missing optional fields resolve to `None`; only an unreachable provider
    /// or an empty required series is an error.
    async fn extract(
        &self,
        ticker: &TickerSymbol,
        provider: Option<&dyn MarketDataProvider>,
    ) -> Result<Self::Output, SignalError>;
}

/// Stub extractor returning the same value for every ticker.
#[derive(Debug, Clone)]
pub struct Fixed<T> {
    section: Section,
    value: T,
}

impl<T> Fixed<T> {
    pub fn new(section: Section, value: T) -> Self {
        Self { section, value }
    }
}

#[async_trait::async_trait]
impl<T> MetricExtractor for Fixed<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn section(&self) -> Section {
        self.section
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Stub
    }

    async fn extract(
        &self,
        _ticker: &TickerSymbol,
        _provider: Option<&dyn MarketDataProvider>,
    ) -> Result<T, SignalError> {
        Ok(self.value.clone())
    }
}

pub type BoxedExtractor<T> = Box<dyn MetricExtractor<Output = T>>;

/// The extractor chosen for each section.
pub struct ExtractorSet {
    pub profile: BoxedExtractor<StockProfile>,
    pub fundamentals: BoxedExtractor<FundamentalsSnapshot>,
    pub technicals: BoxedExtractor<TechnicalsSnapshot>,
    pub sentiment: BoxedExtractor<SentimentSnapshot>,
    pub risk: BoxedExtractor<RiskSnapshot>,
    pub peers: BoxedExtractor<PeerComparison>,
    pub earnings: BoxedExtractor<EarningsForecast>,
}

impl Default for ExtractorSet {
    /// Live profile, fundamentals and risk; every other section stubbed.
    fn default() -> Self {
        Self {
            profile: Box::new(profile::ProfileExtractor),
            fundamentals: Box::new(fundamentals::FundamentalsExtractor),
            technicals: Box::new(placeholders::technicals()),
            sentiment: Box::new(placeholders::sentiment()),
            risk: Box::new(risk::DrawdownRiskExtractor),
            peers: Box::new(placeholders::peers()),
            earnings: Box::new(placeholders::earnings()),
        }
    }
}

impl ExtractorSet {
    pub fn from_settings(settings: &Settings) -> Result<Self, SignalError> {
        let mut set = Self::default();
        match settings.earnings_source.as_deref().map(str::to_ascii_lowercase) {
            None => {}
            Some(s) if s == "stub" => {}
            Some(s) if s == "live" => set.earnings = Box::new(earnings::CalendarEarningsExtractor),
            Some(other) => {
                return Err(SignalError::Configuration(format!(
                    "EARNINGS_SOURCE must be `stub` or `live` (got {other:?})"
                )))
            }
        }
        Ok(set)
    }

    /// `(section, kind)` for every slot, in snapshot order.
    pub fn describe(&self) -> [(Section, ExtractorKind); 7] {
        [
            (self.profile.section(), self.profile.kind()),
            (self.fundamentals.section(), self.fundamentals.kind()),
            (self.technicals.section(), self.technicals.kind()),
            (self.sentiment.section(), self.sentiment.kind()),
            (self.risk.section(), self.risk.kind()),
            (self.peers.section(), self.peers.kind()),
            (self.earnings.section(), self.earnings.kind()),
        ]
    }
}

pub(crate) fn require_provider<'a>(
    provider: Option<&'a dyn MarketDataProvider>,
    ticker: &TickerSymbol,
    section: Section,
) -> Result<&'a dyn MarketDataProvider, SignalError> {
    provider.ok_or_else(|| SignalError::DataUnavailable {
        ticker: ticker.to_string(),
        section,
        detail: "no market data provider configured".to_string(),
    })
}
