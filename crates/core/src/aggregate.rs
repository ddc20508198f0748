use crate::domain::snapshot::{
    EarningsForecast, FundamentalsSnapshot, PeerComparison, RiskSnapshot, SentimentSnapshot,
    StockProfile, StructuredSnapshot, TechnicalsSnapshot,
};
use crate::domain::ticker::TickerSymbol;
use chrono::NaiveDate;

pub const INVESTMENT_HORIZON: &str = "long_term";
pub const STRATEGY_FOCUS: &str = "multi-factor conviction-based allocation";

/// Resolved output of every extractor for one ticker.
#[derive(Debug, Clone)]
pub struct ExtractedSections {
    pub profile: StockProfile,
    pub fundamentals: FundamentalsSnapshot,
    pub technicals: TechnicalsSnapshot,
    pub sentiment: SentimentSnapshot,
    pub risk: RiskSnapshot,
    pub peers: PeerComparison,
    pub earnings: EarningsForecast,
}

pub fn aggregate(
    ticker: &TickerSymbol,
    as_of_date: NaiveDate,
    sections: ExtractedSections,
) -> StructuredSnapshot {
    StructuredSnapshot {
        ticker: ticker.clone(),
        as_of_date,
        investment_horizon: INVESTMENT_HORIZON.to_string(),
        strategy_focus: STRATEGY_FOCUS.to_string(),
        profile: sections.profile,
        fundamentals: sections.fundamentals,
        technicals: sections.technicals,
        sentiment: sections.sentiment,
        risk: sections.risk,
        peers: sections.peers,
        earnings: sections.earnings,
    }
}
