use crate::domain::ticker::TickerSymbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Date-indexed numeric table: `date -> field -> value`.
///
/// `BTreeMap` on both levels keeps serialization order stable, which the prompt
/// and its tests rely on.
pub type TimeTable = BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Profile,
    Fundamentals,
    Technicals,
    Sentiment,
    Risk,
    Peers,
    Earnings,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Profile => "profile",
            Self::Fundamentals => "fundamentals",
            Self::Technicals => "technicals",
            Self::Sentiment => "sentiment",
            Self::Risk => "risk",
            Self::Peers => "peers",
            Self::Earnings => "earnings",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockProfile {
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub operating_margin: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dividends {
    #[serde(rename = "yield")]
    pub dividend_yield: Option<f64>,
    pub rate: Option<f64>,
    pub payout_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub income_statement: TimeTable,
    pub balance_sheet: TimeTable,
    pub cash_flow: TimeTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    pub valuation: Valuation,
    pub profitability: Profitability,
    pub dividends: Dividends,
    pub financials: FinancialStatements,
    pub dividend_history: TimeTable,
    pub price_history: TimeTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalsSnapshot {
    pub price_above_ma200: bool,
    pub macd_bullish: bool,
    pub rsi: f64,
    pub bollinger_lower_touch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub avg_score: f64,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    /// `(max - min) / max` of one year of closes, rounded to 3 decimals.
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub pe_rank: f64,
    pub roe_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsForecast {
    /// ISO date, or a placeholder such as `TBD` when unknown.
    pub next_earnings_date: String,
    pub eps_forecast: Option<f64>,
}

/// Everything the prompt needs for one ticker. Every section is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSnapshot {
    pub ticker: TickerSymbol,
    pub as_of_date: NaiveDate,
    pub investment_horizon: String,
    pub strategy_focus: String,
    pub profile: StockProfile,
    pub fundamentals: FundamentalsSnapshot,
    pub technicals: TechnicalsSnapshot,
    pub sentiment: SentimentSnapshot,
    pub risk: RiskSnapshot,
    pub peers: PeerComparison,
    pub earnings: EarningsForecast,
}
