use crate::domain::snapshot::{Dividends, FinancialStatements, Profitability, Valuation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Daily bars plus the dividends paid over the same range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub bars: Vec<PriceBar>,
    pub dividends: Vec<DividendEvent>,
}

/// Statement and ratio data; price-derived tables are filled in by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub valuation: Valuation,
    pub profitability: Profitability,
    pub dividends: Dividends,
    pub statements: FinancialStatements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsCalendar {
    pub next_earnings_date: Option<NaiveDate>,
    pub eps_forecast: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl HistoryPeriod {
    pub fn as_range(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1wk",
            Self::Monthly => "1mo",
        }
    }
}
